use fantasy_common::Color;
use thiserror::Error;
use typed_builder::TypedBuilder;

/// Largest palette a console may define.
pub const MAX_COLORS: usize = 16;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaletteError {
    #[error("palette index {index} out of range (palette has {colors} colors)")]
    IndexOutOfRange { index: i64, colors: usize },
    #[error("palette must have between 1 and {max} colors, got {0}", max = MAX_COLORS)]
    InvalidSize(usize),
}

/// An indexed color table. Index 0 is conventionally transparent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Color>,
}

#[allow(clippy::len_without_is_empty)]
impl Palette {
    pub fn new(colors: impl Into<Vec<Color>>) -> Result<Self, PaletteError> {
        let colors = colors.into();
        if colors.is_empty() || colors.len() > MAX_COLORS {
            return Err(PaletteError::InvalidSize(colors.len()));
        }
        Ok(Self { colors })
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Look up a palette entry. Anything outside `[0, len)` is an error,
    /// never a fallback color.
    pub fn color_at(&self, index: i64) -> Result<Color, PaletteError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.colors.get(i).copied())
            .ok_or(PaletteError::IndexOutOfRange {
                index,
                colors: self.colors.len(),
            })
    }
}

/// Fixed display and palette configuration a cartridge runs under.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct ConsoleProfile {
    #[builder(default = (128, 128))]
    resolution: (u32, u32),
    palette: Palette,
    #[builder(default = 30)]
    fps: u32,
    #[builder(default = (128, 128))]
    sprite_sheet_size: (u32, u32),
    #[builder(default = (512, 512))]
    sprite_map_size: (u32, u32),
}

impl ConsoleProfile {
    /// The stock console: transparent, black, white, red, green, blue.
    pub fn default_profile() -> Self {
        Self::with_colors([
            Color::TRANSPARENT,
            Color::BLACK,
            Color::WHITE,
            Color::RED,
            Color::GREEN,
            Color::BLUE,
        ])
    }

    /// Same geometry as the stock console with pink in slot 2.
    pub fn alt_profile() -> Self {
        Self::with_colors([
            Color::TRANSPARENT,
            Color::BLACK,
            Color::PINK,
            Color::RED,
            Color::GREEN,
            Color::BLUE,
        ])
    }

    fn with_colors(colors: [Color; 6]) -> Self {
        Self::builder()
            .palette(Palette {
                colors: colors.to_vec(),
            })
            .build()
    }

    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    pub fn width(&self) -> u32 {
        self.resolution.0
    }

    pub fn height(&self) -> u32 {
        self.resolution.1
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn color_at(&self, index: i64) -> Result<Color, PaletteError> {
        self.palette.color_at(index)
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn sprite_sheet_size(&self) -> (u32, u32) {
        self.sprite_sheet_size
    }

    pub fn sprite_map_size(&self) -> (u32, u32) {
        self.sprite_map_size
    }
}

impl Default for ConsoleProfile {
    fn default() -> Self {
        Self::default_profile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_at_returns_configured_colors() {
        let profile = ConsoleProfile::default_profile();
        let expected = [
            Color::TRANSPARENT,
            Color::BLACK,
            Color::WHITE,
            Color::RED,
            Color::GREEN,
            Color::BLUE,
        ];
        for (i, color) in expected.iter().enumerate() {
            assert_eq!(profile.color_at(i as i64), Ok(*color));
        }
    }

    #[test]
    fn color_at_rejects_out_of_range() {
        let palette = ConsoleProfile::default_profile().palette().clone();
        assert_eq!(
            palette.color_at(6),
            Err(PaletteError::IndexOutOfRange { index: 6, colors: 6 })
        );
        assert!(palette.color_at(-1).is_err());
        assert!(palette.color_at(i64::MAX).is_err());
    }

    #[test]
    fn palette_size_is_bounded() {
        assert_eq!(Palette::new(Vec::<Color>::new()), Err(PaletteError::InvalidSize(0)));
        assert_eq!(
            Palette::new(vec![Color::BLACK; 17]),
            Err(PaletteError::InvalidSize(17))
        );
        assert_eq!(Palette::new(vec![Color::BLACK; 16]).map(|p| p.len()), Ok(16));
    }

    #[test]
    fn presets_differ_only_in_slot_two() {
        let base = ConsoleProfile::default_profile();
        let alt = ConsoleProfile::alt_profile();
        assert_eq!(alt.color_at(2), Ok(Color::PINK));
        assert_eq!(base.resolution(), alt.resolution());
        assert_eq!(base.fps(), 30);
        assert_eq!(base.sprite_map_size(), (512, 512));
        for i in [0, 1, 3, 4, 5] {
            assert_eq!(base.color_at(i), alt.color_at(i));
        }
    }

    #[test]
    fn builder_overrides_geometry() {
        let profile = ConsoleProfile::builder()
            .resolution((64, 32))
            .fps(60)
            .palette(Palette::new(vec![Color::BLACK, Color::WHITE]).unwrap())
            .build();
        assert_eq!(profile.width(), 64);
        assert_eq!(profile.height(), 32);
        assert_eq!(profile.sprite_sheet_size(), (128, 128));
    }
}
