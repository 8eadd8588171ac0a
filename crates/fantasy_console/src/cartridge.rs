use fantasy_common::Color;
use thiserror::Error;

use crate::graphics::Image;
use crate::profile::{ConsoleProfile, PaletteError};

/// Why a cartridge could not be loaded. Any of these stops the cartridge
/// before its first frame; none of them take the host down.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("sprite sheet is {width}x{height} but holds {actual} pixels")]
    SheetSize {
        width: u32,
        height: u32,
        actual: usize,
    },
    #[error("sprite sheet {width}x{height} exceeds the console limit of {max_width}x{max_height}")]
    SheetTooLarge {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },
    #[error("sprite sheet pixel ({x}, {y}): {source}")]
    PaletteIndex {
        x: u32,
        y: u32,
        #[source]
        source: PaletteError,
    },
    #[error("sprite map is {width}x{height} but holds {actual} cells")]
    MapSize {
        width: u32,
        height: u32,
        actual: usize,
    },
    #[error("sprite map {width}x{height} exceeds the console limit of {max_width}x{max_height}")]
    MapTooLarge {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },
    #[error("sprite map cell ({x}, {y}) references tile {tile}, sheet has {tiles} tiles")]
    MapTile { x: u32, y: u32, tile: u8, tiles: u32 },
    #[error("script `{name}` failed to load: {message}")]
    Script { name: String, message: String },
    #[error("script engine setup failed: {0}")]
    Engine(#[from] mlua::Error),
}

/// Indexed-color pixel grid. Every entry is a palette index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteSheet {
    pub width: u32,
    pub height: u32,
    pub indices: Vec<u8>,
}

impl SpriteSheet {
    pub fn new(width: u32, height: u32, indices: impl Into<Vec<u8>>) -> Self {
        Self {
            width,
            height,
            indices: indices.into(),
        }
    }

    /// Map every index through the profile's palette.
    ///
    /// Fails on the first index the palette does not define; a sheet is
    /// either decoded completely or not at all.
    pub fn decode(&self, profile: &ConsoleProfile) -> Result<Image, LoadError> {
        let (max_width, max_height) = profile.sprite_sheet_size();
        if self.width > max_width || self.height > max_height {
            return Err(LoadError::SheetTooLarge {
                width: self.width,
                height: self.height,
                max_width,
                max_height,
            });
        }
        if self.indices.len() != (self.width * self.height) as usize {
            return Err(LoadError::SheetSize {
                width: self.width,
                height: self.height,
                actual: self.indices.len(),
            });
        }

        let pixels = self
            .indices
            .iter()
            .enumerate()
            .map(|(i, &index)| {
                profile
                    .color_at(index as i64)
                    .map_err(|source| LoadError::PaletteIndex {
                        x: i as u32 % self.width,
                        y: i as u32 / self.width,
                        source,
                    })
            })
            .collect::<Result<Vec<Color>, _>>()?;

        log::debug!(
            "decoded {}x{} sprite sheet ({} colors)",
            self.width,
            self.height,
            profile.palette().len()
        );
        Image::from_pixels(self.width, self.height, pixels).ok_or(LoadError::SheetSize {
            width: self.width,
            height: self.height,
            actual: self.indices.len(),
        })
    }
}

/// Grid of sprite tile numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteMap {
    pub width: u32,
    pub height: u32,
    pub tiles: Vec<u8>,
}

impl SpriteMap {
    pub fn new(width: u32, height: u32, tiles: impl Into<Vec<u8>>) -> Self {
        Self {
            width,
            height,
            tiles: tiles.into(),
        }
    }

    pub fn get(&self, x: i64, y: i64) -> Option<u8> {
        let x = u32::try_from(x).ok().filter(|&x| x < self.width)?;
        let y = u32::try_from(y).ok().filter(|&y| y < self.height)?;
        self.tiles.get((y * self.width + x) as usize).copied()
    }

    fn validate(&self, profile: &ConsoleProfile, sheet: &Image) -> Result<(), LoadError> {
        let (max_width, max_height) = profile.sprite_map_size();
        if self.width > max_width || self.height > max_height {
            return Err(LoadError::MapTooLarge {
                width: self.width,
                height: self.height,
                max_width,
                max_height,
            });
        }
        if self.tiles.len() != (self.width * self.height) as usize {
            return Err(LoadError::MapSize {
                width: self.width,
                height: self.height,
                actual: self.tiles.len(),
            });
        }
        let tiles = sheet.tile_count();
        match self
            .tiles
            .iter()
            .position(|&tile| tile as u32 >= tiles)
        {
            Some(i) => Err(LoadError::MapTile {
                x: i as u32 % self.width,
                y: i as u32 / self.width,
                tile: self.tiles[i],
                tiles,
            }),
            None => Ok(()),
        }
    }
}

#[rustfmt::skip]
const DEMO_SPRITE: [u8; 64] = [
    2, 2, 2, 2, 2, 2, 2, 2,
    2, 2, 2, 2, 2, 2, 2, 2,
    2, 2, 0, 2, 2, 0, 2, 2,
    2, 2, 2, 2, 2, 2, 2, 2,
    2, 2, 2, 2, 2, 2, 2, 2,
    2, 2, 0, 2, 2, 0, 2, 2,
    2, 2, 2, 0, 0, 2, 2, 2,
    2, 2, 2, 2, 2, 2, 2, 2,
];

const DEMO_SCRIPT: &str = r#"
i = 0
function update() i = i + 1 end
function draw() text("DEMO " .. i, 0, 0, 2) end
"#;

/// A runnable bundle: sprite data plus the Lua source defining `update`
/// and `draw`. Read-only for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cartridge {
    pub name: String,
    pub sprite_sheet: SpriteSheet,
    pub sprite_map: Option<SpriteMap>,
    pub script: String,
}

impl Cartridge {
    pub fn new(name: impl Into<String>, sprite_sheet: SpriteSheet, script: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sprite_sheet,
            sprite_map: None,
            script: script.into(),
        }
    }

    pub fn with_sprite_map(mut self, sprite_map: SpriteMap) -> Self {
        self.sprite_map = Some(sprite_map);
        self
    }

    /// The built-in demo: an 8x8 face and a counter printed every frame.
    pub fn demo() -> Self {
        Self::new("Demo game", SpriteSheet::new(8, 8, DEMO_SPRITE), DEMO_SCRIPT)
    }

    /// Decode the sprite sheet and check the sprite map against it.
    pub fn validate(&self, profile: &ConsoleProfile) -> Result<Image, LoadError> {
        let sheet = self.sprite_sheet.decode(profile)?;
        if let Some(map) = &self.sprite_map {
            map.validate(profile, &sheet)?;
        }
        Ok(sheet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Palette;

    #[test]
    fn demo_sheet_decodes_through_palette() {
        let profile = ConsoleProfile::default_profile();
        let image = Cartridge::demo().validate(&profile).unwrap();
        assert_eq!((image.width(), image.height()), (8, 8));
        assert_eq!(image.pixel(0, 0), Some(Color::WHITE));
        assert_eq!(image.pixel(2, 2), Some(Color::TRANSPARENT));
        assert_eq!(image.pixel(3, 6), Some(Color::TRANSPARENT));
    }

    #[test]
    fn alt_profile_recolors_the_same_sheet() {
        let image = Cartridge::demo()
            .validate(&ConsoleProfile::alt_profile())
            .unwrap();
        assert_eq!(image.pixel(0, 0), Some(Color::PINK));
    }

    #[test]
    fn out_of_range_index_fails_with_position() {
        let mut indices = vec![1u8; 16];
        indices[6] = 9;
        let err = SpriteSheet::new(4, 4, indices)
            .decode(&ConsoleProfile::default_profile())
            .unwrap_err();
        match err {
            LoadError::PaletteIndex { x, y, source } => {
                assert_eq!((x, y), (2, 1));
                assert_eq!(source, PaletteError::IndexOutOfRange { index: 9, colors: 6 });
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn index_valid_in_one_palette_fails_in_a_smaller_one() {
        let tiny = ConsoleProfile::builder()
            .palette(Palette::new(vec![Color::TRANSPARENT, Color::BLACK]).unwrap())
            .build();
        let err = Cartridge::demo().validate(&tiny).unwrap_err();
        assert!(matches!(err, LoadError::PaletteIndex { x: 0, y: 0, .. }));
    }

    #[test]
    fn size_mismatch_is_rejected() {
        let err = SpriteSheet::new(8, 8, vec![0u8; 63])
            .decode(&ConsoleProfile::default_profile())
            .unwrap_err();
        assert!(matches!(err, LoadError::SheetSize { actual: 63, .. }));
    }

    #[test]
    fn oversized_sheet_is_rejected() {
        let err = SpriteSheet::new(256, 1, vec![0u8; 256])
            .decode(&ConsoleProfile::default_profile())
            .unwrap_err();
        assert!(matches!(err, LoadError::SheetTooLarge { max_width: 128, .. }));
    }

    #[test]
    fn sprite_map_must_reference_existing_tiles() {
        let profile = ConsoleProfile::default_profile();
        let ok = Cartridge::demo().with_sprite_map(SpriteMap::new(2, 1, [0u8, 0]));
        assert!(ok.validate(&profile).is_ok());

        let bad = Cartridge::demo().with_sprite_map(SpriteMap::new(2, 1, [0u8, 1]));
        let err = bad.validate(&profile).unwrap_err();
        assert!(matches!(err, LoadError::MapTile { x: 1, y: 0, tile: 1, tiles: 1 }));
    }

    #[test]
    fn sprite_map_lookup_is_bounds_checked() {
        let map = SpriteMap::new(2, 2, [0u8, 1, 2, 3]);
        assert_eq!(map.get(1, 1), Some(3));
        assert_eq!(map.get(2, 0), None);
        assert_eq!(map.get(-1, 0), None);
    }
}
