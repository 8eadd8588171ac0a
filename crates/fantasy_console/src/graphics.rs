pub mod font;

use fantasy_common::Color;

/// Sprite tiles are square, `SPRITE_SIZE` pixels on a side.
pub const SPRITE_SIZE: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }
}

/// A decoded RGBA image, the console's only kind of texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl Image {
    /// Returns `None` when `pixels` does not hold exactly `width * height`
    /// entries.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Color>) -> Option<Self> {
        (pixels.len() == (width * height) as usize).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    /// Number of whole 8x8 sprite tiles in the image.
    pub fn tile_count(&self) -> u32 {
        (self.width / SPRITE_SIZE) * (self.height / SPRITE_SIZE)
    }

    /// Source rectangle of sprite tile `n`, numbered row-major.
    pub fn tile_rect(&self, n: u32) -> Option<Rect> {
        if n >= self.tile_count() {
            return None;
        }
        let columns = self.width / SPRITE_SIZE;
        let size = SPRITE_SIZE as i32;
        Some(Rect::new(
            ((n % columns) * SPRITE_SIZE) as i32,
            ((n / columns) * SPRITE_SIZE) as i32,
            size,
            size,
        ))
    }
}

/// The drawing surface the runtime renders onto.
///
/// Frontends and tests implement this to receive a frame; the console
/// ships [`Framebuffer`], a software implementation.
pub trait Renderer {
    fn begin_frame(&mut self, background: Color);
    fn clear(&mut self, color: Color);
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn draw_text(&mut self, text: &str, x: i32, y: i32, color: Color);
    /// Copy `src` of `image` to `(x, y)`, skipping transparent pixels.
    fn draw_image(&mut self, image: &Image, src: Rect, x: i32, y: i32);
    fn end_frame(&mut self);
}

/// Software frame buffer at the console's native resolution.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
    frames_presented: u64,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::BLACK; (width * height) as usize],
            frames_presented: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    fn blend(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = (y as u32 * self.width + x as u32) as usize;
        self.pixels[idx] = color.over(self.pixels[idx]);
    }

    /// Whether a `w` x `h` box at `(x, y)` touches the screen.
    fn overlaps(&self, x: i32, y: i32, w: i32, h: i32) -> bool {
        x < self.width as i32
            && y < self.height as i32
            && x.saturating_add(w) > 0
            && y.saturating_add(h) > 0
    }

    /// Write the frame as packed RGB24, the layout the SDL frontend uploads.
    pub fn write_rgb24(&self, screen: &mut [u8]) {
        for (pixel, out) in self.pixels.iter().zip(screen.chunks_exact_mut(3)) {
            out[0] = pixel.r;
            out[1] = pixel.g;
            out[2] = pixel.b;
        }
    }
}

impl Renderer for Framebuffer {
    fn begin_frame(&mut self, background: Color) {
        self.clear(background);
    }

    fn clear(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let x0 = rect.x.max(0);
        let y0 = rect.y.max(0);
        let x1 = rect.x.saturating_add(rect.w).min(self.width as i32);
        let y1 = rect.y.saturating_add(rect.h).min(self.height as i32);
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend(x, y, color);
            }
        }
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32, color: Color) {
        let mut line_y = y;
        for line in text.split('\n') {
            let (w, h) = font::measure(line);
            if self.overlaps(x, line_y, w, h) {
                let mut pen_x = x;
                for ch in line.chars() {
                    if pen_x >= self.width as i32 {
                        break;
                    }
                    for row in 0..font::GLYPH_HEIGHT {
                        for col in 0..font::GLYPH_WIDTH {
                            if font::is_set(ch, col, row) {
                                self.blend(
                                    pen_x.saturating_add(col),
                                    line_y.saturating_add(row),
                                    color,
                                );
                            }
                        }
                    }
                    pen_x = pen_x.saturating_add(font::ADVANCE);
                }
            }
            line_y = line_y.saturating_add(font::LINE_HEIGHT);
        }
    }

    fn draw_image(&mut self, image: &Image, src: Rect, x: i32, y: i32) {
        if !self.overlaps(x, y, src.w, src.h) {
            return;
        }
        for row in 0..src.h {
            for col in 0..src.w {
                let (sx, sy) = (src.x.saturating_add(col), src.y.saturating_add(row));
                if sx < 0 || sy < 0 {
                    continue;
                }
                if let Some(color) = image.pixel(sx as u32, sy as u32) {
                    self.blend(x.saturating_add(col), y.saturating_add(row), color);
                }
            }
        }
    }

    fn end_frame(&mut self) {
        self.frames_presented += 1;
    }
}
