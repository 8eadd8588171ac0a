#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::new_rgba(0, 0, 0, 0);
    pub const BLACK: Color = Color::new_rgb(0, 0, 0);
    pub const WHITE: Color = Color::new_rgb(255, 255, 255);
    pub const RED: Color = Color::new_rgb(230, 41, 55);
    pub const GREEN: Color = Color::new_rgb(0, 228, 48);
    pub const BLUE: Color = Color::new_rgb(0, 121, 241);
    pub const PINK: Color = Color::new_rgb(255, 109, 194);

    #[inline]
    pub const fn new_rgb(r: u8, g: u8, b: u8) -> Color {
        Color { r, g, b, a: 0xff }
    }

    #[inline]
    pub const fn new_rgba(r: u8, g: u8, b: u8, a: u8) -> Color {
        Color { r, g, b, a }
    }

    #[inline]
    pub const fn rgb(&self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }

    /// Composite `self` over `dst` using straight alpha.
    pub fn over(self, dst: Color) -> Color {
        match self.a {
            0 => dst,
            0xff => self,
            a => {
                let a = a as u16;
                let inv = 0xff - a;
                let mix = |s: u8, d: u8| ((s as u16 * a + d as u16 * inv) / 0xff) as u8;
                Color {
                    r: mix(self.r, dst.r),
                    g: mix(self.g, dst.g),
                    b: mix(self.b, dst.b),
                    a: (a + dst.a as u16 * inv / 0xff).min(0xff) as u8,
                }
            }
        }
    }

    pub fn to_u32(&self) -> u32 {
        u32::from_le_bytes([self.r, self.g, self.b, self.a])
    }
}
