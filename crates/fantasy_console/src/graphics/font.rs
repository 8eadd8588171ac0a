//! 3x5 bitmap font covering ASCII `' '..='_'`. Lowercase letters render with
//! the uppercase glyph; anything else renders as a hollow box.

pub const GLYPH_WIDTH: i32 = 3;
pub const GLYPH_HEIGHT: i32 = 5;
/// Horizontal distance between glyph origins.
pub const ADVANCE: i32 = GLYPH_WIDTH + 1;
/// Vertical distance between lines.
pub const LINE_HEIGHT: i32 = GLYPH_HEIGHT + 1;

const FIRST: u8 = b' ';
const UNKNOWN: [u8; 5] = [7, 5, 5, 5, 7];

// One row per entry, three bits per row, bit 2 is the leftmost pixel.
#[rustfmt::skip]
const GLYPHS: [[u8; 5]; 64] = [
    [0, 0, 0, 0, 0], // ' '
    [2, 2, 2, 0, 2], // !
    [5, 5, 0, 0, 0], // "
    [5, 7, 5, 7, 5], // #
    [3, 6, 7, 3, 6], // $
    [5, 1, 2, 4, 5], // %
    [2, 5, 2, 5, 3], // &
    [2, 2, 0, 0, 0], // '
    [1, 2, 2, 2, 1], // (
    [4, 2, 2, 2, 4], // )
    [0, 5, 2, 5, 0], // *
    [0, 2, 7, 2, 0], // +
    [0, 0, 0, 2, 4], // ,
    [0, 0, 7, 0, 0], // -
    [0, 0, 0, 0, 2], // .
    [1, 1, 2, 4, 4], // /
    [7, 5, 5, 5, 7], // 0
    [2, 6, 2, 2, 7], // 1
    [7, 1, 7, 4, 7], // 2
    [7, 1, 3, 1, 7], // 3
    [5, 5, 7, 1, 1], // 4
    [7, 4, 7, 1, 7], // 5
    [7, 4, 7, 5, 7], // 6
    [7, 1, 1, 1, 1], // 7
    [7, 5, 7, 5, 7], // 8
    [7, 5, 7, 1, 7], // 9
    [0, 2, 0, 2, 0], // :
    [0, 2, 0, 2, 4], // ;
    [1, 2, 4, 2, 1], // <
    [0, 7, 0, 7, 0], // =
    [4, 2, 1, 2, 4], // >
    [7, 1, 3, 0, 2], // ?
    [2, 5, 7, 4, 3], // @
    [7, 5, 7, 5, 5], // A
    [6, 5, 6, 5, 6], // B
    [7, 4, 4, 4, 7], // C
    [6, 5, 5, 5, 6], // D
    [7, 4, 6, 4, 7], // E
    [7, 4, 6, 4, 4], // F
    [7, 4, 5, 5, 7], // G
    [5, 5, 7, 5, 5], // H
    [7, 2, 2, 2, 7], // I
    [7, 2, 2, 2, 6], // J
    [5, 5, 6, 5, 5], // K
    [4, 4, 4, 4, 7], // L
    [5, 7, 7, 5, 5], // M
    [6, 5, 5, 5, 5], // N
    [2, 5, 5, 5, 2], // O
    [7, 5, 7, 4, 4], // P
    [2, 5, 5, 6, 3], // Q
    [7, 5, 6, 5, 5], // R
    [3, 4, 2, 1, 6], // S
    [7, 2, 2, 2, 2], // T
    [5, 5, 5, 5, 7], // U
    [5, 5, 5, 5, 2], // V
    [5, 5, 7, 7, 5], // W
    [5, 5, 2, 5, 5], // X
    [5, 5, 7, 2, 2], // Y
    [7, 1, 2, 4, 7], // Z
    [6, 4, 4, 4, 6], // [
    [4, 4, 2, 1, 1], // \
    [3, 1, 1, 1, 3], // ]
    [2, 5, 0, 0, 0], // ^
    [0, 0, 0, 0, 7], // _
];

pub fn glyph(ch: char) -> [u8; 5] {
    let ch = ch.to_ascii_uppercase();
    if !ch.is_ascii() {
        return UNKNOWN;
    }
    let code = ch as u8;
    match code.checked_sub(FIRST) {
        Some(offset) if (offset as usize) < GLYPHS.len() => GLYPHS[offset as usize],
        _ => UNKNOWN,
    }
}

/// Whether the pixel at `(col, row)` of `ch`'s glyph is set.
pub fn is_set(ch: char, col: i32, row: i32) -> bool {
    if !(0..GLYPH_WIDTH).contains(&col) || !(0..GLYPH_HEIGHT).contains(&row) {
        return false;
    }
    let bits = glyph(ch)[row as usize];
    (bits >> (GLYPH_WIDTH - 1 - col)) & 1 == 1
}

/// Pixel size of `text` laid out on a single line.
pub fn measure(text: &str) -> (i32, i32) {
    let chars = i32::try_from(text.chars().count()).unwrap_or(i32::MAX);
    if chars == 0 {
        return (0, 0);
    }
    (chars.saturating_mul(ADVANCE) - 1, GLYPH_HEIGHT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercase_uses_uppercase_glyph() {
        assert_eq!(glyph('d'), glyph('D'));
    }

    #[test]
    fn unknown_characters_render_as_box() {
        assert_eq!(glyph('~'), UNKNOWN);
        assert_eq!(glyph('é'), UNKNOWN);
    }

    #[test]
    fn one_has_a_centered_stem() {
        for row in 0..GLYPH_HEIGHT {
            assert!(is_set('1', 1, row));
        }
        assert!(!is_set('1', 0, 0));
        assert!(!is_set('1', 3, 0));
    }

    #[test]
    fn measure_counts_spacing_between_glyphs() {
        assert_eq!(measure(""), (0, 0));
        assert_eq!(measure("A"), (3, 5));
        assert_eq!(measure("DEMO 5"), (23, 5));
    }
}
