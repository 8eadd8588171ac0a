/// Logical keys understood by the console.
///
/// Frontends translate their native key codes into `Key`; scripts address
/// keys through [`Key::code`], which follows raylib's `KeyboardKey`
/// numbering so cartridges written against it keep working.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Key {
    Num1,
    Num2,
    Num3,
    Num4,
    Q,
    W,
    E,
    R,
    A,
    S,
    D,
    F,
    Z,
    X,
    C,
    V,
    P,
    T,
    J,
    K,
    L,
    Left,
    Right,
    Up,
    Down,
    Space,
    Enter,
    Escape,
    Backspace,
    None,
}

impl Key {
    pub const ALL: [Key; 29] = [
        Key::Num1,
        Key::Num2,
        Key::Num3,
        Key::Num4,
        Key::Q,
        Key::W,
        Key::E,
        Key::R,
        Key::A,
        Key::S,
        Key::D,
        Key::F,
        Key::Z,
        Key::X,
        Key::C,
        Key::V,
        Key::P,
        Key::T,
        Key::J,
        Key::K,
        Key::L,
        Key::Left,
        Key::Right,
        Key::Up,
        Key::Down,
        Key::Space,
        Key::Enter,
        Key::Escape,
        Key::Backspace,
    ];

    /// raylib-compatible key code, `0` for [`Key::None`].
    pub const fn code(self) -> i64 {
        match self {
            Key::Num1 => 49,
            Key::Num2 => 50,
            Key::Num3 => 51,
            Key::Num4 => 52,
            Key::Q => 81,
            Key::W => 87,
            Key::E => 69,
            Key::R => 82,
            Key::A => 65,
            Key::S => 83,
            Key::D => 68,
            Key::F => 70,
            Key::Z => 90,
            Key::X => 88,
            Key::C => 67,
            Key::V => 86,
            Key::P => 80,
            Key::T => 84,
            Key::J => 74,
            Key::K => 75,
            Key::L => 76,
            Key::Left => 263,
            Key::Right => 262,
            Key::Up => 265,
            Key::Down => 264,
            Key::Space => 32,
            Key::Enter => 257,
            Key::Escape => 256,
            Key::Backspace => 259,
            Key::None => 0,
        }
    }

    pub fn from_code(code: i64) -> Option<Key> {
        Key::ALL.iter().copied().find(|key| key.code() == code)
    }
}
