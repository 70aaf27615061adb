//! USB HID keyboard-page usage IDs and the eight modifier bits.
//!
//! See USB HID Usage Tables, Section 10 (Keyboard/Keypad Page 0x07). Only
//! the range the boot report descriptor advertises (0x00..=0x65) is modelled.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Highest usage ID the report descriptor declares (Keyboard Application).
pub const MAX_USAGE: u8 = 0x65;

/// USB HID keycodes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum KeyCode {
    /// Reported in every key slot when too many keys are held.
    ErrorRollOver = 0x01,
    PostFail = 0x02,
    ErrorUndefined = 0x03,

    // Letters
    A = 0x04,
    B = 0x05,
    C = 0x06,
    D = 0x07,
    E = 0x08,
    F = 0x09,
    G = 0x0A,
    H = 0x0B,
    I = 0x0C,
    J = 0x0D,
    K = 0x0E,
    L = 0x0F,
    M = 0x10,
    N = 0x11,
    O = 0x12,
    P = 0x13,
    Q = 0x14,
    R = 0x15,
    S = 0x16,
    T = 0x17,
    U = 0x18,
    V = 0x19,
    W = 0x1A,
    X = 0x1B,
    Y = 0x1C,
    Z = 0x1D,

    // Numbers
    N1 = 0x1E,
    N2 = 0x1F,
    N3 = 0x20,
    N4 = 0x21,
    N5 = 0x22,
    N6 = 0x23,
    N7 = 0x24,
    N8 = 0x25,
    N9 = 0x26,
    N0 = 0x27,

    // Control keys and punctuation
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,
    Minus = 0x2D,
    Equal = 0x2E,
    LBracket = 0x2F,
    RBracket = 0x30,
    Backslash = 0x31,
    /// Non-US # and ~
    NonUsHash = 0x32,
    Semicolon = 0x33,
    Quote = 0x34,
    Grave = 0x35,
    Comma = 0x36,
    Dot = 0x37,
    Slash = 0x38,
    CapsLock = 0x39,

    // Function keys
    F1 = 0x3A,
    F2 = 0x3B,
    F3 = 0x3C,
    F4 = 0x3D,
    F5 = 0x3E,
    F6 = 0x3F,
    F7 = 0x40,
    F8 = 0x41,
    F9 = 0x42,
    F10 = 0x43,
    F11 = 0x44,
    F12 = 0x45,

    // Navigation
    PrintScreen = 0x46,
    ScrollLock = 0x47,
    Pause = 0x48,
    Insert = 0x49,
    Home = 0x4A,
    PageUp = 0x4B,
    Delete = 0x4C,
    End = 0x4D,
    PageDown = 0x4E,
    Right = 0x4F,
    Left = 0x50,
    Down = 0x51,
    Up = 0x52,

    // Keypad
    NumLock = 0x53,
    KpSlash = 0x54,
    KpAsterisk = 0x55,
    KpMinus = 0x56,
    KpPlus = 0x57,
    KpEnter = 0x58,
    Kp1 = 0x59,
    Kp2 = 0x5A,
    Kp3 = 0x5B,
    Kp4 = 0x5C,
    Kp5 = 0x5D,
    Kp6 = 0x5E,
    Kp7 = 0x5F,
    Kp8 = 0x60,
    Kp9 = 0x61,
    Kp0 = 0x62,
    KpDot = 0x63,
    /// Non-US \ and | (ISO key left of Z, `<` `>` on German layouts)
    NonUsBackslash = 0x64,
    Application = 0x65,
}

impl KeyCode {
    /// The usage ID as it appears in a report slot.
    pub const fn usage(self) -> u8 {
        self as u8
    }

    /// Display name for layout listings and report dumps.
    pub fn display_name(self) -> &'static str {
        match self {
            KeyCode::ErrorRollOver => "ERR",
            KeyCode::PostFail => "POST",
            KeyCode::ErrorUndefined => "UNDEF",
            KeyCode::A => "A",
            KeyCode::B => "B",
            KeyCode::C => "C",
            KeyCode::D => "D",
            KeyCode::E => "E",
            KeyCode::F => "F",
            KeyCode::G => "G",
            KeyCode::H => "H",
            KeyCode::I => "I",
            KeyCode::J => "J",
            KeyCode::K => "K",
            KeyCode::L => "L",
            KeyCode::M => "M",
            KeyCode::N => "N",
            KeyCode::O => "O",
            KeyCode::P => "P",
            KeyCode::Q => "Q",
            KeyCode::R => "R",
            KeyCode::S => "S",
            KeyCode::T => "T",
            KeyCode::U => "U",
            KeyCode::V => "V",
            KeyCode::W => "W",
            KeyCode::X => "X",
            KeyCode::Y => "Y",
            KeyCode::Z => "Z",
            KeyCode::N1 => "1",
            KeyCode::N2 => "2",
            KeyCode::N3 => "3",
            KeyCode::N4 => "4",
            KeyCode::N5 => "5",
            KeyCode::N6 => "6",
            KeyCode::N7 => "7",
            KeyCode::N8 => "8",
            KeyCode::N9 => "9",
            KeyCode::N0 => "0",
            KeyCode::Enter => "Ent",
            KeyCode::Escape => "Esc",
            KeyCode::Backspace => "Bksp",
            KeyCode::Tab => "Tab",
            KeyCode::Space => "Spc",
            KeyCode::Minus => "-",
            KeyCode::Equal => "=",
            KeyCode::LBracket => "[",
            KeyCode::RBracket => "]",
            KeyCode::Backslash => "\\",
            KeyCode::NonUsHash => "#~",
            KeyCode::Semicolon => ";",
            KeyCode::Quote => "'",
            KeyCode::Grave => "`",
            KeyCode::Comma => ",",
            KeyCode::Dot => ".",
            KeyCode::Slash => "/",
            KeyCode::CapsLock => "Caps",
            KeyCode::F1 => "F1",
            KeyCode::F2 => "F2",
            KeyCode::F3 => "F3",
            KeyCode::F4 => "F4",
            KeyCode::F5 => "F5",
            KeyCode::F6 => "F6",
            KeyCode::F7 => "F7",
            KeyCode::F8 => "F8",
            KeyCode::F9 => "F9",
            KeyCode::F10 => "F10",
            KeyCode::F11 => "F11",
            KeyCode::F12 => "F12",
            KeyCode::PrintScreen => "PScr",
            KeyCode::ScrollLock => "ScrL",
            KeyCode::Pause => "Paus",
            KeyCode::Insert => "Ins",
            KeyCode::Home => "Home",
            KeyCode::PageUp => "PgUp",
            KeyCode::Delete => "Del",
            KeyCode::End => "End",
            KeyCode::PageDown => "PgDn",
            KeyCode::Right => "\u{2192}",
            KeyCode::Left => "\u{2190}",
            KeyCode::Down => "\u{2193}",
            KeyCode::Up => "\u{2191}",
            KeyCode::NumLock => "Num",
            KeyCode::KpSlash => "KP/",
            KeyCode::KpAsterisk => "KP*",
            KeyCode::KpMinus => "KP-",
            KeyCode::KpPlus => "KP+",
            KeyCode::KpEnter => "KPEnt",
            KeyCode::Kp1 => "KP1",
            KeyCode::Kp2 => "KP2",
            KeyCode::Kp3 => "KP3",
            KeyCode::Kp4 => "KP4",
            KeyCode::Kp5 => "KP5",
            KeyCode::Kp6 => "KP6",
            KeyCode::Kp7 => "KP7",
            KeyCode::Kp8 => "KP8",
            KeyCode::Kp9 => "KP9",
            KeyCode::Kp0 => "KP0",
            KeyCode::KpDot => "KP.",
            KeyCode::NonUsBackslash => "<>",
            KeyCode::Application => "App",
        }
    }
}

/// Every keycode, indexed by `usage - 1`.
const BY_USAGE: [KeyCode; MAX_USAGE as usize] = [
    KeyCode::ErrorRollOver, KeyCode::PostFail, KeyCode::ErrorUndefined, KeyCode::A,
    KeyCode::B, KeyCode::C, KeyCode::D, KeyCode::E, KeyCode::F, KeyCode::G, KeyCode::H,
    KeyCode::I, KeyCode::J, KeyCode::K, KeyCode::L, KeyCode::M, KeyCode::N, KeyCode::O,
    KeyCode::P, KeyCode::Q, KeyCode::R, KeyCode::S, KeyCode::T, KeyCode::U, KeyCode::V,
    KeyCode::W, KeyCode::X, KeyCode::Y, KeyCode::Z, KeyCode::N1, KeyCode::N2, KeyCode::N3,
    KeyCode::N4, KeyCode::N5, KeyCode::N6, KeyCode::N7, KeyCode::N8, KeyCode::N9,
    KeyCode::N0, KeyCode::Enter, KeyCode::Escape, KeyCode::Backspace, KeyCode::Tab,
    KeyCode::Space, KeyCode::Minus, KeyCode::Equal, KeyCode::LBracket, KeyCode::RBracket,
    KeyCode::Backslash, KeyCode::NonUsHash, KeyCode::Semicolon, KeyCode::Quote,
    KeyCode::Grave, KeyCode::Comma, KeyCode::Dot, KeyCode::Slash, KeyCode::CapsLock,
    KeyCode::F1, KeyCode::F2, KeyCode::F3, KeyCode::F4, KeyCode::F5, KeyCode::F6,
    KeyCode::F7, KeyCode::F8, KeyCode::F9, KeyCode::F10, KeyCode::F11, KeyCode::F12,
    KeyCode::PrintScreen, KeyCode::ScrollLock, KeyCode::Pause, KeyCode::Insert,
    KeyCode::Home, KeyCode::PageUp, KeyCode::Delete, KeyCode::End, KeyCode::PageDown,
    KeyCode::Right, KeyCode::Left, KeyCode::Down, KeyCode::Up, KeyCode::NumLock,
    KeyCode::KpSlash, KeyCode::KpAsterisk, KeyCode::KpMinus, KeyCode::KpPlus,
    KeyCode::KpEnter, KeyCode::Kp1, KeyCode::Kp2, KeyCode::Kp3, KeyCode::Kp4, KeyCode::Kp5,
    KeyCode::Kp6, KeyCode::Kp7, KeyCode::Kp8, KeyCode::Kp9, KeyCode::Kp0, KeyCode::KpDot,
    KeyCode::NonUsBackslash, KeyCode::Application,
];

/// Reverse lookup from a report slot byte, used when dumping reports.
/// Fails for 0 (empty slot) and anything above [`MAX_USAGE`].
impl TryFrom<u8> for KeyCode {
    type Error = u8;

    fn try_from(usage: u8) -> Result<Self, Self::Error> {
        match usage {
            1..=MAX_USAGE => Ok(BY_USAGE[usage as usize - 1]),
            _ => Err(usage),
        }
    }
}

/// The eight modifier keys in report bit order (bit 0 = LCtrl, bit 7 = RGui).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Modifier {
    LCtrl = 0,
    LShift = 1,
    LAlt = 2,
    LGui = 3,
    RCtrl = 4,
    RShift = 5,
    RAlt = 6,
    RGui = 7,
}

impl Modifier {
    pub const ALL: [Modifier; 8] = [
        Modifier::LCtrl,
        Modifier::LShift,
        Modifier::LAlt,
        Modifier::LGui,
        Modifier::RCtrl,
        Modifier::RShift,
        Modifier::RAlt,
        Modifier::RGui,
    ];

    /// Bit in the report's modifier byte.
    pub const fn bit(self) -> u8 {
        1 << self as u8
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Modifier::LCtrl => "Ctrl",
            Modifier::LShift => "Shft",
            Modifier::LAlt => "Alt",
            Modifier::LGui => "Gui",
            Modifier::RCtrl => "RCtl",
            Modifier::RShift => "RSft",
            Modifier::RAlt => "RAlt",
            Modifier::RGui => "RGui",
        }
    }
}
