//! Bundled layouts for the Commodore keyboards.
//!
//! Row index = matrix drive line, column index = sense line. Row 8 is the
//! RESTORE line.

use crate::keycode::{KeyCode as K, Modifier};
use crate::layout::{Cell, Key, LayoutDef, ModDelta, ShiftRule, SpecialKey};

const ___: Key = Key::None;

const fn c(code: K) -> Key {
    Key::Code(code)
}

const fn sp(index: u8) -> Key {
    Key::Special(index)
}

const fn branch(code: K, delta: ModDelta) -> (Key, ModDelta) {
    (Key::Code(code), delta)
}

const LSHIFT: Cell = Cell::new(7, 1);
const RSHIFT: Cell = Cell::new(4, 6);

const LSFT: Key = Key::Mod(Modifier::LShift);
const RSFT: Key = Key::Mod(Modifier::RShift);
const LCTL: Key = Key::Mod(Modifier::LCtrl);
const LGUI: Key = Key::Mod(Modifier::LGui);
const RALT: Key = Key::Mod(Modifier::RAlt);

const KEEP: ModDelta = ModDelta::NONE;
const NO_RSFT: ModDelta = ModDelta::CLEAR_RSHIFT;
const NO_SFT: ModDelta = ModDelta::CLEAR_SHIFTS;

// C64 special-key indices
const C64_DEL: Key = sp(0);
const C64_CRSR_UD: Key = sp(1);
const C64_CRSR_LR: Key = sp(2);
const C64_F1F5: Key = sp(3);
const C64_F2F6: Key = sp(4);
const C64_F3F7: Key = sp(5);
const C64_F4F8: Key = sp(6);
const C64_2: Key = sp(7);
const C64_3: Key = sp(8);
const C64_QUOTE: Key = sp(9);
const C64_PIPE: Key = sp(10);

const C64_SPECIALS: [SpecialKey; 11] = [
    // INST/DEL: backspace, shifted delete
    SpecialKey::new(branch(K::Backspace, KEEP), branch(K::Delete, NO_SFT)),
    // CRSR down / up
    SpecialKey::new(branch(K::Down, NO_RSFT), branch(K::Up, NO_RSFT)),
    // CRSR right / left
    SpecialKey::new(branch(K::Right, NO_RSFT), branch(K::Left, NO_RSFT)),
    SpecialKey::new(branch(K::F1, NO_RSFT), branch(K::F5, NO_RSFT)),
    SpecialKey::new(branch(K::F2, NO_RSFT), branch(K::F6, NO_RSFT)),
    SpecialKey::new(branch(K::F3, NO_RSFT), branch(K::F7, NO_RSFT)),
    SpecialKey::new(branch(K::F4, NO_RSFT), branch(K::F8, NO_RSFT)),
    // shift-2 is "
    SpecialKey::new(branch(K::N2, KEEP), branch(K::Quote, KEEP)),
    // shift-3 is #
    SpecialKey::new(branch(K::N3, KEEP), branch(K::NonUsHash, NO_SFT)),
    // shift-' is "
    SpecialKey::new(branch(K::Quote, KEEP), branch(K::N2, KEEP)),
    // shift-\ is |
    SpecialKey::new(branch(K::NonUsBackslash, KEEP), branch(K::NonUsBackslash, NO_RSFT)),
];

/// Commodore 64 keyboard to a US host layout. Specials take the unshifted
/// branch only while both shift keys are up.
pub const C64_US: LayoutDef<'static> = LayoutDef {
    name: "c64-us",
    keys: [
        [c(K::F11), C64_3, c(K::N5), c(K::N7), c(K::N9), c(K::F10), c(K::Minus), c(K::N1)],
        [c(K::Enter), c(K::W), c(K::R), c(K::Y), c(K::I), c(K::P), C64_PIPE, C64_DEL],
        [C64_CRSR_UD, c(K::A), c(K::D), c(K::G), c(K::J), c(K::L), C64_QUOTE, c(K::Tab)],
        [C64_F4F8, c(K::N4), c(K::N6), c(K::N8), c(K::N0), c(K::F9), c(K::Equal), C64_2],
        [C64_F1F5, c(K::Z), c(K::C), c(K::B), c(K::M), c(K::Dot), RSFT, c(K::Space)],
        [C64_F2F6, c(K::S), c(K::F), c(K::H), c(K::K), c(K::Semicolon), C64_CRSR_LR, LCTL],
        [C64_F3F7, c(K::E), c(K::T), c(K::U), c(K::O), c(K::F12), c(K::RBracket), c(K::Q)],
        [c(K::LBracket), LSFT, c(K::X), c(K::V), c(K::N), c(K::Comma), c(K::Slash), c(K::CapsLock)],
        [___, ___, ___, c(K::Escape), ___, ___, ___, ___],
    ],
    specials: &C64_SPECIALS,
    shift: ShiftRule::BothReleased {
        left: LSHIFT,
        right: RSHIFT,
    },
};

// C16 special-key indices
const C16_DEL: Key = sp(0);
const C16_CRSR_UD: Key = sp(1);
const C16_CRSR_LR: Key = sp(2);
const C16_F1F5: Key = sp(3);
const C16_F2F6: Key = sp(4);
const C16_F3F7: Key = sp(5);
const C16_F4F8: Key = sp(6);
const C16_2: Key = sp(7);
const C16_3: Key = sp(8);
const C16_GRAVE: Key = sp(9);
const C16_QUOTE: Key = sp(10);
const C16_PIPE: Key = sp(11);

const C16_SPECIALS: [SpecialKey; 12] = [
    SpecialKey::new(branch(K::Backspace, KEEP), branch(K::Delete, NO_SFT)),
    SpecialKey::new(branch(K::Down, NO_RSFT), branch(K::Up, NO_RSFT)),
    SpecialKey::new(branch(K::Right, NO_RSFT), branch(K::Left, NO_RSFT)),
    SpecialKey::new(branch(K::F1, NO_RSFT), branch(K::F5, NO_RSFT)),
    SpecialKey::new(branch(K::F2, NO_RSFT), branch(K::F6, NO_RSFT)),
    SpecialKey::new(branch(K::F3, NO_RSFT), branch(K::F7, NO_RSFT)),
    SpecialKey::new(branch(K::F4, NO_RSFT), branch(K::F8, NO_RSFT)),
    SpecialKey::new(branch(K::N2, KEEP), branch(K::Quote, KEEP)),
    SpecialKey::new(branch(K::N3, KEEP), branch(K::NonUsHash, NO_SFT)),
    // shift-` is ~
    SpecialKey::new(branch(K::Grave, KEEP), branch(K::NonUsHash, KEEP)),
    SpecialKey::new(branch(K::Quote, KEEP), branch(K::N2, KEEP)),
    SpecialKey::new(branch(K::NonUsBackslash, KEEP), branch(K::NonUsBackslash, NO_RSFT)),
];

/// Commodore 16 keyboard to a US host layout. The C16 matrix has no
/// separate right shift, so only the left shift cell is consulted.
pub const C16_US: LayoutDef<'static> = LayoutDef {
    name: "c16-us",
    keys: [
        [c(K::F11), C16_3, c(K::N5), c(K::N7), c(K::N9), c(K::F10), c(K::Minus), c(K::N1)],
        [c(K::Enter), c(K::W), c(K::R), c(K::Y), c(K::I), c(K::P), C16_PIPE, C16_DEL],
        [C16_CRSR_UD, c(K::A), c(K::D), c(K::G), c(K::J), c(K::L), C16_QUOTE, c(K::Tab)],
        [C16_F4F8, c(K::N4), c(K::N6), c(K::N8), c(K::N0), c(K::F9), c(K::Equal), C16_2],
        [C16_F1F5, c(K::Z), c(K::C), c(K::B), c(K::M), c(K::Dot), C16_GRAVE, c(K::Space)],
        [C16_F2F6, c(K::S), c(K::F), c(K::H), c(K::K), c(K::Semicolon), C16_CRSR_LR, LCTL],
        [C16_F3F7, c(K::E), c(K::T), c(K::U), c(K::O), c(K::F12), c(K::RBracket), c(K::Q)],
        [c(K::LBracket), LSFT, c(K::X), c(K::V), c(K::N), c(K::Comma), c(K::Slash), c(K::CapsLock)],
        [___, ___, ___, ___, ___, ___, ___, ___],
    ],
    specials: &C16_SPECIALS,
    shift: ShiftRule::LeftOnly { left: LSHIFT },
};

// Plus/4 special-key indices
const P4_DEL: Key = sp(0);
const P4_F1: Key = sp(1);
const P4_F2: Key = sp(2);
const P4_F3: Key = sp(3);
const P4_HELP: Key = sp(4);
const P4_CRSR_U: Key = sp(5);
const P4_CRSR_D: Key = sp(6);
const P4_CRSR_L: Key = sp(7);
const P4_CRSR_R: Key = sp(8);

const PLUS4_SPECIALS: [SpecialKey; 9] = [
    SpecialKey::new(branch(K::Backspace, KEEP), branch(K::Delete, NO_SFT)),
    SpecialKey::new(branch(K::F1, KEEP), branch(K::F5, NO_SFT)),
    SpecialKey::new(branch(K::F2, KEEP), branch(K::F6, NO_SFT)),
    SpecialKey::new(branch(K::F3, KEEP), branch(K::F7, NO_SFT)),
    SpecialKey::new(branch(K::F4, KEEP), branch(K::F8, NO_SFT)),
    SpecialKey::new(branch(K::Up, KEEP), branch(K::PageUp, NO_SFT)),
    SpecialKey::new(branch(K::Down, KEEP), branch(K::PageDown, NO_SFT)),
    SpecialKey::new(branch(K::Left, KEEP), branch(K::Home, NO_SFT)),
    SpecialKey::new(branch(K::Right, KEEP), branch(K::End, NO_SFT)),
];

/// Commodore Plus/4 keyboard to a German host layout. The cursor keys
/// (specials 5 and up) only look at the left shift.
pub const PLUS4_DE: LayoutDef<'static> = LayoutDef {
    name: "plus4-de",
    keys: [
        [P4_DEL, c(K::N3), c(K::N5), c(K::N7), c(K::N9), P4_CRSR_D, P4_CRSR_L, c(K::N1)],
        [c(K::Enter), c(K::W), c(K::R), c(K::Y), c(K::I), c(K::P), c(K::Backslash), c(K::Tab)],
        // pound sign on RBracket
        [c(K::RBracket), c(K::A), c(K::D), c(K::G), c(K::J), c(K::L), c(K::Quote), LCTL],
        [P4_HELP, c(K::N4), c(K::N6), c(K::N8), c(K::N0), P4_CRSR_U, P4_CRSR_R, c(K::N2)],
        [P4_F1, c(K::Z), c(K::C), c(K::B), c(K::M), c(K::Dot), c(K::Escape), c(K::Space)],
        // `=` lands on Grave on a German host
        [P4_F2, c(K::S), c(K::F), c(K::H), c(K::K), c(K::Semicolon), c(K::Grave), LGUI],
        [P4_F3, c(K::E), c(K::T), c(K::U), c(K::O), c(K::Equal), c(K::Minus), c(K::Q)],
        [c(K::LBracket), LSFT, c(K::X), c(K::V), c(K::N), c(K::Comma), c(K::Slash), RALT],
        [___, ___, ___, c(K::N3), ___, ___, ___, ___],
    ],
    specials: &PLUS4_SPECIALS,
    shift: ShiftRule::RightIgnoredFrom {
        left: LSHIFT,
        right: RSHIFT,
        from: 5,
    },
};

/// Every bundled layout, default first.
pub const ALL: [&LayoutDef<'static>; 3] = [&C64_US, &C16_US, &PLUS4_DE];

pub fn by_name(name: &str) -> Option<&'static LayoutDef<'static>> {
    ALL.into_iter().find(|def| def.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Layout;

    #[test]
    fn bundled_layouts_validate() {
        for def in ALL {
            Layout::new(def.clone()).unwrap();
        }
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(by_name("plus4-de").map(|d| d.name), Some("plus4-de"));
        assert!(by_name("vic20").is_none());
    }

    #[test]
    fn shift_cells_hold_shift_keys_on_c64() {
        let layout = Layout::new(C64_US).unwrap();
        assert_eq!(layout.key(7, 1), LSFT);
        assert_eq!(layout.key(4, 6), RSFT);
    }
}
