use sdl2::keyboard::{Keycode, Mod};

use crate::input::Button;

/// Map an SDL keycode to the character byte the controller device reports.
/// Printable characters arrive through text input events instead; only
/// control characters, delete, and ctrl-chorded letters are produced here.
pub fn map_char(keycode: Keycode, keymod: Mod) -> Option<u8> {
    match keycode {
        Keycode::Backspace => Some(0x08),
        Keycode::Tab => Some(0x09),
        Keycode::Return | Keycode::KpEnter => Some(0x0d),
        Keycode::Escape => Some(0x1b),
        Keycode::Delete => Some(0x7f),
        _ => {
            if !keymod.intersects(Mod::LCTRLMOD | Mod::RCTRLMOD) {
                return None;
            }
            let shift = keymod.intersects(Mod::LSHIFTMOD | Mod::RSHIFTMOD);
            let letter = match keycode {
                Keycode::A => b'a',
                Keycode::B => b'b',
                Keycode::C => b'c',
                Keycode::D => b'd',
                Keycode::E => b'e',
                Keycode::F => b'f',
                Keycode::G => b'g',
                Keycode::H => b'h',
                Keycode::I => b'i',
                Keycode::J => b'j',
                Keycode::K => b'k',
                Keycode::L => b'l',
                Keycode::M => b'm',
                Keycode::N => b'n',
                Keycode::O => b'o',
                Keycode::P => b'p',
                Keycode::Q => b'q',
                Keycode::R => b'r',
                Keycode::S => b's',
                Keycode::T => b't',
                Keycode::U => b'u',
                Keycode::V => b'v',
                Keycode::W => b'w',
                Keycode::X => b'x',
                Keycode::Y => b'y',
                Keycode::Z => b'z',
                _ => return None,
            };
            Some(if shift { letter - 0x20 } else { letter })
        }
    }
}

/// Map an SDL keycode to a controller button: arrows are the d-pad, the
/// modifier keys cover A/B/Select and Home is Start.
pub fn map_button(keycode: Keycode) -> Button {
    match keycode {
        Keycode::Up => Button::UP,
        Keycode::Down => Button::DOWN,
        Keycode::Left => Button::LEFT,
        Keycode::Right => Button::RIGHT,
        Keycode::LCtrl | Keycode::RCtrl => Button::A,
        Keycode::LAlt | Keycode::RAlt => Button::B,
        Keycode::LShift | Keycode::RShift => Button::SELECT,
        Keycode::Home => Button::START,
        _ => Button::empty(),
    }
}
