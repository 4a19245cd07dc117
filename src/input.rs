use bitflags::bitflags;

use crate::varvara::Varvara;

bitflags! {
    /// Controller button bits at dev 0x82 (and 0x85..0x87 for players 2-4).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Button: u8 {
        const A      = 0x01;
        const B      = 0x02;
        const SELECT = 0x04;
        const START  = 0x08;
        const UP     = 0x10;
        const DOWN   = 0x20;
        const LEFT   = 0x40;
        const RIGHT  = 0x80;
    }
}

bitflags! {
    /// Mouse button bits at dev 0x96.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MouseButton: u8 {
        const LEFT   = 0x01;
        const RIGHT  = 0x02;
        const MIDDLE = 0x04;
    }
}

const PLAYER_OFFSET: [u8; 4] = [0x82, 0x85, 0x86, 0x87];

/// Optional mapping from raw key bytes to controller buttons, consulted on
/// every key event. Unset entries (zero) never match.
#[derive(Default, Clone, Copy)]
pub struct KeyMap {
    pub a: u8,
    pub b: u8,
    pub select: u8,
    pub start: u8,
    pub up: u8,
    pub down: u8,
    pub left: u8,
    pub right: u8,
}

impl KeyMap {
    pub fn button(&self, key: u8) -> Button {
        if key == 0 {
            return Button::empty();
        }
        match key {
            k if k == self.a => Button::A,
            k if k == self.b => Button::B,
            k if k == self.select => Button::SELECT,
            k if k == self.start => Button::START,
            k if k == self.up => Button::UP,
            k if k == self.down => Button::DOWN,
            k if k == self.left => Button::LEFT,
            k if k == self.right => Button::RIGHT,
            _ => Button::empty(),
        }
    }
}

pub fn key_down(vm: &mut Varvara, key: u8) -> bool {
    let mapped = vm.key_map.button(key);
    if !mapped.is_empty() {
        vm.uxn.dev[0x82] |= mapped.bits();
    }
    vm.uxn.dev[0x83] = key;
    vm.uxn.call_vec(&mut vm.bus, 0x80)
}

pub fn key_up(vm: &mut Varvara, key: u8) -> bool {
    let mapped = vm.key_map.button(key);
    let had_button = !mapped.is_empty();
    if had_button {
        vm.uxn.dev[0x82] &= !mapped.bits();
    }
    if vm.uxn.dev[0x83] == key {
        vm.uxn.dev[0x83] = 0;
    }
    had_button && vm.uxn.call_vec(&mut vm.bus, 0x80)
}

pub fn button_down(vm: &mut Varvara, button: Button, player: usize) -> bool {
    if button.is_empty() {
        return false;
    }
    vm.uxn.dev[PLAYER_OFFSET[player % 4] as usize] |= button.bits();
    vm.uxn.dev[0x83] = 0;
    vm.uxn.call_vec(&mut vm.bus, 0x80)
}

pub fn button_up(vm: &mut Varvara, button: Button, player: usize) -> bool {
    if button.is_empty() {
        return false;
    }
    vm.uxn.dev[PLAYER_OFFSET[player % 4] as usize] &= !button.bits();
    vm.uxn.call_vec(&mut vm.bus, 0x80)
}

pub fn mouse_move(vm: &mut Varvara, x: u16, y: u16) -> bool {
    vm.uxn.dev_poke2(0x92, x);
    vm.uxn.dev_poke2(0x94, y);
    vm.uxn.call_vec(&mut vm.bus, 0x90)
}

pub fn mouse_down(vm: &mut Varvara, button: MouseButton) -> bool {
    if button.is_empty() {
        return false;
    }
    vm.uxn.dev[0x96] |= button.bits();
    vm.uxn.call_vec(&mut vm.bus, 0x90)
}

pub fn mouse_up(vm: &mut Varvara, button: MouseButton) -> bool {
    if button.is_empty() {
        return false;
    }
    vm.uxn.dev[0x96] &= !button.bits();
    vm.uxn.call_vec(&mut vm.bus, 0x90)
}

pub fn mouse_scroll(vm: &mut Varvara, x: u16, y: u16) -> bool {
    vm.uxn.dev_poke2(0x9a, x);
    vm.uxn.dev_poke2(0x9c, y);
    vm.uxn.call_vec(&mut vm.bus, 0x90)
}
