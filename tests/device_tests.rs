mod testrunners;
use testrunners::{run_rom, test_vm};

use ruxn::console::ConsoleType;
use ruxn::datetime;
use ruxn::input::{self, Button, MouseButton};

#[test]
fn test_console_input_sets_ports() {
    let mut vm = test_vm();
    // No console vector installed: the ports update, nothing runs
    assert!(!vm.console_input(b'x', ConsoleType::Stdin));
    assert_eq!(vm.uxn.dev[0x12], b'x');
    assert_eq!(vm.uxn.dev[0x17], 1);
}

#[test]
fn test_console_vector_sees_input_byte() {
    let mut vm = test_vm();
    vm.uxn.dev_poke2(0x10, 0x0200);
    // LIT 0x12, DEI, BRK: the vector reads the byte back
    vm.uxn.ram[0x0200..0x0204].copy_from_slice(&[0x80, 0x12, 0x16, 0x00]);
    assert!(vm.console_input(b'q', ConsoleType::Stdin));
    assert_eq!(vm.uxn.wst.dat[0], b'q');
}

#[test]
fn test_console_argument_stream() {
    let mut vm = test_vm();
    vm.uxn.dev_poke2(0x10, 0x0200);
    // Append every input byte at 0x3000 and count them in the zero page:
    // LIT 0x12 DEI  LIT 0x40 LDZ  LIT2 0x3000 ADD2? -- keep it simple and
    // just record the last type byte instead.
    vm.uxn.ram[0x0200..0x0206].copy_from_slice(&[0x80, 0x17, 0x16, 0x80, 0x40, 0x11]);
    vm.uxn.ram[0x0206] = 0x00;
    let args = vec!["one".to_string(), "two".to_string()];
    assert!(vm.console_args(&args));
    // The final byte of the stream is the end-of-arguments marker
    assert_eq!(vm.uxn.ram[0x40], 4);
}

#[test]
fn test_datetime_ranges() {
    assert!(datetime::byte(0x2) <= 11);
    assert!((1..=31).contains(&datetime::byte(0x3)));
    assert!(datetime::byte(0x4) < 24);
    assert!(datetime::byte(0x5) < 60);
    assert!(datetime::byte(0x6) < 61);
    assert!(datetime::byte(0x7) < 7);
    assert!(datetime::byte(0xa) <= 1);
    assert_eq!(datetime::byte(0xf), 0);

    let year = ((datetime::byte(0x0) as u16) << 8) | datetime::byte(0x1) as u16;
    assert!(year >= 2024);
}

#[test]
fn test_datetime_device_read() {
    let mut vm = test_vm();
    // DEI2 on the year ports
    assert!(run_rom(&mut vm, &[0x80, 0xc0, 0x36, 0x00]));
    assert!(vm.uxn.wst.peek2(0) >= 2024);
}

#[test]
fn test_button_events_set_bits() {
    let mut vm = test_vm();
    input::button_down(&mut vm, Button::A | Button::UP, 0);
    assert_eq!(vm.uxn.dev[0x82], 0x11);
    input::button_up(&mut vm, Button::A, 0);
    assert_eq!(vm.uxn.dev[0x82], 0x10);

    // Other players land on their own ports
    input::button_down(&mut vm, Button::START, 1);
    assert_eq!(vm.uxn.dev[0x85], 0x08);
    input::button_down(&mut vm, Button::B, 3);
    assert_eq!(vm.uxn.dev[0x87], 0x02);
}

#[test]
fn test_key_events() {
    let mut vm = test_vm();
    input::key_down(&mut vm, b'a');
    assert_eq!(vm.uxn.dev[0x83], b'a');
    // Releasing a different key leaves the current one in place
    input::key_up(&mut vm, b'b');
    assert_eq!(vm.uxn.dev[0x83], b'a');
    input::key_up(&mut vm, b'a');
    assert_eq!(vm.uxn.dev[0x83], 0);
}

#[test]
fn test_keymap_mirrors_keys_to_buttons() {
    let mut vm = test_vm();
    vm.key_map.up = 0x10;
    input::key_down(&mut vm, 0x10);
    assert_eq!(vm.uxn.dev[0x82], Button::UP.bits());
    assert_eq!(vm.uxn.dev[0x83], 0x10);
    input::key_up(&mut vm, 0x10);
    assert_eq!(vm.uxn.dev[0x82], 0);
}

#[test]
fn test_mouse_ports() {
    let mut vm = test_vm();
    input::mouse_move(&mut vm, 123, 456);
    assert_eq!(vm.uxn.dev_peek2(0x92), 123);
    assert_eq!(vm.uxn.dev_peek2(0x94), 456);

    input::mouse_down(&mut vm, MouseButton::LEFT);
    input::mouse_down(&mut vm, MouseButton::MIDDLE);
    assert_eq!(vm.uxn.dev[0x96], 0x05);
    input::mouse_up(&mut vm, MouseButton::LEFT);
    assert_eq!(vm.uxn.dev[0x96], 0x04);

    input::mouse_scroll(&mut vm, 0, 0xffff);
    assert_eq!(vm.uxn.dev_peek2(0x9c), 0xffff);
}

#[test]
fn test_controller_vector_fires_on_button() {
    let mut vm = test_vm();
    vm.uxn.dev_poke2(0x80, 0x0200);
    // LIT 0x82, DEI, BRK: read the button bits inside the vector
    vm.uxn.ram[0x0200..0x0204].copy_from_slice(&[0x80, 0x82, 0x16, 0x00]);
    assert!(input::button_down(&mut vm, Button::RIGHT, 0));
    assert_eq!(vm.uxn.wst.dat[0], 0x80);
}

#[test]
fn test_frame_runs_screen_vector() {
    let mut vm = test_vm();
    vm.uxn.dev_poke2(0x20, 0x0200);
    // Increment a zero-page counter every frame
    vm.uxn.ram[0x0200..0x0208]
        .copy_from_slice(&[0x80, 0x40, 0x10, 0x01, 0x80, 0x40, 0x11, 0x00]);
    assert!(vm.frame());
    assert!(vm.frame());
    assert_eq!(vm.uxn.ram[0x40], 2);
}

#[test]
fn test_halted_machine_reports() {
    let mut vm = test_vm();
    assert!(!vm.halted());
    assert!(run_rom(&mut vm, &[0x80, 0x01, 0x80, 0x0f, 0x17, 0x00]));
    assert!(vm.halted());
    // A halted machine refuses vectors
    vm.uxn.dev_poke2(0x20, 0x0200);
    assert!(!vm.frame());
}
