mod testrunners;
use testrunners::{run_rom, test_vm};

// LIT2 value, LIT port, DEO2
fn deo2(value: u16, port: u8) -> Vec<u8> {
    vec![0xa0, (value >> 8) as u8, value as u8, 0x80, port, 0x37]
}

// LIT value, LIT port, DEO
fn deo(value: u8, port: u8) -> Vec<u8> {
    vec![0x80, value, 0x80, port, 0x17]
}

fn rom(parts: &[Vec<u8>]) -> Vec<u8> {
    let mut out: Vec<u8> = parts.concat();
    out.push(0x00);
    out
}

#[test]
fn test_pixel_marks_dirty_rect() {
    let mut vm = test_vm();
    // Flush the initial full-surface dirty rectangle
    vm.frame();
    assert!(!vm.bus.screen.dirty);

    // rX=5, rY=7, then a foreground pixel with color 3
    let code = rom(&[deo2(5, 0x28), deo2(7, 0x2a), deo(0x43, 0x2e)]);
    assert!(run_rom(&mut vm, &code));
    assert!(vm.bus.screen.dirty);
    assert_eq!(vm.bus.screen.dirty_rect(), (5, 7, 6, 8));

    vm.frame();
    // fg=3 over bg=0 maps to palette index 3
    assert_eq!(vm.bus.screen.pixel(5, 7), 3);
    assert_eq!(vm.bus.screen.pixel(4, 7), 0);
    assert!(!vm.bus.screen.dirty);
}

#[test]
fn test_no_blit_when_clean() {
    let mut vm = test_vm();
    vm.frame();
    let rect = vm.bus.screen.dirty_rect();
    // An empty rectangle stays empty across an idle frame
    vm.frame();
    assert_eq!(vm.bus.screen.dirty_rect(), rect);
    assert_eq!(rect, (0xffff, 0xffff, 0, 0));
}

#[test]
fn test_resize_and_out_of_range() {
    let mut vm = test_vm();
    let code = rom(&[deo2(0x0300, 0x22)]);
    assert!(run_rom(&mut vm, &code));
    assert_eq!(vm.bus.screen.w, 0x0300);
    assert_eq!(vm.bus.screen.h, 320);
    assert!(vm.bus.screen.take_resized());

    // Too small and too large are silently ignored
    let code = rom(&[deo2(0x0004, 0x22), deo2(0x0900, 0x24)]);
    assert!(run_rom(&mut vm, &code));
    assert_eq!(vm.bus.screen.w, 0x0300);
    assert_eq!(vm.bus.screen.h, 320);
    assert!(!vm.bus.screen.take_resized());

    // Boundary values are accepted
    let code = rom(&[deo2(0x0008, 0x22), deo2(0x07ff, 0x24)]);
    assert!(run_rom(&mut vm, &code));
    assert_eq!(vm.bus.screen.w, 0x0008);
    assert_eq!(vm.bus.screen.h, 0x07ff);
}

#[test]
fn test_resize_clears_layers() {
    let mut vm = test_vm();
    let code = rom(&[deo2(5, 0x28), deo2(7, 0x2a), deo(0x43, 0x2e)]);
    assert!(run_rom(&mut vm, &code));
    vm.frame();
    assert_eq!(vm.bus.screen.pixel(5, 7), 3);

    let code = rom(&[deo2(0x0100, 0x22)]);
    assert!(run_rom(&mut vm, &code));
    vm.frame();
    assert_eq!(vm.bus.screen.pixel(5, 7), 0);
}

#[test]
fn test_fill_covers_half_planes() {
    let mut vm = test_vm();
    // rX=10: fill the background from rX to the right edge with color 2
    let code = rom(&[deo2(10, 0x28), deo2(0, 0x2a), deo(0x82, 0x2e)]);
    assert!(run_rom(&mut vm, &code));
    assert_eq!(vm.bus.screen.layer_pixel(false, 9, 100), 0);
    assert_eq!(vm.bus.screen.layer_pixel(false, 10, 100), 2);
    assert_eq!(vm.bus.screen.layer_pixel(false, 511, 319), 2);

    // Bit 4 flips to the left half: 0..rX
    let mut vm = test_vm();
    let code = rom(&[deo2(10, 0x28), deo2(0, 0x2a), deo(0x93, 0x2e)]);
    assert!(run_rom(&mut vm, &code));
    assert_eq!(vm.bus.screen.layer_pixel(false, 9, 100), 3);
    assert_eq!(vm.bus.screen.layer_pixel(false, 10, 100), 0);
}

#[test]
fn test_pixel_auto_advance() {
    let mut vm = test_vm();
    // auto x|y: each pixel write steps rX and rY
    let code = rom(&[
        deo(0x03, 0x26),
        deo2(1, 0x28),
        deo2(1, 0x2a),
        deo(0x41, 0x2e),
        deo(0x41, 0x2e),
    ]);
    assert!(run_rom(&mut vm, &code));
    assert_eq!(vm.bus.screen.layer_pixel(true, 1, 1), 1);
    assert_eq!(vm.bus.screen.layer_pixel(true, 2, 2), 1);
    assert_eq!(vm.bus.screen.layer_pixel(true, 2, 1), 0);
}

#[test]
fn test_sprite_1bpp_draws_block() {
    let mut vm = test_vm();
    // Solid 8x8 tile at 0x0800
    for i in 0..8 {
        vm.uxn.ram[0x0800 + i] = 0xff;
    }
    let code = rom(&[deo2(16, 0x28), deo2(16, 0x2a), deo2(0x0800, 0x2c), deo(0x41, 0x2f)]);
    assert!(run_rom(&mut vm, &code));
    for y in 16..24 {
        for x in 16..24 {
            assert_eq!(vm.bus.screen.layer_pixel(true, x, y), 1);
        }
    }
    assert_eq!(vm.bus.screen.layer_pixel(true, 24, 16), 0);
}

#[test]
fn test_sprite_transparent_color_keeps_pixels() {
    let mut vm = test_vm();
    // Paint a background pixel, then stamp an empty sprite with color 5:
    // blending row 4 marks it transparent, so channel-0 pixels survive.
    let code = rom(&[deo2(16, 0x28), deo2(16, 0x2a), deo(0x02, 0x2e)]);
    assert!(run_rom(&mut vm, &code));
    assert_eq!(vm.bus.screen.layer_pixel(false, 16, 16), 2);

    for i in 0..8 {
        vm.uxn.ram[0x0800 + i] = 0x00;
    }
    let code = rom(&[deo2(0x0800, 0x2c), deo(0x05, 0x2f)]);
    assert!(run_rom(&mut vm, &code));
    assert_eq!(vm.bus.screen.layer_pixel(false, 16, 16), 2);

    // Color 1 is opaque: the same empty sprite now clears the block
    let code = rom(&[deo(0x01, 0x2f)]);
    assert!(run_rom(&mut vm, &code));
    assert_eq!(vm.bus.screen.layer_pixel(false, 16, 16), 0);
}

#[test]
fn test_sprite_2bpp_composes_planes() {
    let mut vm = test_vm();
    // Plane 0 all ones, plane 1 all zeros: channel 1 everywhere
    for i in 0..8 {
        vm.uxn.ram[0x0800 + i] = 0xff;
        vm.uxn.ram[0x0808 + i] = 0x00;
    }
    let code = rom(&[deo2(0, 0x28), deo2(0, 0x2a), deo2(0x0800, 0x2c), deo(0x81, 0x2f)]);
    assert!(run_rom(&mut vm, &code));
    // blending[1][1] == 1
    assert_eq!(vm.bus.screen.layer_pixel(false, 0, 0), 1);

    // Both planes set: channel 3, blending[3][1] == 2
    for i in 0..8 {
        vm.uxn.ram[0x0808 + i] = 0xff;
    }
    let code = rom(&[deo2(0x0800, 0x2c), deo(0x81, 0x2f)]);
    assert!(run_rom(&mut vm, &code));
    assert_eq!(vm.bus.screen.layer_pixel(false, 0, 0), 2);
}

#[test]
fn test_sprite_flip_mirrors() {
    let mut vm = test_vm();
    // One pixel in the top-left corner of the tile
    vm.uxn.ram[0x0800] = 0x80;
    let code = rom(&[deo2(0, 0x28), deo2(0, 0x2a), deo2(0x0800, 0x2c), deo(0x11, 0x2f)]);
    assert!(run_rom(&mut vm, &code));
    // Horizontal flip moves it to the right edge of the block
    assert_eq!(vm.bus.screen.layer_pixel(false, 7, 0), 1);
    assert_eq!(vm.bus.screen.layer_pixel(false, 0, 0), 0);
}

#[test]
fn test_sprite_length_repeats_and_advances() {
    let mut vm = test_vm();
    for i in 0..16 {
        vm.uxn.ram[0x0800 + i] = 0xff;
    }
    // auto x + addr, length 1: repeats stack perpendicular to the auto
    // axis, so the second tile lands one block down
    let code = rom(&[
        deo(0x15, 0x26),
        deo2(0, 0x28),
        deo2(0, 0x2a),
        deo2(0x0800, 0x2c),
        deo(0x01, 0x2f),
    ]);
    assert!(run_rom(&mut vm, &code));
    assert_eq!(vm.bus.screen.layer_pixel(false, 0, 0), 1);
    assert_eq!(vm.bus.screen.layer_pixel(false, 7, 15), 1);
    assert_eq!(vm.bus.screen.layer_pixel(false, 15, 7), 0);
    // rA advanced by 8 per tile; rX stepped by 8 after the run
    assert!(run_rom(&mut vm, &[0x80, 0x2c, 0x36, 0x00]));
    assert_eq!(vm.uxn.wst.peek2(0), 0x0810);
    assert!(run_rom(&mut vm, &[0x80, 0x28, 0x36, 0x00]));
    assert_eq!(vm.uxn.wst.peek2(0), 0x0008);
}

#[test]
fn test_palette_update() {
    let mut vm = test_vm();
    // Color 0 red nibble = 0xf -> full red after the 0x09 write refresh
    let code = rom(&[deo2(0xf000, 0x08)]);
    assert!(run_rom(&mut vm, &code));
    vm.frame();
    assert_eq!(vm.bus.screen.pixels[0], 0xff);
    assert_eq!(vm.bus.screen.pixels[1], 0x00);
    assert_eq!(vm.bus.screen.pixels[2], 0x00);
}

#[test]
fn test_screen_dimension_readback() {
    let mut vm = test_vm();
    // DEI2 on the width port reports the live dimensions
    assert!(run_rom(&mut vm, &[0x80, 0x22, 0x36, 0x00]));
    assert_eq!(vm.uxn.wst.peek2(0), 512);
}

#[test]
fn test_debug_overlay_draws_on_flag() {
    let mut vm = test_vm();
    vm.frame();
    vm.uxn.dev[0x0e] = 1;
    vm.bus.screen.force_redraw();
    vm.frame();
    // The zero-page dump starts near the top-left corner
    let mut any = false;
    for y in 8..16 {
        for x in 8..512 {
            any |= vm.bus.screen.layer_pixel(true, x, y) != 0;
        }
    }
    assert!(any, "debug overlay should draw into the foreground layer");
}
