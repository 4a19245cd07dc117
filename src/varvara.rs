use std::path::PathBuf;

use crate::bus::Bus;
use crate::console::ConsoleType;
use crate::input::KeyMap;
use crate::uxn::{PAGE_PROGRAM, Uxn};

/// The assembled machine: the Uxn core plus the Varvara device bus. The two
/// halves are separate fields so device handlers can borrow the core
/// mutably while the bus dispatches.
pub struct Varvara {
    pub uxn: Uxn,
    pub bus: Bus,
    pub key_map: KeyMap,
}

impl Varvara {
    pub fn new(root_path: PathBuf, width: u16, height: u16) -> Self {
        Self {
            uxn: Uxn::new(),
            bus: Bus::new(root_path, width, height),
            key_map: KeyMap::default(),
        }
    }

    /// Load the boot ROM from the sandbox and bring the machine up. The
    /// screen palette is derived from the zeroed device page so the initial
    /// surface is black until the ROM writes its colors.
    pub fn init(&mut self, rom_name: &str) -> Result<(), String> {
        let rom = self.bus.file.load(rom_name)?;
        self.bus.log_trace(&format!("[BOOT] Loaded {:?} ({} bytes)", rom_name, rom.len()));
        self.uxn.set_boot_rom(rom);
        self.uxn.init();
        self.bus.screen.update_palette(&self.uxn);
        Ok(())
    }

    /// Bring the machine up from an in-memory ROM, bypassing the filesystem.
    pub fn init_with_rom(&mut self, rom: Vec<u8>) {
        self.uxn.set_boot_rom(rom);
        self.uxn.init();
        self.bus.screen.update_palette(&self.uxn);
    }

    /// Run the init vector at 0x0100 and stream the command-line arguments
    /// through the console device.
    pub fn start(&mut self, args: &[String]) -> bool {
        let did_run = self.uxn.eval(&mut self.bus, PAGE_PROGRAM);
        if !args.is_empty() {
            self.console_args(args);
        }
        did_run
    }

    pub fn reset(&mut self, soft: bool) {
        self.uxn.reset(soft);
        self.bus.screen.reset(&self.uxn);
        self.uxn.eval(&mut self.bus, PAGE_PROGRAM);
    }

    pub fn halted(&self) -> bool {
        self.uxn.dev[0x0f] != 0
    }

    /// One display refresh: run the screen vector, then composite if
    /// anything changed. Returns whether the vector executed.
    pub fn frame(&mut self) -> bool {
        let did_run = self.uxn.call_vec(&mut self.bus, 0x20);
        if self.bus.screen.dirty {
            self.bus.screen.redraw(&self.uxn);
            self.bus.screen.dirty = false;
        }
        did_run
    }

    /// Feed one byte into the console device and fire its vector.
    pub fn console_input(&mut self, b: u8, kind: ConsoleType) -> bool {
        self.uxn.dev[0x12] = b;
        self.uxn.dev[0x17] = kind as u8;
        self.uxn.call_vec(&mut self.bus, 0x10)
    }

    /// Stream the command-line arguments byte-wise: spacers between
    /// arguments, a zero byte to finish.
    pub fn console_args(&mut self, args: &[String]) -> bool {
        for (i, arg) in args.iter().enumerate() {
            if i > 0 && !self.console_input(b' ', ConsoleType::ArgumentSpacer) {
                return false;
            }
            for &b in arg.as_bytes() {
                if !self.console_input(b, ConsoleType::Argument) {
                    return false;
                }
            }
        }
        self.console_input(0, ConsoleType::ArgumentEnd)
    }
}
