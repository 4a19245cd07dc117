use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::audio::Mixer;
use crate::console::Console;
use crate::datetime;
use crate::fs::Filesystem;
use crate::screen::Screen;
use crate::uxn::{Device, Uxn};

/// The Varvara device page, 16 devices of 16 ports each. The bus owns every
/// host-side device and routes DEI/DEO side effects to them by port range.
pub struct Bus {
    pub screen: Screen,
    pub audio: Mixer,
    pub file: Filesystem,
    pub console: Console,
    pub log_file: Option<BufWriter<File>>,
}

impl Bus {
    pub fn new(root_path: PathBuf, width: u16, height: u16) -> Self {
        Self {
            screen: Screen::new(width, height),
            audio: Mixer::new(),
            file: Filesystem::new(root_path),
            console: Console::new(),
            log_file: None,
        }
    }

    pub fn log_string(&mut self, s: &str) {
        println!("{}", s);
        self.log_to_file(s);
    }

    pub fn log_trace(&mut self, s: &str) {
        self.log_to_file(s);
    }

    fn log_to_file(&mut self, s: &str) {
        if self.log_file.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open("trace.log")
                .expect("Failed to open trace.log");
            self.log_file = Some(BufWriter::new(file));
        }
        if let Some(writer) = &mut self.log_file {
            let _ = writeln!(writer, "{}", s);
        }
    }
}

impl Device for Bus {
    fn before_dei(&mut self, uxn: &mut Uxn, port: u8) {
        match port {
            // System: live stack pointers
            0x04 => uxn.dev[0x04] = uxn.wst.ptr,
            0x05 => uxn.dev[0x05] = uxn.rst.ptr,
            0x20..=0x2f => self.screen.before_dei(uxn, port),
            0x30..=0x6f => self.audio.before_dei(uxn, port),
            0xc0..=0xcf => uxn.dev[port as usize] = datetime::byte(port & 0xf),
            _ => {}
        }
    }

    fn after_deo(&mut self, uxn: &mut Uxn, port: u8) {
        match port {
            // System
            0x03 => uxn.dma(),
            0x04 => uxn.wst.ptr = uxn.dev[0x04],
            0x05 => uxn.rst.ptr = uxn.dev[0x05],
            0x09 | 0x0b | 0x0d => self.screen.update_palette(uxn),
            0x0e => self.screen.force_redraw(),
            // 0x0f (halt) is observed directly by the eval loop
            0x10..=0x1f => self.console.after_deo(uxn, port),
            0x20..=0x2f => self.screen.after_deo(uxn, port),
            0x30..=0x6f => self.audio.after_deo(uxn, port),
            0xa0..=0xaf => self.file.after_deo(uxn, port),
            _ => {}
        }
    }
}
