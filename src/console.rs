use std::io::{Write, stderr, stdout};

use crate::uxn::Uxn;

const FLUSH_THRESHOLD: usize = 256;

/// Origin tag written to dev 0x17 alongside each input byte.
#[derive(Clone, Copy, PartialEq)]
pub enum ConsoleType {
    NoQueue = 0,
    Stdin = 1,
    Argument = 2,
    ArgumentSpacer = 3,
    ArgumentEnd = 4,
}

/// Console output sink. Writes are line-buffered: the buffer flushes on a
/// newline or when it fills.
pub struct Console {
    buf: Vec<u8>,
}

impl Console {
    pub fn new() -> Self {
        Self { buf: Vec::with_capacity(FLUSH_THRESHOLD) }
    }

    pub fn write_byte(&mut self, b: u8) {
        self.buf.push(b);
        if b == b'\n' || self.buf.len() >= FLUSH_THRESHOLD {
            self.flush();
        }
    }

    pub fn flush(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let out = stdout();
        let mut lock = out.lock();
        let _ = lock.write_all(&self.buf);
        let _ = lock.flush();
        self.buf.clear();
    }

    pub fn after_deo(&mut self, uxn: &mut Uxn, port: u8) {
        match port {
            0x18 => self.write_byte(uxn.dev[0x18]),
            0x19 => {
                let _ = stderr().write_all(&[uxn.dev[0x19]]);
            }
            _ => {}
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Console::new()
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        self.flush();
    }
}
