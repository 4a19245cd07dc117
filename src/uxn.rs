use std::array;

/// Program entry point in RAM. The 256 bytes below it are the zero page.
pub const PAGE_PROGRAM: u16 = 0x0100;

// Each memory array carries one extra guard byte so a 16-bit read of the
// highest address never indexes out of bounds.
const RAM_SIZE: usize = 0x10001;
const DEV_SIZE: usize = 0x101;
const BANK_SIZE: usize = 0x10001;

/// Host-side device handlers hooked into the DEI/DEO opcodes.
///
/// `before_dei` refreshes read-only ports just before the CPU reads them;
/// `after_deo` runs the side effect of a port that was just written.
pub trait Device {
    fn before_dei(&mut self, uxn: &mut Uxn, port: u8);
    fn after_deo(&mut self, uxn: &mut Uxn, port: u8);
}

/// A 256-byte circular stack. All index arithmetic wraps modulo 256;
/// underflow and overflow are observable but are not faults.
pub struct Stack {
    pub dat: [u8; 0x100],
    pub ptr: u8,
}

impl Stack {
    // Operand slots count down from the top: peek(0) is T, peek(1) is N,
    // peek(2) is L, and so on.
    #[inline]
    pub fn peek(&self, slot: u8) -> u8 {
        self.dat[self.ptr.wrapping_sub(slot).wrapping_sub(1) as usize]
    }

    #[inline]
    pub fn peek2(&self, slot: u8) -> u16 {
        (self.peek(slot.wrapping_add(1)) as u16) << 8 | self.peek(slot) as u16
    }

    #[inline]
    pub fn poke(&mut self, slot: u8, value: u8) {
        self.dat[self.ptr.wrapping_sub(slot).wrapping_sub(1) as usize] = value;
    }

    #[inline]
    pub fn poke2(&mut self, slot: u8, value: u16) {
        self.poke(slot, value as u8);
        self.poke(slot.wrapping_add(1), (value >> 8) as u8);
    }

    #[inline]
    pub fn shift(&mut self, delta: i8) {
        self.ptr = self.ptr.wrapping_add(delta as u8);
    }
}

impl Default for Stack {
    fn default() -> Self {
        Stack { dat: [0; 0x100], ptr: 0 }
    }
}

// Extension memory beyond the primary 64 KiB, reachable only through the
// system DMA port. Pages are allocated on first touch through a two-level
// 256x256 index so a sparse ROM doesn't commit gigabytes up front.
struct BankRow {
    slots: [Option<Box<[u8]>>; 0x100],
}

struct BankTable {
    rows: [Option<Box<BankRow>>; 0x100],
}

impl Default for BankRow {
    fn default() -> Self {
        BankRow { slots: array::from_fn(|_| None) }
    }
}

impl Default for BankTable {
    fn default() -> Self {
        BankTable { rows: array::from_fn(|_| None) }
    }
}

/// The Uxn machine: 64 KiB of RAM, two stacks, the 256-byte device page
/// and the lazily allocated bank store.
pub struct Uxn {
    pub ram: Vec<u8>,
    pub dev: [u8; DEV_SIZE],
    pub wst: Stack,
    pub rst: Stack,
    pub initialized: bool,
    boot_rom: Vec<u8>,
    banks: Option<Box<BankTable>>,
}

impl Uxn {
    pub fn new() -> Self {
        Uxn {
            ram: vec![0; RAM_SIZE],
            dev: [0; DEV_SIZE],
            wst: Stack::default(),
            rst: Stack::default(),
            initialized: false,
            boot_rom: Vec::new(),
            banks: None,
        }
    }

    pub fn set_boot_rom(&mut self, rom: Vec<u8>) {
        self.boot_rom = rom;
    }

    pub fn init(&mut self) {
        self.reset(false);
        self.initialized = true;
    }

    /// Reload the boot ROM at 0x0100 (surplus spills into banks 1..n) and
    /// clear the stacks. A hard reset also wipes the zero page and the
    /// device page; a soft reset preserves both.
    pub fn reset(&mut self, soft: bool) {
        self.banks = None;
        if !soft {
            self.ram[..PAGE_PROGRAM as usize].fill(0);
            self.dev.fill(0);
        }
        let rom = std::mem::take(&mut self.boot_rom);
        let main = 0x10000 - PAGE_PROGRAM as usize;
        for i in 0..main {
            self.ram[PAGE_PROGRAM as usize + i] = rom.get(i).copied().unwrap_or(0);
        }
        let mut consumed = main;
        let mut bank_ix: u32 = 1;
        while consumed < rom.len() && bank_ix < 0x10000 {
            let bank = self.bank_mut(bank_ix as u16);
            for slot in bank.iter_mut().take(0x10000) {
                if consumed >= rom.len() {
                    break;
                }
                *slot = rom[consumed];
                consumed += 1;
            }
            bank_ix += 1;
        }
        self.boot_rom = rom;
        self.wst.ptr = 0;
        self.rst.ptr = 0;
    }

    /// Bank 0 aliases RAM; higher banks are allocated on first touch.
    pub fn bank_mut(&mut self, index: u16) -> &mut [u8] {
        if index == 0 {
            return &mut self.ram;
        }
        let table = self.banks.get_or_insert_with(Default::default);
        let row = table.rows[(index >> 8) as usize].get_or_insert_with(Default::default);
        row.slots[(index & 0xff) as usize]
            .get_or_insert_with(|| vec![0; BANK_SIZE].into_boxed_slice())
    }

    pub fn bank_allocated(&self, index: u16) -> bool {
        if index == 0 {
            return true;
        }
        self.banks
            .as_ref()
            .and_then(|t| t.rows[(index >> 8) as usize].as_ref())
            .is_some_and(|r| r.slots[(index & 0xff) as usize].is_some())
    }

    /// Big-endian 16-bit read; the guard byte makes 0xFFFF read as
    /// `ram[0xFFFF] << 8`.
    #[inline]
    pub fn peek2(&self, addr: u16) -> u16 {
        (self.ram[addr as usize] as u16) << 8 | self.ram[addr as usize + 1] as u16
    }

    #[inline]
    pub fn poke2(&mut self, addr: u16, value: u16) {
        self.ram[addr as usize] = (value >> 8) as u8;
        self.ram[addr as usize + 1] = value as u8;
    }

    #[inline]
    pub fn dev_peek2(&self, port: u8) -> u16 {
        (self.dev[port as usize] as u16) << 8 | self.dev[port as usize + 1] as u16
    }

    #[inline]
    pub fn dev_poke2(&mut self, port: u8, value: u16) {
        self.dev[port as usize] = (value >> 8) as u8;
        self.dev[port as usize + 1] = value as u8;
    }

    /// NUL-terminated string starting at `addr`, truncated at the top of RAM.
    pub fn string_in_ram(&self, addr: u16) -> &[u8] {
        let start = addr as usize;
        let mut end = start;
        while end <= 0xffff && self.ram[end] != 0 {
            end += 1;
        }
        &self.ram[start..end]
    }

    /// A RAM window of at most `len` bytes, clipped at the top of RAM.
    pub fn range_in_ram(&self, addr: u16, len: u16) -> &[u8] {
        let start = addr as usize;
        let end = (start + len as usize).min(0x10000);
        &self.ram[start..end]
    }

    pub fn range_in_ram_mut(&mut self, addr: u16, len: u16) -> &mut [u8] {
        let start = addr as usize;
        let end = (start + len as usize).min(0x10000);
        &mut self.ram[start..end]
    }

    /// System DMA: the command block at `dev[0x02..0x03]` describes a copy
    /// of `length` bytes between two banks, each address wrapping mod 64 KiB.
    /// Byte 0 of the block must be 0x01 and the block must fit in RAM.
    pub fn dma(&mut self) {
        let addr = self.dev_peek2(0x02);
        if self.ram[addr as usize] != 0x01 || addr as usize > 0x10000 - 10 {
            return;
        }
        let cmd = addr.wrapping_add(1);
        let length = self.peek2(cmd) as usize;
        let a_bank = self.peek2(cmd.wrapping_add(2));
        let a_addr = self.peek2(cmd.wrapping_add(4)) as usize;
        let b_bank = self.peek2(cmd.wrapping_add(6));
        let b_addr = self.peek2(cmd.wrapping_add(8)) as usize;
        if a_bank == b_bank {
            // In-place copy keeps the byte-at-a-time overlap semantics.
            let mem = self.bank_mut(a_bank);
            for i in 0..length {
                mem[(b_addr + i) & 0xffff] = mem[(a_addr + i) & 0xffff];
            }
        } else {
            let src = self.bank_mut(a_bank);
            let mut tmp = vec![0u8; length];
            for (i, b) in tmp.iter_mut().enumerate() {
                *b = src[(a_addr + i) & 0xffff];
            }
            let dst = self.bank_mut(b_bank);
            for (i, b) in tmp.iter().enumerate() {
                dst[(b_addr + i) & 0xffff] = *b;
            }
        }
    }

    /// Invoke the vector stored at `dev[port..port+1]`. A zero vector is a
    /// no-op and reports false.
    pub fn call_vec<D: Device>(&mut self, dev: &mut D, port: u8) -> bool {
        let addr = self.dev_peek2(port);
        if addr == 0 { false } else { self.eval(dev, addr) }
    }

    #[inline]
    fn st(&mut self, ret: bool) -> &mut Stack {
        if ret { &mut self.rst } else { &mut self.wst }
    }

    // Pointer adjustment shared by every stack opcode: `pop` operand bytes
    // were read, the net pointer change is `delta`. Keep mode leaves the
    // inputs in place, so the pointer moves by the full pop+delta.
    #[inline]
    fn set(&mut self, ret: bool, keep: bool, pop: i8, delta: i8) {
        let d = if keep { pop + delta } else { delta };
        self.st(ret).shift(d);
    }

    /// Run the fetch-decode loop from `pc` until BRK or a halt request at
    /// `dev[0x0F]`. Returns false only when called uninitialized or with a
    /// zero program counter.
    pub fn eval<D: Device>(&mut self, dev: &mut D, mut pc: u16) -> bool {
        if !self.initialized || pc == 0 || self.dev[0x0f] != 0 {
            return false;
        }
        loop {
            if self.dev[0x0f] != 0 {
                return true;
            }
            let ins = self.ram[pc as usize];
            pc = pc.wrapping_add(1);
            let keep = ins & 0x80 != 0;
            let ret = ins & 0x40 != 0;
            match ins & 0x3f {
                // Immediate group: BRK, the instant jumps and the literals.
                0x00 | 0x20 => match ins {
                    0x00 => return true,
                    0x20 => {
                        let t = self.st(ret).peek(0);
                        self.st(ret).shift(-1);
                        let rel = self.peek2(pc);
                        pc = pc.wrapping_add(2);
                        if t != 0 {
                            pc = pc.wrapping_add(rel);
                        }
                    }
                    0x40 => {
                        let rel = self.peek2(pc);
                        pc = pc.wrapping_add(2).wrapping_add(rel);
                    }
                    0x60 => {
                        self.st(ret).shift(2);
                        let rel = self.peek2(pc);
                        pc = pc.wrapping_add(2);
                        self.st(ret).poke2(0, pc);
                        pc = pc.wrapping_add(rel);
                    }
                    0x80 | 0xc0 => {
                        let b = self.ram[pc as usize];
                        pc = pc.wrapping_add(1);
                        self.st(ret).shift(1);
                        self.st(ret).poke(0, b);
                    }
                    0xa0 | 0xe0 => {
                        let hi = self.ram[pc as usize];
                        pc = pc.wrapping_add(1);
                        let lo = self.ram[pc as usize];
                        pc = pc.wrapping_add(1);
                        self.st(ret).shift(2);
                        self.st(ret).poke(1, hi);
                        self.st(ret).poke(0, lo);
                    }
                    _ => unreachable!(),
                },
                0x01 => {
                    let t = self.st(ret).peek(0);
                    self.set(ret, keep, 1, 0);
                    self.st(ret).poke(0, t.wrapping_add(1));
                }
                0x21 => {
                    let t = self.st(ret).peek2(0);
                    self.set(ret, keep, 2, 0);
                    self.st(ret).poke2(0, t.wrapping_add(1));
                }
                0x02 => self.set(ret, keep, 1, -1),
                0x22 => self.set(ret, keep, 2, -2),
                0x03 => {
                    let t = self.st(ret).peek(0);
                    self.set(ret, keep, 2, -1);
                    self.st(ret).poke(0, t);
                }
                0x23 => {
                    let t = self.st(ret).peek2(0);
                    self.set(ret, keep, 4, -2);
                    self.st(ret).poke2(0, t);
                }
                0x04 => {
                    let t = self.st(ret).peek(0);
                    let n = self.st(ret).peek(1);
                    self.set(ret, keep, 2, 0);
                    self.st(ret).poke(0, n);
                    self.st(ret).poke(1, t);
                }
                0x24 => {
                    let t = self.st(ret).peek2(0);
                    let n = self.st(ret).peek2(2);
                    self.set(ret, keep, 4, 0);
                    self.st(ret).poke2(0, n);
                    self.st(ret).poke2(2, t);
                }
                0x05 => {
                    let t = self.st(ret).peek(0);
                    let n = self.st(ret).peek(1);
                    let l = self.st(ret).peek(2);
                    self.set(ret, keep, 3, 0);
                    self.st(ret).poke(0, l);
                    self.st(ret).poke(1, t);
                    self.st(ret).poke(2, n);
                }
                0x25 => {
                    let t = self.st(ret).peek2(0);
                    let n = self.st(ret).peek2(2);
                    let l = self.st(ret).peek2(4);
                    self.set(ret, keep, 6, 0);
                    self.st(ret).poke2(0, l);
                    self.st(ret).poke2(2, t);
                    self.st(ret).poke2(4, n);
                }
                0x06 => {
                    let t = self.st(ret).peek(0);
                    self.set(ret, keep, 1, 1);
                    self.st(ret).poke(0, t);
                    self.st(ret).poke(1, t);
                }
                0x26 => {
                    let t = self.st(ret).peek2(0);
                    self.set(ret, keep, 2, 2);
                    self.st(ret).poke2(0, t);
                    self.st(ret).poke2(2, t);
                }
                0x07 => {
                    let t = self.st(ret).peek(0);
                    let n = self.st(ret).peek(1);
                    self.set(ret, keep, 2, 1);
                    self.st(ret).poke(0, n);
                    self.st(ret).poke(1, t);
                    self.st(ret).poke(2, n);
                }
                0x27 => {
                    let t = self.st(ret).peek2(0);
                    let n = self.st(ret).peek2(2);
                    self.set(ret, keep, 4, 2);
                    self.st(ret).poke2(0, n);
                    self.st(ret).poke2(2, t);
                    self.st(ret).poke2(4, n);
                }
                0x08 => {
                    let t = self.st(ret).peek(0);
                    let n = self.st(ret).peek(1);
                    self.set(ret, keep, 2, -1);
                    self.st(ret).poke(0, (n == t) as u8);
                }
                0x28 => {
                    let t = self.st(ret).peek2(0);
                    let n = self.st(ret).peek2(2);
                    self.set(ret, keep, 4, -3);
                    self.st(ret).poke(0, (n == t) as u8);
                }
                0x09 => {
                    let t = self.st(ret).peek(0);
                    let n = self.st(ret).peek(1);
                    self.set(ret, keep, 2, -1);
                    self.st(ret).poke(0, (n != t) as u8);
                }
                0x29 => {
                    let t = self.st(ret).peek2(0);
                    let n = self.st(ret).peek2(2);
                    self.set(ret, keep, 4, -3);
                    self.st(ret).poke(0, (n != t) as u8);
                }
                0x0a => {
                    let t = self.st(ret).peek(0);
                    let n = self.st(ret).peek(1);
                    self.set(ret, keep, 2, -1);
                    self.st(ret).poke(0, (n > t) as u8);
                }
                0x2a => {
                    let t = self.st(ret).peek2(0);
                    let n = self.st(ret).peek2(2);
                    self.set(ret, keep, 4, -3);
                    self.st(ret).poke(0, (n > t) as u8);
                }
                0x0b => {
                    let t = self.st(ret).peek(0);
                    let n = self.st(ret).peek(1);
                    self.set(ret, keep, 2, -1);
                    self.st(ret).poke(0, (n < t) as u8);
                }
                0x2b => {
                    let t = self.st(ret).peek2(0);
                    let n = self.st(ret).peek2(2);
                    self.set(ret, keep, 4, -3);
                    self.st(ret).poke(0, (n < t) as u8);
                }
                0x0c => {
                    let t = self.st(ret).peek(0);
                    self.set(ret, keep, 1, -1);
                    pc = pc.wrapping_add(t as i8 as u16);
                }
                0x2c => {
                    let t = self.st(ret).peek2(0);
                    self.set(ret, keep, 2, -2);
                    pc = t;
                }
                0x0d => {
                    let t = self.st(ret).peek(0);
                    let n = self.st(ret).peek(1);
                    self.set(ret, keep, 2, -2);
                    if n != 0 {
                        pc = pc.wrapping_add(t as i8 as u16);
                    }
                }
                0x2d => {
                    let t = self.st(ret).peek2(0);
                    let n = self.st(ret).peek(2);
                    self.set(ret, keep, 3, -3);
                    if n != 0 {
                        pc = t;
                    }
                }
                0x0e => {
                    let t = self.st(ret).peek(0);
                    self.set(ret, keep, 1, -1);
                    self.st(!ret).shift(2);
                    self.st(!ret).poke2(0, pc);
                    pc = pc.wrapping_add(t as i8 as u16);
                }
                0x2e => {
                    let t = self.st(ret).peek2(0);
                    self.set(ret, keep, 2, -2);
                    self.st(!ret).shift(2);
                    self.st(!ret).poke2(0, pc);
                    pc = t;
                }
                0x0f => {
                    let t = self.st(ret).peek(0);
                    self.set(ret, keep, 1, -1);
                    self.st(!ret).shift(1);
                    self.st(!ret).poke(0, t);
                }
                0x2f => {
                    let t = self.st(ret).peek2(0);
                    self.set(ret, keep, 2, -2);
                    self.st(!ret).shift(2);
                    self.st(!ret).poke2(0, t);
                }
                0x10 => {
                    let t = self.st(ret).peek(0);
                    self.set(ret, keep, 1, 0);
                    let b = self.ram[t as usize];
                    self.st(ret).poke(0, b);
                }
                0x30 => {
                    // The second byte wraps within the zero page.
                    let t = self.st(ret).peek(0);
                    self.set(ret, keep, 1, 1);
                    let hi = self.ram[t as usize];
                    let lo = self.ram[t.wrapping_add(1) as usize];
                    self.st(ret).poke(1, hi);
                    self.st(ret).poke(0, lo);
                }
                0x11 => {
                    let t = self.st(ret).peek(0);
                    let n = self.st(ret).peek(1);
                    self.set(ret, keep, 2, -2);
                    self.ram[t as usize] = n;
                }
                0x31 => {
                    let t = self.st(ret).peek(0);
                    let n = self.st(ret).peek2(1);
                    self.set(ret, keep, 3, -3);
                    self.ram[t as usize] = (n >> 8) as u8;
                    self.ram[t.wrapping_add(1) as usize] = n as u8;
                }
                0x12 => {
                    let t = self.st(ret).peek(0);
                    self.set(ret, keep, 1, 0);
                    let addr = pc.wrapping_add(t as i8 as u16);
                    let b = self.ram[addr as usize];
                    self.st(ret).poke(0, b);
                }
                0x32 => {
                    let t = self.st(ret).peek(0);
                    self.set(ret, keep, 1, 1);
                    let addr = pc.wrapping_add(t as i8 as u16);
                    let hi = self.ram[addr as usize];
                    let lo = self.ram[addr.wrapping_add(1) as usize];
                    self.st(ret).poke(1, hi);
                    self.st(ret).poke(0, lo);
                }
                0x13 => {
                    let t = self.st(ret).peek(0);
                    let n = self.st(ret).peek(1);
                    self.set(ret, keep, 2, -2);
                    let addr = pc.wrapping_add(t as i8 as u16);
                    self.ram[addr as usize] = n;
                }
                0x33 => {
                    let t = self.st(ret).peek(0);
                    let n = self.st(ret).peek2(1);
                    self.set(ret, keep, 3, -3);
                    let addr = pc.wrapping_add(t as i8 as u16);
                    self.ram[addr as usize] = (n >> 8) as u8;
                    self.ram[addr.wrapping_add(1) as usize] = n as u8;
                }
                0x14 => {
                    let t = self.st(ret).peek2(0);
                    self.set(ret, keep, 2, -1);
                    let b = self.ram[t as usize];
                    self.st(ret).poke(0, b);
                }
                0x34 => {
                    let t = self.st(ret).peek2(0);
                    self.set(ret, keep, 2, 0);
                    let hi = self.ram[t as usize];
                    let lo = self.ram[t.wrapping_add(1) as usize];
                    self.st(ret).poke(1, hi);
                    self.st(ret).poke(0, lo);
                }
                0x15 => {
                    let t = self.st(ret).peek2(0);
                    let n = self.st(ret).peek(2);
                    self.set(ret, keep, 3, -3);
                    self.ram[t as usize] = n;
                }
                0x35 => {
                    let t = self.st(ret).peek2(0);
                    let n = self.st(ret).peek2(2);
                    self.set(ret, keep, 4, -4);
                    self.ram[t as usize] = (n >> 8) as u8;
                    self.ram[t.wrapping_add(1) as usize] = n as u8;
                }
                0x16 => {
                    let t = self.st(ret).peek(0);
                    self.set(ret, keep, 1, 0);
                    dev.before_dei(self, t);
                    let b = self.dev[t as usize];
                    self.st(ret).poke(0, b);
                }
                0x36 => {
                    let t = self.st(ret).peek(0);
                    self.set(ret, keep, 1, 1);
                    dev.before_dei(self, t);
                    dev.before_dei(self, t.wrapping_add(1));
                    let hi = self.dev[t as usize];
                    let lo = self.dev[t as usize + 1];
                    self.st(ret).poke(1, hi);
                    self.st(ret).poke(0, lo);
                }
                0x17 => {
                    let t = self.st(ret).peek(0);
                    let n = self.st(ret).peek(1);
                    self.set(ret, keep, 2, -2);
                    self.dev[t as usize] = n;
                    dev.after_deo(self, t);
                }
                0x37 => {
                    let t = self.st(ret).peek(0);
                    let n = self.st(ret).peek(1);
                    let l = self.st(ret).peek(2);
                    self.set(ret, keep, 3, -3);
                    self.dev[t as usize] = l;
                    self.dev[t as usize + 1] = n;
                    dev.after_deo(self, t);
                    dev.after_deo(self, t.wrapping_add(1));
                }
                0x18 => {
                    let t = self.st(ret).peek(0);
                    let n = self.st(ret).peek(1);
                    self.set(ret, keep, 2, -1);
                    self.st(ret).poke(0, n.wrapping_add(t));
                }
                0x38 => {
                    let t = self.st(ret).peek2(0);
                    let n = self.st(ret).peek2(2);
                    self.set(ret, keep, 4, -2);
                    self.st(ret).poke2(0, n.wrapping_add(t));
                }
                0x19 => {
                    let t = self.st(ret).peek(0);
                    let n = self.st(ret).peek(1);
                    self.set(ret, keep, 2, -1);
                    self.st(ret).poke(0, n.wrapping_sub(t));
                }
                0x39 => {
                    let t = self.st(ret).peek2(0);
                    let n = self.st(ret).peek2(2);
                    self.set(ret, keep, 4, -2);
                    self.st(ret).poke2(0, n.wrapping_sub(t));
                }
                0x1a => {
                    let t = self.st(ret).peek(0);
                    let n = self.st(ret).peek(1);
                    self.set(ret, keep, 2, -1);
                    self.st(ret).poke(0, n.wrapping_mul(t));
                }
                0x3a => {
                    let t = self.st(ret).peek2(0);
                    let n = self.st(ret).peek2(2);
                    self.set(ret, keep, 4, -2);
                    self.st(ret).poke2(0, n.wrapping_mul(t));
                }
                0x1b => {
                    let t = self.st(ret).peek(0);
                    let n = self.st(ret).peek(1);
                    self.set(ret, keep, 2, -1);
                    self.st(ret).poke(0, if t == 0 { 0 } else { n / t });
                }
                0x3b => {
                    let t = self.st(ret).peek2(0);
                    let n = self.st(ret).peek2(2);
                    self.set(ret, keep, 4, -2);
                    self.st(ret).poke2(0, if t == 0 { 0 } else { n / t });
                }
                0x1c => {
                    let t = self.st(ret).peek(0);
                    let n = self.st(ret).peek(1);
                    self.set(ret, keep, 2, -1);
                    self.st(ret).poke(0, n & t);
                }
                0x3c => {
                    let t = self.st(ret).peek2(0);
                    let n = self.st(ret).peek2(2);
                    self.set(ret, keep, 4, -2);
                    self.st(ret).poke2(0, n & t);
                }
                0x1d => {
                    let t = self.st(ret).peek(0);
                    let n = self.st(ret).peek(1);
                    self.set(ret, keep, 2, -1);
                    self.st(ret).poke(0, n | t);
                }
                0x3d => {
                    let t = self.st(ret).peek2(0);
                    let n = self.st(ret).peek2(2);
                    self.set(ret, keep, 4, -2);
                    self.st(ret).poke2(0, n | t);
                }
                0x1e => {
                    let t = self.st(ret).peek(0);
                    let n = self.st(ret).peek(1);
                    self.set(ret, keep, 2, -1);
                    self.st(ret).poke(0, n ^ t);
                }
                0x3e => {
                    let t = self.st(ret).peek2(0);
                    let n = self.st(ret).peek2(2);
                    self.set(ret, keep, 4, -2);
                    self.st(ret).poke2(0, n ^ t);
                }
                0x1f => {
                    // Low nibble shifts right, high nibble shifts left.
                    let t = self.st(ret).peek(0);
                    let n = self.st(ret).peek(1);
                    self.set(ret, keep, 2, -1);
                    let v = ((n as u16) >> (t & 0xf)) << (t >> 4);
                    self.st(ret).poke(0, v as u8);
                }
                0x3f => {
                    let t = self.st(ret).peek(0);
                    let n = self.st(ret).peek2(1);
                    self.set(ret, keep, 3, -1);
                    let v = ((n as u32) >> (t & 0xf)) << (t >> 4);
                    self.st(ret).poke2(0, v as u16);
                }
                _ => unreachable!(),
            }
        }
    }
}

impl Default for Uxn {
    fn default() -> Self {
        Uxn::new()
    }
}
