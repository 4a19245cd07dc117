use std::fs::{self, File, OpenOptions, ReadDir};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::uxn::Uxn;

pub const UXN_PATH_MAX: usize = 4096;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum StatType {
    Unavailable,
    Directory,
    File,
    LargeFile,
}

#[derive(Clone, Debug)]
pub struct Stat {
    pub kind: StatType,
    pub size: u16,
    pub name: String,
}

impl Stat {
    /// Four literal patterns, one byte per output slot: `!` for unavailable,
    /// `-` for directories, `?` for oversized files, and the right-aligned
    /// lower-hex size for regular files.
    pub fn write(&self, out: &mut [u8]) {
        let len = out.len();
        for (i, b) in out.iter_mut().enumerate() {
            *b = match self.kind {
                StatType::Unavailable => b'!',
                StatType::Directory => b'-',
                StatType::LargeFile => b'?',
                StatType::File => {
                    let shift = (len - i - 1) * 4;
                    let nibble = if shift >= 16 { 0 } else { (self.size >> shift) & 0xf };
                    char::from_digit(nibble as u32, 16).unwrap_or('0') as u8
                }
            };
        }
    }
}

enum OpenFile {
    None,
    Reading(File),
    Listing(ReadDir),
    Writing(File),
}

#[derive(Clone, Copy, PartialEq)]
enum ReadState {
    NotReading,
    ReadingFile,
    ReadingDirectory,
}

/// File device: a single cursor (`open_filename`) with at most one open
/// handle, sandboxed under a root directory. All failures surface to the
/// VM as a zero in the 16-bit success port.
pub struct Filesystem {
    root: PathBuf,
    open_filename: String,
    open_file: OpenFile,
    read_state: ReadState,
    // Partially emitted directory entry, carried across read calls.
    dir_entry: Vec<u8>,
    dir_entry_start: usize,
}

impl Filesystem {
    pub fn new(root_path: PathBuf) -> Self {
        if !root_path.exists() {
            println!("[FILE] Warning: sandbox root {:?} does not exist. Creating it.", root_path);
            let _ = fs::create_dir_all(&root_path);
        }
        let canonical = fs::canonicalize(&root_path).unwrap_or(root_path);
        Self {
            root: canonical,
            open_filename: String::new(),
            open_file: OpenFile::None,
            read_state: ReadState::NotReading,
            dir_entry: Vec::new(),
            dir_entry_start: 0,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a POSIX-style relative path against the sandbox root,
    /// collapsing `.` and `..` segment-wise. A path that would climb above
    /// the root resolves to nothing.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let mut components: Vec<&str> = Vec::new();
        for part in name.split(['/', '\\']) {
            match part {
                "" | "." => {}
                ".." => {
                    components.pop()?;
                }
                p => components.push(p),
            }
        }
        let mut full = self.root.clone();
        for part in components {
            full.push(part);
        }
        if full.starts_with(&self.root) { Some(full) } else { None }
    }

    /// Read a whole file from inside the sandbox; used for the boot ROM.
    pub fn load(&self, filename: &str) -> Result<Vec<u8>, String> {
        let path = self
            .resolve(filename)
            .ok_or_else(|| format!("ROM path {:?} is not in sandbox {:?}", filename, self.root))?;
        fs::read(&path).map_err(|e| format!("ROM {:?} could not be read: {}", filename, e))
    }

    fn stat_path(&self, path: Option<PathBuf>, name: &str) -> Stat {
        let name = name.to_string();
        let Some(path) = path else {
            return Stat { kind: StatType::Unavailable, size: 0, name };
        };
        match fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => Stat { kind: StatType::Directory, size: 0, name },
            Ok(meta) if meta.is_file() => {
                if meta.len() > 0xffff {
                    Stat { kind: StatType::LargeFile, size: 0xffff, name }
                } else {
                    Stat { kind: StatType::File, size: meta.len() as u16, name }
                }
            }
            _ => Stat { kind: StatType::Unavailable, size: 0, name },
        }
    }

    pub fn stat(&self) -> Stat {
        self.stat_path(self.resolve(&self.open_filename), &self.open_filename)
    }

    /// Pull the next directory entry, opening the listing on first use.
    /// Entry names are relative to the sandbox root.
    fn list_dir(&mut self) -> Option<Stat> {
        if !matches!(self.open_file, OpenFile::Listing(_)) {
            let path = self.resolve(&self.open_filename)?;
            self.open_file = OpenFile::Listing(fs::read_dir(path).ok()?);
        }
        let OpenFile::Listing(dir) = &mut self.open_file else {
            return None;
        };
        let entry = dir.next()?.ok()?;
        let name = entry
            .path()
            .strip_prefix(&self.root)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| entry.file_name().to_string_lossy().into_owned());
        Some(self.stat_path(Some(entry.path()), &name))
    }

    fn read(&mut self, dest: &mut [u8]) -> u16 {
        if !matches!(self.open_file, OpenFile::Reading(_)) {
            let Some(path) = self.resolve(&self.open_filename) else {
                return 0;
            };
            match File::open(path) {
                Ok(f) => self.open_file = OpenFile::Reading(f),
                Err(_) => return 0,
            }
        }
        let OpenFile::Reading(f) = &mut self.open_file else {
            return 0;
        };
        f.read(dest).unwrap_or(0) as u16
    }

    fn write(&mut self, src: &[u8], append: bool) -> u16 {
        if !matches!(self.open_file, OpenFile::Writing(_)) {
            let Some(path) = self.resolve(&self.open_filename) else {
                return 0;
            };
            let mut options = OpenOptions::new();
            options.write(true).create(true);
            if append {
                options.append(true);
            } else {
                options.truncate(true);
            }
            match options.open(path) {
                Ok(f) => self.open_file = OpenFile::Writing(f),
                Err(_) => return 0,
            }
        }
        let OpenFile::Writing(f) = &mut self.open_file else {
            return 0;
        };
        f.write(src).unwrap_or(0) as u16
    }

    fn remove(&mut self) -> u16 {
        self.open_file = OpenFile::None;
        let Some(path) = self.resolve(&self.open_filename) else {
            return 0;
        };
        let removed = if path.is_dir() { fs::remove_dir(&path) } else { fs::remove_file(&path) };
        removed.is_ok() as u16
    }

    fn close(&mut self) {
        self.open_file = OpenFile::None;
    }

    fn reset_read(&mut self) {
        self.read_state = ReadState::NotReading;
        self.dir_entry.clear();
        self.dir_entry_start = 0;
    }

    fn write_dir_entry(&mut self, stat: &Stat) {
        self.dir_entry.clear();
        self.dir_entry_start = 0;
        let mut header = [0u8; 4];
        stat.write(&mut header);
        self.dir_entry.extend_from_slice(&header);
        self.dir_entry.push(b' ');
        let name = stat.name.as_bytes();
        self.dir_entry.extend_from_slice(&name[..name.len().min(UXN_PATH_MAX)]);
        self.dir_entry.push(b'\n');
    }

    pub fn after_deo(&mut self, uxn: &mut Uxn, port: u8) {
        match port {
            // stat: format the cursor's stat into RAM, publish the length
            0xa5 => {
                self.reset_read();
                let len = uxn.dev_peek2(0xaa);
                let addr = uxn.dev_peek2(0xa4);
                let stat = self.stat();
                stat.write(uxn.range_in_ram_mut(addr, len));
                uxn.dev_poke2(0xa2, len);
            }
            // remove
            0xa6 => {
                self.reset_read();
                let success = self.remove();
                uxn.dev_poke2(0xa2, success);
            }
            // name: reposition the cursor, closing whatever was open
            0xa9 => {
                self.close();
                self.reset_read();
                let addr = uxn.dev_peek2(0xa8);
                let name = uxn.string_in_ram(addr);
                let max = name.len().min(UXN_PATH_MAX);
                self.open_filename = String::from_utf8_lossy(&name[..max]).into_owned();
                uxn.dev_poke2(0xa2, 1);
            }
            // read: files stream bytes, directories stream formatted entries
            0xad => {
                if self.read_state == ReadState::NotReading {
                    match self.stat().kind {
                        StatType::Unavailable => {}
                        StatType::Directory => self.read_state = ReadState::ReadingDirectory,
                        _ => {
                            self.dir_entry.clear();
                            self.dir_entry_start = 0;
                            self.read_state = ReadState::ReadingFile;
                        }
                    }
                }
                let addr = uxn.dev_peek2(0xac);
                let len = uxn.dev_peek2(0xaa);
                let success = match self.read_state {
                    ReadState::NotReading => 0,
                    ReadState::ReadingFile => self.read(uxn.range_in_ram_mut(addr, len)),
                    ReadState::ReadingDirectory => {
                        let dest = uxn.range_in_ram_mut(addr, len);
                        let mut i = 0;
                        loop {
                            while self.dir_entry_start < self.dir_entry.len() && i < dest.len() {
                                dest[i] = self.dir_entry[self.dir_entry_start];
                                i += 1;
                                self.dir_entry_start += 1;
                            }
                            if i >= dest.len() {
                                break;
                            }
                            match self.list_dir() {
                                Some(entry) => self.write_dir_entry(&entry),
                                None => break,
                            }
                        }
                        i as u16
                    }
                };
                uxn.dev_poke2(0xa2, success);
            }
            // write: append when dev 0xA7 is nonzero, truncate otherwise
            0xaf => {
                self.reset_read();
                let addr = uxn.dev_peek2(0xae);
                let len = uxn.dev_peek2(0xaa);
                let append = uxn.dev[0xa7] != 0;
                let success = self.write(uxn.range_in_ram(addr, len), append);
                uxn.dev_poke2(0xa2, success);
            }
            _ => {}
        }
    }
}
