use std::path::PathBuf;

use ruxn::uxn::PAGE_PROGRAM;
use ruxn::varvara::Varvara;

/// A headless machine rooted in the temp directory, initialized with an
/// empty boot ROM.
#[allow(dead_code)]
pub fn test_vm() -> Varvara {
    let mut vm = Varvara::new(std::env::temp_dir(), 512, 320);
    vm.init_with_rom(Vec::new());
    vm
}

/// A headless machine with its own scratch sandbox directory.
#[allow(dead_code)]
pub fn sandbox_vm(name: &str) -> (Varvara, PathBuf) {
    let dir = std::env::temp_dir().join(format!("ruxn-test-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let mut vm = Varvara::new(dir.clone(), 512, 320);
    vm.init_with_rom(Vec::new());
    (vm, dir)
}

/// Write `code` at the program page and run it to completion.
#[allow(dead_code)]
pub fn run_rom(vm: &mut Varvara, code: &[u8]) -> bool {
    for (i, &b) in code.iter().enumerate() {
        vm.uxn.ram[PAGE_PROGRAM as usize + i] = b;
    }
    vm.uxn.eval(&mut vm.bus, PAGE_PROGRAM)
}
