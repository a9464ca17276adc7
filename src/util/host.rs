//! Facts about the configuring host.

use sysinfo::{System, SystemExt};

/// Memory budget of a single link job, in bytes.
///
/// Linking one of the larger binaries peaks at roughly this much resident
/// memory; more concurrent links than `total / budget` starts swapping.
pub const LINK_MEMORY_BUDGET: f64 = 7e9;

/// Total physical memory of the host, in bytes.
pub fn total_memory() -> u64 {
    let mut sys = System::new();
    sys.refresh_memory();
    sys.total_memory()
}

/// Depth of the link pool for a host with `total_memory` bytes of RAM.
///
/// Never less than one, whatever the reported memory.
pub fn link_pool_depth(total_memory: i64) -> u32 {
    let depth = (total_memory as f64 / LINK_MEMORY_BUDGET).floor();
    if depth >= 1.0 {
        depth.min(u32::MAX as f64) as u32
    } else {
        1
    }
}

/// Default `-march` value for the host architecture.
pub fn default_target_arch() -> String {
    target_arch_for(std::env::consts::ARCH)
}

fn target_arch_for(arch: &str) -> String {
    match arch {
        "x86" | "x86_64" | "i386" | "i686" => "nehalem".to_string(),
        _ => String::new(),
    }
}
