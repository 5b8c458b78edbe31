//! Memory Ceiling Discovery
//!
//! Determines how much memory the process may use so the store budget can be
//! kept below it. Reads Linux cgroup and procfs files.
//!
//! # Sources (first hit wins)
//!
//! 1. cgroup v2: `/sys/fs/cgroup/memory.max`
//! 2. cgroup v1: `/sys/fs/cgroup/memory/memory.limit_in_bytes`
//! 3. Host total: `/proc/meminfo` `MemTotal`
//!
//! A cgroup that reports no limit (`max`, or a v1 value at least as large as
//! host memory) falls through to the host total.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Source of the process memory ceiling
pub trait MemoryCeiling: Send + Sync {
    /// Memory ceiling in bytes, or `None` if it cannot be determined
    fn memory_limit_bytes(&self) -> Option<u64>;
}

/// Fixed ceiling, used for explicit overrides and tests
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedMemoryCeiling(pub Option<u64>);

impl MemoryCeiling for FixedMemoryCeiling {
    fn memory_limit_bytes(&self) -> Option<u64> {
        self.0
    }
}

/// Ceiling read from cgroup and procfs files
#[derive(Debug, Clone)]
pub struct SystemMemoryCeiling {
    cgroup_root: PathBuf,
    proc_root: PathBuf,
}

impl Default for SystemMemoryCeiling {
    fn default() -> Self {
        Self::new("/sys/fs/cgroup", "/proc")
    }
}

impl SystemMemoryCeiling {
    /// Read from custom cgroup and procfs roots
    pub fn new(cgroup_root: impl Into<PathBuf>, proc_root: impl Into<PathBuf>) -> Self {
        Self {
            cgroup_root: cgroup_root.into(),
            proc_root: proc_root.into(),
        }
    }

    fn read(path: &Path) -> Option<String> {
        match fs::read_to_string(path) {
            Ok(contents) => Some(contents),
            Err(e) => {
                debug!("Cannot read {}: {}", path.display(), e);
                None
            }
        }
    }

    fn host_total(&self) -> Option<u64> {
        Self::read(&self.proc_root.join("meminfo")).and_then(|s| parse_meminfo_total(&s))
    }
}

impl MemoryCeiling for SystemMemoryCeiling {
    fn memory_limit_bytes(&self) -> Option<u64> {
        let host_total = self.host_total();

        if let Some(contents) = Self::read(&self.cgroup_root.join("memory.max")) {
            if let Some(limit) = parse_cgroup_v2_max(&contents) {
                debug!("Using cgroup v2 memory limit: {} bytes", limit);
                return Some(limit);
            }
        }

        let v1_path = self.cgroup_root.join("memory/memory.limit_in_bytes");
        if let Some(contents) = Self::read(&v1_path) {
            if let Some(limit) = parse_cgroup_v1_limit(&contents, host_total) {
                debug!("Using cgroup v1 memory limit: {} bytes", limit);
                return Some(limit);
            }
        }

        if let Some(total) = host_total {
            debug!("Using host memory total: {} bytes", total);
        }
        host_total
    }
}

/// Parse cgroup v2 `memory.max`; `max` means no limit
pub fn parse_cgroup_v2_max(contents: &str) -> Option<u64> {
    match contents.trim() {
        "max" => None,
        value => value.parse().ok(),
    }
}

/// Parse cgroup v1 `memory.limit_in_bytes`.
///
/// Unlimited groups report a page-aligned `i64::MAX`; anything at or above the
/// host total is treated as no limit.
pub fn parse_cgroup_v1_limit(contents: &str, host_total: Option<u64>) -> Option<u64> {
    let value: u64 = contents.trim().parse().ok()?;
    let unlimited_floor = host_total.unwrap_or(i64::MAX as u64 & !0xfff);
    if value >= unlimited_floor {
        None
    } else {
        Some(value)
    }
}

/// Parse `MemTotal` from `/proc/meminfo` into bytes
pub fn parse_meminfo_total(contents: &str) -> Option<u64> {
    contents.lines().find_map(|line| {
        let rest = line.strip_prefix("MemTotal:")?;
        let mut parts = rest.split_whitespace();
        let value: u64 = parts.next()?.parse().ok()?;
        match parts.next() {
            Some("kB") | Some("KB") => value.checked_mul(1024),
            None => Some(value),
            Some(_) => None,
        }
    })
}

// =============================================================================
// Tests
// =============================================================================
