//! OS introspection boundary.
//!
//! Operations only see the plain data types defined here. [`SysinfoProbe`]
//! fills them from the host; tests substitute their own [`SystemProbe`].

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use sysinfo::{Disks, Networks, System};
use tracing::debug;

/// Interval between the two CPU samples a utilization figure is derived from.
pub const CPU_SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f32,
    pub memory_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStats {
    pub total: u64,
    pub available: u64,
    pub used: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiskUsage {
    pub mount_point: PathBuf,
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkTotals {
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemSnapshot {
    pub logical_cores: usize,
    pub physical_cores: Option<usize>,
    pub cpu_percent: f32,
    pub memory: MemoryStats,
    pub disks: Vec<DiskUsage>,
    pub network: NetworkTotals,
}

/// Source of process and resource data.
pub trait SystemProbe {
    /// Processes visible to the current user, in enumeration order.
    fn processes(&mut self) -> Vec<ProcessInfo>;

    /// CPU, memory, disk and network snapshot.
    fn snapshot(&mut self) -> SystemSnapshot;
}

/// Host adapter backed by the `sysinfo` crate.
pub struct SysinfoProbe {
    system: System,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemProbe for SysinfoProbe {
    fn processes(&mut self) -> Vec<ProcessInfo> {
        self.system.refresh_memory();
        self.system.refresh_processes();
        thread::sleep(CPU_SAMPLE_INTERVAL);
        self.system.refresh_processes();

        let total_memory = self.system.total_memory();
        self.system
            .processes()
            .values()
            .map(|process| ProcessInfo {
                pid: process.pid().as_u32(),
                name: process.name().to_string(),
                cpu_percent: process.cpu_usage(),
                memory_percent: crate::helpers::percent(process.memory(), total_memory),
            })
            .collect()
    }

    fn snapshot(&mut self) -> SystemSnapshot {
        self.system.refresh_cpu();
        thread::sleep(CPU_SAMPLE_INTERVAL);
        self.system.refresh_cpu();
        self.system.refresh_memory();

        let disks = Disks::new_with_refreshed_list();
        let disks = disks
            .list()
            .iter()
            .filter_map(|disk| {
                let total = disk.total_space();
                if total == 0 {
                    debug!(mount_point = %disk.mount_point().display(), "Skipping unreadable disk");
                    return None;
                }
                let free = disk.available_space();
                Some(DiskUsage {
                    mount_point: disk.mount_point().to_path_buf(),
                    total,
                    used: total.saturating_sub(free),
                    free,
                })
            })
            .collect();

        let networks = Networks::new_with_refreshed_list();
        let network = networks
            .list()
            .values()
            .fold(NetworkTotals::default(), |mut totals, data| {
                totals.bytes_sent += data.total_transmitted();
                totals.bytes_received += data.total_received();
                totals
            });

        SystemSnapshot {
            logical_cores: self.system.cpus().len(),
            physical_cores: self.system.physical_core_count(),
            cpu_percent: self.system.global_cpu_info().cpu_usage(),
            memory: MemoryStats {
                total: self.system.total_memory(),
                available: self.system.available_memory(),
                used: self.system.used_memory(),
            },
            disks,
            network,
        }
    }
}

/// Host family, which decides the ping utility's flags.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PlatformFamily {
    Windows,
    Posix,
}

impl PlatformFamily {
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }
}

/// Utility invoked by `ping`.
pub const PING_PROGRAM: &str = "ping";

/// Arguments to [`PING_PROGRAM`] for one echo request.
pub fn ping_args(host: &str, family: PlatformFamily) -> Vec<String> {
    let count_flag = match family {
        PlatformFamily::Windows => "-n",
        PlatformFamily::Posix => "-c",
    };
    vec![count_flag.to_string(), "1".to_string(), host.to_string()]
}
