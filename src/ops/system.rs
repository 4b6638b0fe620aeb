//! OS, process and network operations: ps, ping, sysinfo.

use std::io;
use std::process::Command;

use tracing::{debug, info};

use crate::errors::{CoreError, Result};
use crate::helpers::{percent, to_gigabytes, to_megabytes};
use crate::models::{CommandKind, CommandOutput};
use crate::platform::{ping_args, PlatformFamily, SystemProbe, PING_PROGRAM};

/// Lists processes with PID, name, CPU and memory share.
pub fn ps(probe: &mut dyn SystemProbe) -> Result<CommandOutput> {
    let processes = probe.processes();
    let mut lines = Vec::with_capacity(processes.len() + 1);
    lines.push(format!("{:>8}  {:<32} {:>7} {:>7}", "PID", "NAME", "CPU%", "MEM%"));
    for process in &processes {
        lines.push(format!(
            "{:>8}  {:<32} {:>7.1} {:>7.1}",
            process.pid, process.name, process.cpu_percent, process.memory_percent
        ));
    }
    debug!(count = processes.len(), "Processes listed");
    Ok(CommandOutput::success(CommandKind::Processes, lines))
}

/// Runs `program` with `args` and captures its standard output.
///
/// A missing executable is reported as [`CoreError::ToolNotFound`]; a non-zero
/// exit carries the utility's own error text.
pub fn run_captured(program: &str, args: &[String]) -> Result<String> {
    let executable =
        which::which(program).map_err(|_| CoreError::ToolNotFound(program.to_string()))?;

    debug!(program = %executable.display(), ?args, "Spawning");
    let output = Command::new(&executable)
        .args(args)
        .output()
        .map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => CoreError::ToolNotFound(program.to_string()),
            _ => CoreError::io(&executable, err),
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = if stderr.trim().is_empty() {
            stdout.trim()
        } else {
            stderr.trim()
        };
        let code = output
            .status
            .code()
            .map(|code| code.to_string())
            .unwrap_or_else(|| "signal".to_string());
        return Err(CoreError::tool_failed(
            program,
            format!("exit status {code}: {detail}"),
        ));
    }
    Ok(stdout)
}

/// Sends a single echo request and relays the utility's output verbatim.
pub fn ping(host: &str, family: PlatformFamily) -> Result<CommandOutput> {
    let stdout = run_captured(PING_PROGRAM, &ping_args(host, family))?;
    info!(host, "Ping completed");
    Ok(CommandOutput::success(
        CommandKind::Ping,
        stdout.lines().map(str::to_string).collect::<Vec<_>>(),
    ))
}

/// Prints CPU, memory, disk and network figures from one snapshot.
pub fn sysinfo(probe: &mut dyn SystemProbe) -> Result<CommandOutput> {
    let snapshot = probe.snapshot();
    let physical = snapshot
        .physical_cores
        .map(|count| count.to_string())
        .unwrap_or_else(|| crate::helpers::UNAVAILABLE.to_string());
    let memory = &snapshot.memory;

    let mut lines = vec![
        format!(
            "CPU cores: {} logical, {} physical",
            snapshot.logical_cores, physical
        ),
        format!("CPU usage: {:.1}%", snapshot.cpu_percent),
        format!(
            "Memory: total {:.2} GB, available {:.2} GB, used {:.2} GB ({:.1}%)",
            to_gigabytes(memory.total),
            to_gigabytes(memory.available),
            to_gigabytes(memory.used),
            percent(memory.used, memory.total)
        ),
        "Disks:".to_string(),
    ];
    for disk in &snapshot.disks {
        lines.push(format!(
            "  {}: total {:.2} GB, used {:.2} GB, free {:.2} GB ({:.1}%)",
            disk.mount_point.display(),
            to_gigabytes(disk.total),
            to_gigabytes(disk.used),
            to_gigabytes(disk.free),
            percent(disk.used, disk.total)
        ));
    }
    lines.push(format!(
        "Network: sent {:.2} MB, received {:.2} MB",
        to_megabytes(snapshot.network.bytes_sent),
        to_megabytes(snapshot.network.bytes_received)
    ));
    Ok(CommandOutput::success(CommandKind::SysInfo, lines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{DiskUsage, MemoryStats, NetworkTotals, ProcessInfo, SystemSnapshot};
    use std::path::PathBuf;

    const GIB: u64 = 1024 * 1024 * 1024;

    struct FakeProbe;

    impl SystemProbe for FakeProbe {
        fn processes(&mut self) -> Vec<ProcessInfo> {
            vec![
                ProcessInfo {
                    pid: 42,
                    name: "init".to_string(),
                    cpu_percent: 1.5,
                    memory_percent: 0.25,
                },
                ProcessInfo {
                    pid: 7,
                    name: "worker".to_string(),
                    cpu_percent: 0.0,
                    memory_percent: 10.0,
                },
            ]
        }

        fn snapshot(&mut self) -> SystemSnapshot {
            SystemSnapshot {
                logical_cores: 8,
                physical_cores: None,
                cpu_percent: 12.5,
                memory: MemoryStats {
                    total: 16 * GIB,
                    available: 12 * GIB,
                    used: 4 * GIB,
                },
                disks: vec![DiskUsage {
                    mount_point: PathBuf::from("/"),
                    total: 100 * GIB,
                    used: 25 * GIB,
                    free: 75 * GIB,
                }],
                network: NetworkTotals {
                    bytes_sent: 3 * 1024 * 1024,
                    bytes_received: 1024 * 1024 / 2,
                },
            }
        }
    }

    #[test]
    fn test_ps_keeps_enumeration_order() {
        let output = ps(&mut FakeProbe).unwrap();
        assert_eq!(output.stdout.len(), 3);
        assert!(output.stdout[0].contains("PID"));
        assert!(output.stdout[1].trim_start().starts_with("42"));
        assert!(output.stdout[1].contains("init"));
        assert!(output.stdout[2].trim_start().starts_with("7"));
    }

    #[test]
    fn test_sysinfo_formats_snapshot() {
        let output = sysinfo(&mut FakeProbe).unwrap();
        assert_eq!(output.stdout[0], "CPU cores: 8 logical, unavailable physical");
        assert_eq!(output.stdout[1], "CPU usage: 12.5%");
        assert_eq!(
            output.stdout[2],
            "Memory: total 16.00 GB, available 12.00 GB, used 4.00 GB (25.0%)"
        );
        assert_eq!(output.stdout[3], "Disks:");
        assert_eq!(
            output.stdout[4],
            "  /: total 100.00 GB, used 25.00 GB, free 75.00 GB (25.0%)"
        );
        assert_eq!(output.stdout[5], "Network: sent 3.00 MB, received 0.50 MB");
    }

    #[test]
    fn test_missing_utility_is_reported_distinctly() {
        assert!(matches!(
            run_captured("definitely-not-a-real-utility-xyz", &[]).unwrap_err(),
            CoreError::ToolNotFound(_)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_utility_carries_its_error_text() {
        let args = vec!["-c".to_string(), "echo broken >&2; exit 3".to_string()];
        match run_captured("sh", &args).unwrap_err() {
            CoreError::ToolFailed { program, message } => {
                assert_eq!(program, "sh");
                assert!(message.contains("exit status 3"));
                assert!(message.contains("broken"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_utility_output_is_captured() {
        let args = vec!["-c".to_string(), "echo hi".to_string()];
        assert_eq!(run_captured("sh", &args).unwrap(), "hi\n");
    }
}
