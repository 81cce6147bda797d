use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Resident memory of the current process in whole MiB, or `0` when it cannot be read.
pub fn memory_mb() -> u64 {
    resident_bytes().map_or(0, |bytes| bytes / BYTES_PER_MB)
}

fn resident_bytes() -> Option<u64> {
    let pid = match sysinfo::get_current_pid() {
        Ok(pid) => pid,
        Err(err) => {
            tracing::debug!(error = err, "current pid unavailable");
            return None;
        }
    };

    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        false,
        ProcessRefreshKind::nothing().with_memory(),
    );

    let bytes = system.process(pid).map(|process| process.memory());
    if bytes.is_none() {
        tracing::debug!(%pid, "process memory unavailable");
    }
    bytes
}
