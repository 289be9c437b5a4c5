use std::path::Path;
use sysinfo::{Pid, Process, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

/// Argv substrings that identify a java process as a Minecraft server or
/// loader launch. Lowercase; "forge" also covers NeoForge.
const SERVER_ARGV_TOKENS: [&str; 5] = ["server.jar", "forge", "fabric", "quilt", "minecraft"];

/// Best-effort kill of leftover java processes belonging to an install
/// directory.
///
/// Scans the process table for java processes tied to the directory and
/// kills them. Covers servers orphaned by a previous crash of the managing
/// application. Returns how many processes were signalled.
pub fn sweep_leftovers(install_dir: &Path) -> usize {
    let needle = install_dir.to_string_lossy().to_string();
    if needle.is_empty() {
        return 0;
    }
    let canonical = std::fs::canonicalize(install_dir)
        .unwrap_or_else(|_| install_dir.to_path_buf());

    let mut sys = System::new();
    sys.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::nothing()
            .with_cmd(UpdateKind::Always)
            .with_cwd(UpdateKind::Always),
    );

    let mut killed = 0;
    for process in sys.processes().values() {
        let name = process.name().to_string_lossy().to_lowercase();
        if !name.contains("java") {
            continue;
        }
        if is_leftover(process, &needle, &canonical) && process.kill() {
            tracing::warn!(pid = process.pid().as_u32(), "killed leftover server process");
            killed += 1;
        }
    }
    killed
}

/// Launch commands built by this crate use relative jar paths with the
/// working directory set to the install root, so their argv never carries
/// the directory itself. A process counts as a leftover when its argv names
/// the directory outright, or when it runs from the directory and its argv
/// mentions a managed server artifact.
fn is_leftover(process: &Process, needle: &str, canonical: &Path) -> bool {
    if process
        .cmd()
        .iter()
        .any(|arg| arg.to_string_lossy().contains(needle))
    {
        return true;
    }
    let runs_in_dir = process
        .cwd()
        .is_some_and(|cwd| cwd == canonical || cwd.to_string_lossy() == needle);
    runs_in_dir
        && process.cmd().iter().any(|arg| {
            let arg = arg.to_string_lossy().to_lowercase();
            SERVER_ARGV_TOKENS.iter().any(|token| arg.contains(token))
        })
}

/// Kill the process tree rooted at `root_pid`, descendants first, then the
/// root itself. Last rung of the stop escalation ladder.
pub(crate) fn kill_tree(root_pid: u32) -> usize {
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::All, true);

    let root = Pid::from_u32(root_pid);
    let mut descendants: Vec<Pid> = Vec::new();
    // Walk parent links; repeat until the frontier stops growing so
    // grandchildren found late still get included.
    loop {
        let before = descendants.len();
        for (pid, process) in sys.processes() {
            if descendants.contains(pid) || *pid == root {
                continue;
            }
            if let Some(parent) = process.parent() {
                if parent == root || descendants.contains(&parent) {
                    descendants.push(*pid);
                }
            }
        }
        if descendants.len() == before {
            break;
        }
    }

    let mut killed = 0;
    for pid in descendants.iter().rev() {
        if let Some(process) = sys.process(*pid) {
            if process.kill() {
                killed += 1;
            }
        }
    }
    if let Some(process) = sys.process(root) {
        if process.kill() {
            killed += 1;
        }
    }
    tracing::debug!(root = root_pid, killed, "process tree sweep complete");
    killed
}
