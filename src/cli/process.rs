use std::{
    env,
    path::{Path, PathBuf},
    process::Stdio,
};

use anyhow::{anyhow, Result};
use sysinfo::{get_current_pid, Signal, System};
use tracing::info;

use super::daemon_path::to_daemon_path;

pub fn daemon_executable() -> Result<PathBuf> {
    Ok(to_daemon_path(env::current_exe()?))
}

/// Terminates every process started from the executable at `name`. Returns how many were found.
pub fn kill_previous_servers(name: &Path) -> Result<usize> {
    let system = System::new_all();
    let current_id = get_current_pid().map_err(|e| anyhow!("Can't find own process id {e}"))?;
    let mut killed = 0;
    for (pid, process) in system.processes().iter() {
        if *pid == current_id {
            continue;
        }

        if process
            .exe()
            .filter(|v| v.exists())
            .filter(|v| name == *v)
            .is_some()
        {
            info!("Stopping daemon {pid}");
            // SIGTERM lets the daemon flush the open session. On Windows this forcefully
            // terminates the process.
            if process.kill_with(Signal::Term).is_none() {
                process.kill();
            }
            process.wait();
            killed += 1;
        }
    }
    Ok(killed)
}

/// Stops running daemons and spawns a new one for `app_dir`. The daemon detaches itself, so this
/// only waits for the launcher to exit.
pub fn restart_server(app_dir: &Path) -> Result<()> {
    let daemon = daemon_executable()?;
    kill_previous_servers(&daemon)?;

    // The daemon changes its working directory when it detaches.
    let app_dir = std::path::absolute(app_dir)?;
    let mut command = std::process::Command::new(&daemon);
    command.arg("--dir").arg(&app_dir);
    command.stdin(Stdio::null());
    command.stdout(Stdio::null());

    info!("Spawning {daemon:?}");
    let status = command
        .status()
        .map_err(|e| anyhow!("Failed to start {daemon:?}: {e}"))?;
    if !status.success() {
        return Err(anyhow!("Daemon launcher exited with {status}"));
    }
    Ok(())
}
