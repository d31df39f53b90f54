// This runs daemon on windows without creating a console. Disable during development to see
// stdout.
#![windows_subsystem = "windows"]

use std::env::args;

use anyhow::Result;
use clap::Parser;
use focuswatch::{
    daemon::{args::DaemonArgs, start_daemon},
    utils::{
        dir::create_application_default_path,
        logging::{enable_logging, DAEMON_PREFIX},
        runtime::single_thread_runtime,
    },
};

fn main() -> Result<()> {
    let command_args = args().collect::<Vec<_>>();
    let args = DaemonArgs::parse_from(&command_args);

    if !args.force && detach(command_args)? {
        println!("Created daemon");
        return Ok(());
    }

    run(args)
}

/// Moves the daemon into the background. Returns `true` in the launching process, which should
/// exit right away, and `false` where the daemon should keep running.
#[allow(unused_variables)]
fn detach(command_args: Vec<String>) -> Result<bool> {
    cfg_if::cfg_if! {
        if #[cfg(feature = "win")] {
            use std::{os::windows::process::CommandExt, process::Stdio};
            use windows::Win32::System::Threading::DETACHED_PROCESS;

            // Windows has no fork, the daemon is started again as a detached process.
            let mut command = std::process::Command::new(std::env::current_exe()?);
            command
                .args(command_args.into_iter().skip(1))
                .arg("--force")
                .creation_flags(DETACHED_PROCESS.0)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null());
            #[allow(clippy::zombie_processes)]
            command.spawn()?;
            Ok(true)
        } else if #[cfg(unix)] {
            use daemonize::{Daemonize, Outcome, Stdio};

            let outcome = Daemonize::new()
                .stdout(Stdio::devnull())
                .stderr(Stdio::devnull())
                // stdin is redirected to /dev/null by default in daemonize 0.5 (no setter exists)
                .execute();
            match outcome {
                Outcome::Parent(parent) => {
                    parent?;
                    Ok(true)
                }
                Outcome::Child(child) => {
                    child?;
                    Ok(false)
                }
            }
        } else {
            Ok(false)
        }
    }
}

fn run(args: DaemonArgs) -> Result<()> {
    let app_dir = args.dir.map_or_else(create_application_default_path, Ok)?;
    enable_logging(DAEMON_PREFIX, &app_dir, args.log, args.log_console)?;
    single_thread_runtime()?.block_on(async move {
        start_daemon(app_dir)
            .await
            .inspect_err(|e| tracing::error!("Daemon stopped with an error {e:?}"))
    })
}
