use std::path::PathBuf;

pub const DAEMON_NAME: &str = "focuswatch-daemon";

/// Path of the daemon binary installed next to the cli binary at `path`.
pub fn to_daemon_path(mut path: PathBuf) -> PathBuf {
    path.set_file_name(DAEMON_NAME);
    #[cfg(windows)]
    {
        path.set_extension("exe");
    }
    path
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::to_daemon_path;

    #[cfg(unix)]
    #[test]
    fn test_daemon_lives_next_to_cli() {
        assert_eq!(
            to_daemon_path(PathBuf::from("/usr/local/bin/focuswatch")),
            PathBuf::from("/usr/local/bin/focuswatch-daemon")
        );
    }
}
