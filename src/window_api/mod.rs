//! Contains logic for finding out what the user is looking at.
//! [GenericWindowObserver] is the main artifact of this module that abstracts
//! the operations.

#[cfg(feature = "win")]
pub mod win;
#[cfg(feature = "x11")]
pub mod x11;

#[cfg(feature = "win")]
extern crate windows;

#[cfg(feature = "x11")]
extern crate xcb;

use std::{path::Path, sync::Arc};

use anyhow::Result;
#[cfg(test)]
use mockall::automock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveWindowData {
    /// Name of the window. For example 'bash in hello' or 'Document 1' or 'Vibing in YouTube -
    /// Chrome'
    pub window_title: Arc<str>,
    /// File name of the executable. For example 'chrome.exe' or 'nvim'
    pub process_name: Arc<str>,
}

/// Source of the currently focused window. Implementations report a failure as an error, the
/// caller treats it as "nothing is focused right now".
#[cfg_attr(test, automock)]
pub trait WindowObserver: Send {
    fn get_active_window_info(&mut self) -> Result<ActiveWindowData>;
}

/// Reduces a full executable path to the name rules are written against.
pub fn clean_process_name(value: &str) -> String {
    Path::new(value)
        .file_name()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_else(|| value.to_string())
}

/// Serves as a cross-compatible WindowObserver implementation.
pub struct GenericWindowObserver {
    inner: Box<dyn WindowObserver>,
}

impl GenericWindowObserver {
    pub fn new() -> Result<Self> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "win")] {
                use win::WindowsWindowObserver;
                Ok(Self {
                    inner: Box::new(WindowsWindowObserver::new()),
                })
            }
            else if #[cfg(feature = "x11")] {
                use x11::LinuxWindowObserver;
                Ok(Self {
                    inner: Box::new(LinuxWindowObserver::new()?),
                })
            }
            else {
                Err(anyhow::anyhow!(
                    "No window backend was enabled. Build with the `win` or `x11` feature"
                ))
            }
        }
    }
}

impl WindowObserver for GenericWindowObserver {
    fn get_active_window_info(&mut self) -> Result<ActiveWindowData> {
        self.inner.get_active_window_info()
    }
}

#[cfg(test)]
mod tests {
    use super::clean_process_name;

    #[test]
    fn test_clean_process_name() {
        assert_eq!(clean_process_name("/usr/bin/firefox"), "firefox");
        assert_eq!(clean_process_name("chrome.exe"), "chrome.exe");
    }
}
