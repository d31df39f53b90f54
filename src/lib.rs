//! Tracks which application has focus, classifies it as productive or not, turns the day into a
//! focus score and keeps a Pomodoro timer. Runs as a small daemon and is queried through a
//! terminal.
//!

pub mod cli;
pub mod config;
pub mod daemon;
pub mod listener;
pub mod notify;
pub mod pomodoro;
pub mod scoring;
pub mod storage;
pub mod tracking;
pub mod utils;
pub mod window_api;
