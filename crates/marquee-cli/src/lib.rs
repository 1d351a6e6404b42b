//! Marquee CLI - command line parsing and settings resolution.

pub mod config;

pub use config::{Command, Config, Settings};
