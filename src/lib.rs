//! locswitch Library
//!
//! Command-line front end for switching the location-spoofed device at
//! runtime. The switching logic itself lives in `locswitch-app`.

pub mod headless;

// Re-export main entry points
pub use headless::runner::{run, Runner};
pub use headless::OutputFormat;
