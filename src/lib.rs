//! Core library for the spread-scanner project.
//!
//! Streams MEXC top-of-book, polls DEX quotes for the same pairs and
//! publishes gross and net spreads between the two venues whenever either
//! side moves. The binary (`main.rs`) is a thin consumer of [`scanner`].

pub mod cex;
pub mod config;
pub mod dex;
pub mod errors;
pub mod events;
pub mod models;
pub mod scanner;
pub mod spread;
pub mod store;
pub mod utils;

pub use events::ScannerEvent;
pub use scanner::SpreadScanner;
