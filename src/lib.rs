//! # Claude Costbar
//!
//! A small status monitor that polls `ccusage` for the active 5-hour billing
//! block and keeps a compact cost label plus a dropdown of details current.
//!
//! ## Overview
//!
//! Each refresh runs `ccusage blocks --live --json --active`, picks the
//! active block and renders:
//! - a compact title (`🦉 $15.58`)
//! - eight detail lines: session timing, cost, burn rate, tokens, projection
//!   and API calls, in English or Japanese
//!
//! Failures of `ccusage` degrade the display to an error frame; the next tick
//! simply tries again.
//!
//! ## Features
//!
//! - `colors` (default): Enables terminal color output via owo-colors

/// Command-line argument parsing and configuration
pub mod cli;

/// Presentation: titles, detail lines and display sinks
pub mod display;

/// English/Japanese selection
pub mod locale;

/// ccusage block report models
pub mod models;

/// Periodic fetch-and-render loop
pub mod refresh;

/// ccusage invocation and parsing
pub mod usage;

/// Number and currency formatting
pub mod utils;

/// Active block selection, burn rate and remaining time
pub mod window;
