//! `tms-core` — configuration and error types shared by the TMS crates.

pub mod config;
pub mod error;

pub use config::TmsConfig;
pub use error::{Result, TmsError};
