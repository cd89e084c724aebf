#![doc = include_str!("../README.md")]

mod error;
mod level;
#[cfg(windows)]
mod sid;
#[cfg(windows)]
mod token;

pub use error::Error;
pub use level::IntegrityLevel;
#[cfg(windows)]
pub use sid::{sid_to_string, Sid};
#[cfg(windows)]
pub use token::{current_process_integrity_level, Token};
