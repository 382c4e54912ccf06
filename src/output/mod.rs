//! Output sinks for discovered target groups

pub mod file_sd;

#[cfg(test)]
mod file_sd_test;

pub use file_sd::{FileSdEntry, FileSdWriter};
