//! cloudmap-sd: Prometheus target discovery for AWS Cloud Map
//!
//! This crate periodically walks the namespaces and services registered in
//! AWS Cloud Map, turns their instances into Prometheus target groups, and
//! keeps a file_sd JSON file up to date. Sources that disappear from the
//! registry are removed, while sources whose lookup merely failed are kept.

pub mod config;
pub mod discovery;
pub mod error;
pub mod output;
pub mod registry;

pub use crate::error::{Error, Result};
