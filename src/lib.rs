//! blogsync: push Hugo posts to DEV.
//!
//! The decision logic lives in `blogsync-core`. This crate is the glue: the
//! command line, the YAML config, the DEV HTTP client and the terminal report.

pub mod cli;
pub mod devto;
pub mod load_config;
pub mod report;
