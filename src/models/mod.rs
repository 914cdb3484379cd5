// src/models/mod.rs

//! Domain models for the notifier.

mod config;
mod paper;
mod topic;

pub use config::{ArxivConfig, Config, HttpConfig, PathsConfig, RssConfig, SlackConfig};
pub use paper::{Paper, UNKNOWN_DATE};
pub use topic::{SourceKind, SourceSpec, Topic, Topics};
