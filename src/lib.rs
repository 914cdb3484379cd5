// src/lib.rs

//! Paper notifier library
//!
//! Fetches new papers for configured topics from arXiv and RSS feeds and
//! announces each one to Slack exactly once.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;
