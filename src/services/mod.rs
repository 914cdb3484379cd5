//! Service layer for the notifier.
//!
//! This module contains the upstream and downstream clients:
//! - arXiv query API (`ArxivFetcher`)
//! - RSS/Atom feeds (`RssFetcher`)
//! - Slack messaging (`SlackClient`, behind `ChatSink`)

pub mod arxiv;
pub mod rss;
pub mod slack;

pub use arxiv::ArxivFetcher;
pub use rss::RssFetcher;
pub use slack::{ChatSink, Delivery, SlackClient};
