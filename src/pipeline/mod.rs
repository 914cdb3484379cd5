//! Pipeline entry points.
//!
//! - `run`: fetch every topic's sources and announce new papers
//! - `Notifier`: post a batch of papers and persist what was posted

pub mod notify;
pub mod run;

pub use notify::{Notifier, NotifyOptions, NotifyOutcome, NotifyStats, TokenSource};
pub use run::{RunSummary, gather_papers, run};
