// src/pipeline/run.rs

//! Topic-by-topic run: fetch every source, then announce.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Config, Paper, SourceKind, Topic, Topics};
use crate::pipeline::notify::{Notifier, NotifyOutcome};
use crate::services::{ArxivFetcher, RssFetcher};
use crate::utils::http::HttpGet;

/// Counters for a whole run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub topics: usize,
    pub topics_notified: usize,
    pub fetched: usize,
    pub posted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub unknown_sources: usize,
    /// True if any batch found no token
    pub posting_disabled: bool,
}

impl RunSummary {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            topics: 0,
            topics_notified: 0,
            fetched: 0,
            posted: 0,
            skipped: 0,
            failed: 0,
            unknown_sources: 0,
            posting_disabled: false,
        }
    }

    fn record(&mut self, outcome: NotifyOutcome) {
        self.topics_notified += 1;
        match outcome {
            NotifyOutcome::Disabled => self.posting_disabled = true,
            NotifyOutcome::Delivered(stats) => {
                self.posted += stats.posted;
                self.skipped += stats.skipped;
                self.failed += stats.failed;
            }
        }
    }

    pub fn elapsed_secs(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    /// Write the summary to the log.
    pub fn log(&self) {
        log::info!(
            "Run finished in {}s: {} topics ({} notified), {} papers fetched",
            self.elapsed_secs(),
            self.topics,
            self.topics_notified,
            self.fetched
        );
        log::info!(
            "Posted {}, already posted {}, failed {}, unknown sources {}",
            self.posted,
            self.skipped,
            self.failed,
            self.unknown_sources
        );
        if self.posting_disabled {
            log::info!("Nothing was posted: posting was disabled");
        }
    }
}

/// Papers gathered for one topic across its sources.
#[derive(Debug, Default)]
pub struct Harvest {
    pub papers: Vec<Paper>,
    pub unknown_sources: usize,
}

/// Fetch every source of `topic` in order and concatenate the results.
///
/// Unknown source types are logged and skipped. Fetch errors are returned
/// as-is.
pub async fn gather_papers(config: &Config, http: &dyn HttpGet, topic: &Topic) -> Result<Harvest> {
    let arxiv = ArxivFetcher::new(http, &config.arxiv);
    let rss = RssFetcher::new(http, &config.rss);
    let authors = topic.author_filter();

    let mut harvest = Harvest::default();
    for source in &topic.sources {
        match source.resolve()? {
            SourceKind::Arxiv => {
                let papers = arxiv.fetch(&topic.keywords, authors).await?;
                harvest.papers.extend(papers);
            }
            SourceKind::Rss { url } => {
                let papers = rss.fetch(url, &topic.keywords, authors).await?;
                harvest.papers.extend(papers);
            }
            SourceKind::Unknown(kind) => {
                log::warn!("Unknown source type: {}", kind);
                harvest.unknown_sources += 1;
            }
        }
    }
    Ok(harvest)
}

/// Process every topic in order.
///
/// The posted set is loaded once and shared by all topics. A fetch error
/// aborts the run; topics already notified keep their saved state.
pub async fn run(
    config: &Config,
    topics: &Topics,
    http: &dyn HttpGet,
    notifier: &Notifier<'_>,
) -> Result<RunSummary> {
    let mut summary = RunSummary::new();
    let mut posted = notifier.load_posted().await?;
    log::info!("{} papers already posted", posted.len());
    if !notifier.can_post() {
        log::warn!("Missing Slack bot token, posting disabled for this run");
    }

    for (name, topic) in topics.iter() {
        log::info!("Fetching papers for topic: {}", name);
        summary.topics += 1;

        let harvest = gather_papers(config, http, topic).await?;
        summary.fetched += harvest.papers.len();
        summary.unknown_sources += harvest.unknown_sources;

        if harvest.papers.is_empty() {
            log::info!("No papers for topic {}", name);
            continue;
        }

        let outcome = notifier
            .notify(&topic.slack_channel, &harvest.papers, &mut posted)
            .await?;
        summary.record(outcome);
    }

    summary.finished_at = Utc::now();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::notify::{NotifyOptions, TokenSource};
    use crate::storage::{LocalStorage, PostedIdStore};
    use crate::testing::{
        ARXIV_ATOM, RSS_FEED, RecordingSink, SinkMode, StubHttp, rss_item, rss_with_items,
    };
    use tempfile::TempDir;

    const FEED_URL: &str = "https://blog.example/feed.xml";

    fn ml_topics(extra_sources: &str) -> Topics {
        Topics::from_json(&format!(
            r#"{{"ml": {{
                "keywords": ["transformer"],
                "sources": [{{"type": "rss", "url": "{FEED_URL}"}}{extra_sources}],
                "slack_channel": "C-ML"
            }}}}"#
        ))
        .unwrap()
    }

    fn token() -> TokenSource {
        TokenSource::Fixed("xoxb-test".into())
    }

    #[tokio::test]
    async fn test_scenario_a_fresh_store_posts_matches() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStorage::new(tmp.path().join("posted-ids.json"));
        let http = StubHttp::default().with_page(FEED_URL, RSS_FEED);
        let sink = RecordingSink::new(SinkMode::Accept);
        let notifier = Notifier::new(&sink, &store, token(), NotifyOptions::default());

        let summary = run(&Config::default(), &ml_topics(""), &http, &notifier)
            .await
            .unwrap();

        assert_eq!(sink.posts().len(), 2);
        assert!(sink.posts().iter().all(|p| p.channel == "C-ML"));
        assert_eq!(summary.posted, 2);
        assert_eq!(summary.fetched, 2);

        let saved = store.load().await.unwrap();
        assert_eq!(saved.len(), 2);
        assert!(saved.contains("post-1"));
        assert!(saved.contains("https://blog.example/posts/3"));
    }

    #[tokio::test]
    async fn test_scenario_b_rerun_posts_nothing() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStorage::new(tmp.path().join("posted-ids.json"));
        let http = StubHttp::default().with_page(FEED_URL, RSS_FEED);
        let config = Config::default();
        let topics = ml_topics("");

        let first = RecordingSink::new(SinkMode::Accept);
        run(&config, &topics, &http, &Notifier::new(&first, &store, token(), NotifyOptions::default()))
            .await
            .unwrap();

        let second = RecordingSink::new(SinkMode::Accept);
        let summary = run(&config, &topics, &http, &Notifier::new(&second, &store, token(), NotifyOptions::default()))
            .await
            .unwrap();

        assert!(second.posts().is_empty());
        assert_eq!(summary.posted, 0);
        assert_eq!(summary.skipped, 2);
        assert_eq!(store.load().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_scenario_c_entry_without_id_or_link() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStorage::new(tmp.path().join("posted-ids.json"));
        let body = rss_with_items(&[rss_item(
            None,
            None,
            Some("A transformer with no home"),
            Some("No guid, no link."),
            None,
            None,
        )]);
        let http = StubHttp::default().with_page(FEED_URL, &body);
        let sink = RecordingSink::new(SinkMode::Accept);
        let notifier = Notifier::new(&sink, &store, token(), NotifyOptions::default());

        run(&Config::default(), &ml_topics(""), &http, &notifier)
            .await
            .unwrap();

        let posts = sink.posts();
        assert_eq!(posts.len(), 1);
        assert!(posts[0].text.contains("_Link_: \n"));
        assert!(posts[0].text.contains("_Published_: Unknown date\n"));

        let saved = store.load().await.unwrap();
        assert_eq!(saved.iter().collect::<Vec<_>>(), vec![""]);
    }

    #[tokio::test]
    async fn test_unknown_source_type_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStorage::new(tmp.path().join("posted-ids.json"));
        let http = StubHttp::default().with_page(FEED_URL, RSS_FEED);
        let sink = RecordingSink::new(SinkMode::Accept);
        let notifier = Notifier::new(&sink, &store, token(), NotifyOptions::default());

        let topics = Topics::from_json(&format!(
            r#"{{"ml": {{
                "keywords": ["transformer"],
                "sources": [{{"type": "mastodon"}}, {{"type": "rss", "url": "{FEED_URL}"}}],
                "slack_channel": "C-ML"
            }}}}"#
        ))
        .unwrap();

        let summary = run(&Config::default(), &topics, &http, &notifier)
            .await
            .unwrap();

        assert_eq!(summary.unknown_sources, 1);
        assert_eq!(sink.posts().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_token_run_completes_without_posts() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("posted-ids.json");
        let store = LocalStorage::new(&path);
        let http = StubHttp::default().with_page(FEED_URL, RSS_FEED);
        let sink = RecordingSink::new(SinkMode::Accept);
        let notifier = Notifier::new(
            &sink,
            &store,
            TokenSource::Env("PAPER_NOTIFIER_TEST_TOKEN_NEVER_SET".into()),
            NotifyOptions::default(),
        );

        let summary = run(&Config::default(), &ml_topics(""), &http, &notifier)
            .await
            .unwrap();

        assert!(summary.posting_disabled);
        assert!(sink.posts().is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_topic_without_sources_does_not_stop_run() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStorage::new(tmp.path().join("posted-ids.json"));
        let http = StubHttp::default().with_page(FEED_URL, RSS_FEED);
        let sink = RecordingSink::new(SinkMode::Accept);
        let notifier = Notifier::new(&sink, &store, token(), NotifyOptions::default());

        let topics = Topics::from_json(&format!(
            r#"{{
                "idle": {{"keywords": ["transformer"], "sources": [], "slack_channel": "C-IDLE"}},
                "ml": {{"keywords": ["transformer"], "sources": [{{"type": "rss", "url": "{FEED_URL}"}}], "slack_channel": "C-ML"}}
            }}"#
        ))
        .unwrap();
        topics.validate().unwrap();

        let summary = run(&Config::default(), &topics, &http, &notifier)
            .await
            .unwrap();

        assert_eq!(summary.topics, 2);
        assert_eq!(summary.topics_notified, 1);
        assert_eq!(sink.posts().len(), 2);
        assert!(sink.posts().iter().all(|p| p.channel == "C-ML"));
    }

    #[tokio::test]
    async fn test_arxiv_and_rss_results_are_combined() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStorage::new(tmp.path().join("posted-ids.json"));
        let http = StubHttp::default()
            .with_page(FEED_URL, RSS_FEED)
            .with_page("https://export.arxiv.org/api/query", ARXIV_ATOM);
        let sink = RecordingSink::new(SinkMode::Accept);
        let notifier = Notifier::new(&sink, &store, token(), NotifyOptions::default());

        let summary = run(
            &Config::default(),
            &ml_topics(r#", {"type": "arxiv"}"#),
            &http,
            &notifier,
        )
        .await
        .unwrap();

        assert_eq!(summary.fetched, 4);
        assert_eq!(summary.topics_notified, 1);
        let posts = sink.posts();
        assert_eq!(posts.len(), 4);
        assert!(posts[2].text.starts_with("*Sparse Transformers & Friends*"));
    }

    #[tokio::test]
    async fn test_fetch_error_aborts_remaining_topics() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStorage::new(tmp.path().join("posted-ids.json"));
        let http = StubHttp::default().with_page(FEED_URL, RSS_FEED);
        let sink = RecordingSink::new(SinkMode::Accept);
        let notifier = Notifier::new(&sink, &store, token(), NotifyOptions::default());

        let topics = Topics::from_json(&format!(
            r#"{{
                "ml": {{"keywords": ["transformer"], "sources": [{{"type": "rss", "url": "{FEED_URL}"}}], "slack_channel": "C1"}},
                "broken": {{"keywords": ["x"], "sources": [{{"type": "rss", "url": "https://down.example/feed"}}], "slack_channel": "C2"}},
                "never": {{"keywords": ["transformer"], "sources": [{{"type": "rss", "url": "{FEED_URL}"}}], "slack_channel": "C3"}}
            }}"#
        ))
        .unwrap();

        let result = run(&Config::default(), &topics, &http, &notifier).await;

        assert!(result.is_err());
        assert!(sink.posts().iter().all(|p| p.channel == "C1"));
        assert_eq!(store.load().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_topic_without_matches_is_not_notified() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("posted-ids.json");
        let store = LocalStorage::new(&path);
        let http = StubHttp::default().with_page(FEED_URL, RSS_FEED);
        let sink = RecordingSink::new(SinkMode::Accept);
        let notifier = Notifier::new(&sink, &store, token(), NotifyOptions::default());

        let topics = Topics::from_json(&format!(
            r#"{{"quiet": {{"keywords": ["quantum"], "sources": [{{"type": "rss", "url": "{FEED_URL}"}}], "slack_channel": "C"}}}}"#
        ))
        .unwrap();

        let summary = run(&Config::default(), &topics, &http, &notifier)
            .await
            .unwrap();

        assert_eq!(summary.topics, 1);
        assert_eq!(summary.topics_notified, 0);
        assert!(!path.exists());
    }
}
