//! Test doubles and fixtures shared by unit tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::Paper;
use crate::services::{ChatSink, Delivery};
use crate::utils::http::HttpGet;

/// Serves canned bodies for URLs starting with a registered prefix.
#[derive(Default)]
pub struct StubHttp {
    pages: Vec<(String, String)>,
    requests: Mutex<Vec<String>>,
}

impl StubHttp {
    pub fn with_page(mut self, url_prefix: &str, body: &str) -> Self {
        self.pages.push((url_prefix.to_string(), body.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpGet for StubHttp {
    async fn get_text(&self, url: &str) -> Result<String> {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, body)| body.clone())
            .ok_or_else(|| {
                AppError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    format!("no stub page for {url}"),
                ))
            })
    }
}

#[derive(Debug, Clone, Copy)]
pub enum SinkMode {
    Accept,
    Reject,
    Fail,
}

#[derive(Debug, Clone)]
pub struct Post {
    pub token: String,
    pub channel: String,
    pub text: String,
}

/// Records every post and answers according to its mode.
pub struct RecordingSink {
    mode: SinkMode,
    posts: Mutex<Vec<Post>>,
}

impl RecordingSink {
    pub fn new(mode: SinkMode) -> Self {
        Self {
            mode,
            posts: Mutex::new(Vec::new()),
        }
    }

    pub fn posts(&self) -> Vec<Post> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatSink for RecordingSink {
    async fn post_message(&self, token: &str, channel: &str, text: &str) -> Result<Delivery> {
        self.posts.lock().unwrap().push(Post {
            token: token.to_string(),
            channel: channel.to_string(),
            text: text.to_string(),
        });
        match self.mode {
            SinkMode::Accept => Ok(Delivery::Accepted),
            SinkMode::Reject => Ok(Delivery::Rejected {
                body: r#"{"ok":false,"error":"not_in_channel"}"#.to_string(),
            }),
            SinkMode::Fail => Err(AppError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "slack unreachable",
            ))),
        }
    }
}

pub fn paper(id: &str, title: &str) -> Paper {
    Paper {
        id: id.to_string(),
        title: title.to_string(),
        ..Paper::default()
    }
}

/// Render one RSS 2.0 `<item>`; `None` omits the element.
pub fn rss_item(
    guid: Option<&str>,
    link: Option<&str>,
    title: Option<&str>,
    description: Option<&str>,
    author: Option<&str>,
    pub_date: Option<&str>,
) -> String {
    let mut item = String::from("<item>");
    let fields = [
        ("guid", guid),
        ("link", link),
        ("title", title),
        ("description", description),
        ("author", author),
        ("pubDate", pub_date),
    ];
    for (tag, value) in fields {
        if let Some(value) = value {
            item.push_str(&format!("<{tag}>{value}</{tag}>"));
        }
    }
    item.push_str("</item>");
    item
}

pub fn rss_with_items(items: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example ML Blog</title>
    <link>https://blog.example/</link>
    <description>Posts</description>
    {}
  </channel>
</rss>"#,
        items.join("\n    ")
    )
}

/// Three posts, two of which mention "transformer".
pub const RSS_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example ML Blog</title>
    <link>https://blog.example/</link>
    <description>Posts</description>
    <item>
      <guid isPermaLink="false">post-1</guid>
      <title>Scaling Transformer models</title>
      <link>https://blog.example/posts/1</link>
      <description>Lessons from training large models.</description>
      <author>Alice Smith, Bob Builder</author>
      <pubDate>Fri, 01 Mar 2024 12:00:00 GMT</pubDate>
    </item>
    <item>
      <guid isPermaLink="false">post-2</guid>
      <title>Why CNNs still matter</title>
      <link>https://blog.example/posts/2</link>
      <description>A defence of convolution.</description>
      <author>Carol Jones</author>
      <pubDate>Thu, 29 Feb 2024 09:30:00 GMT</pubDate>
    </item>
    <item>
      <title>Notes</title>
      <link>https://blog.example/posts/3</link>
      <description>Efficient transformer inference on CPUs.</description>
    </item>
  </channel>
</rss>"#;

/// Two arXiv entries in export API format.
pub const ARXIV_ATOM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <link href="http://arxiv.org/api/query?search_query%3Dall%3Atransformer" rel="self" type="application/atom+xml"/>
  <title type="html">ArXiv Query: search_query=all:transformer</title>
  <id>http://arxiv.org/api/Q1pPqg2d9pNrJw</id>
  <updated>2024-01-03T00:00:00-05:00</updated>
  <opensearch:totalResults xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">2</opensearch:totalResults>
  <entry>
    <id>http://arxiv.org/abs/2401.00001v1</id>
    <updated>2024-01-02T18:00:00Z</updated>
    <published>2024-01-02T18:00:00Z</published>
    <title>Sparse Transformers &amp; Friends</title>
    <summary>  We study sparse attention patterns
and their effect on long-context modelling.
    </summary>
    <author>
      <name>Ada Lovelace</name>
      <arxiv:affiliation>Analytical Engines Ltd</arxiv:affiliation>
    </author>
    <author>
      <name>Alan Turing</name>
    </author>
    <link href="http://arxiv.org/abs/2401.00001v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2401.00001v1" rel="related" type="application/pdf"/>
    <arxiv:primary_category term="cs.LG" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2401.00002v2</id>
    <updated>2024-01-02T10:00:00Z</updated>
    <published>2024-01-01T09:15:00Z</published>
    <title>Compilers for Transformer Inference</title>
    <summary>A compiler pipeline for transformer inference.</summary>
    <author>
      <name>Grace Hopper</name>
    </author>
    <arxiv:primary_category term="cs.PL" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#;
