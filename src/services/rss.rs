//! RSS/Atom feed fetcher.
//!
//! Only the first few entries of a feed are looked at. Keyword matching is
//! local: any keyword, case-insensitive, against title plus summary.
//!
//! Publication dates are passed through as the feed wrote them. feed-rs only
//! exposes parsed timestamps, so the raw text is read in a second pass over
//! the document.

use feed_rs::model::{Entry, FeedType, Link, Person, Text};
use feed_rs::parser;
use quick_xml::Reader;
use quick_xml::events::Event;
use quick_xml::name::QName;

use crate::error::Result;
use crate::models::{Paper, RssConfig, UNKNOWN_DATE};
use crate::utils::contains_any_ignore_case;
use crate::utils::http::HttpGet;

/// Fetcher for generic syndication feeds.
pub struct RssFetcher<'a> {
    http: &'a dyn HttpGet,
    config: &'a RssConfig,
}

impl<'a> RssFetcher<'a> {
    pub fn new(http: &'a dyn HttpGet, config: &'a RssConfig) -> Self {
        Self { http, config }
    }

    /// Fetch `url` and return entries matching the keyword and author filters.
    pub async fn fetch(
        &self,
        url: &str,
        keywords: &[String],
        authors: Option<&[String]>,
    ) -> Result<Vec<Paper>> {
        let body = self.http.get_text(url).await?;
        let papers = parse_feed(&body, self.config.max_entries, keywords, authors)?;
        log::info!("feed: {} entries kept from {}", papers.len(), url);
        Ok(papers)
    }
}

/// Parse a feed body and filter its first `max_entries` entries.
pub fn parse_feed(
    body: &str,
    max_entries: usize,
    keywords: &[String],
    authors: Option<&[String]>,
) -> Result<Vec<Paper>> {
    // feed-rs synthesizes IDs by default; an absent ID must stay absent here.
    let parser = parser::Builder::new()
        .id_generator(|_links: &[Link], _title: &Option<Text>, _uri: Option<&str>| String::new())
        .build();
    let feed = parser.parse(body.as_bytes())?;

    let raw_dates = match feed.feed_type {
        FeedType::JSON => json_dates(body),
        _ => xml_dates(body),
    };

    Ok(feed
        .entries
        .into_iter()
        .take(max_entries)
        .enumerate()
        .filter_map(|(idx, entry)| {
            let published = raw_dates.get(idx).cloned().flatten();
            entry_to_paper(entry, published, keywords, authors)
        })
        .collect())
}

fn entry_to_paper(
    entry: Entry,
    raw_published: Option<String>,
    keywords: &[String],
    authors: Option<&[String]>,
) -> Option<Paper> {
    let title = entry.title.map(|t| t.content).unwrap_or_default();
    // Content-only entries (Atom <content>, RSS <content:encoded>) use the body.
    let summary = entry
        .summary
        .map(|t| t.content)
        .or_else(|| entry.content.and_then(|c| c.body))
        .unwrap_or_default();

    if !contains_any_ignore_case(&format!("{title} {summary}"), keywords) {
        return None;
    }

    let link = primary_link(&entry.links).unwrap_or_default();
    let id = if entry.id.is_empty() {
        link.clone()
    } else {
        entry.id
    };

    let paper = Paper {
        id,
        title: title.trim().to_string(),
        link,
        summary: summary.trim().to_string(),
        authors: author_candidates(&entry.authors),
        published: raw_published.unwrap_or_else(|| UNKNOWN_DATE.to_string()),
    };

    match authors {
        Some(filter) if !paper.has_author_in(filter) => None,
        _ => Some(paper),
    }
}

/// The `alternate` link (an unset `rel` means alternate), else the first one.
fn primary_link(links: &[Link]) -> Option<String> {
    links
        .iter()
        .find(|l| l.rel.as_deref().is_none_or(|rel| rel == "alternate"))
        .or_else(|| links.first())
        .map(|l| l.href.trim().to_string())
}

/// RSS `<author>` text is parsed as a contact: the raw text lands in `email`
/// and the role in `name`.
fn person_label(person: &Person) -> &str {
    match person.email.as_deref() {
        Some(email) if person.name.is_empty() || person.name == "author" => email,
        _ => person.name.as_str(),
    }
}

/// Feeds usually carry one author string; split it on commas into names.
fn author_candidates(people: &[Person]) -> Vec<String> {
    people
        .iter()
        .map(person_label)
        .collect::<Vec<_>>()
        .join(",")
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Copy)]
enum DateTag {
    /// `pubDate`, Atom `published`, `dcterms:issued`
    Published,
    /// `dc:date`, used when nothing better is present
    DublinCore,
}

impl DateTag {
    fn for_name(name: QName<'_>) -> Option<Self> {
        match name.local_name().as_ref() {
            b"pubDate" | b"published" | b"issued" => Some(Self::Published),
            b"date" if name.prefix().is_some_and(|p| p.as_ref() == b"dc") => {
                Some(Self::DublinCore)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct RawDates {
    published: Option<String>,
    dublin_core: Option<String>,
}

impl RawDates {
    fn set(&mut self, tag: DateTag, value: &str) {
        let slot = match tag {
            DateTag::Published => &mut self.published,
            DateTag::DublinCore => &mut self.dublin_core,
        };
        if slot.is_none() && !value.is_empty() {
            *slot = Some(value.to_string());
        }
    }

    fn best(self) -> Option<String> {
        self.published.or(self.dublin_core)
    }
}

fn is_entry(name: QName<'_>) -> bool {
    matches!(name.local_name().as_ref(), b"item" | b"entry")
}

/// Raw date text of every `<item>`/`<entry>`, in document order.
///
/// Channel-level dates are ignored. If the markup stops parsing, the dates
/// collected so far are returned and later entries have no date.
fn xml_dates(body: &str) -> Vec<Option<String>> {
    let mut reader = Reader::from_str(body);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut dates = Vec::new();
    let mut entry: Option<RawDates> = None;
    let mut tag: Option<DateTag> = None;
    let mut text = String::new();

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(e) => {
                log::debug!("feed date scan stopped early: {}", e);
                break;
            }
        };
        match event {
            Event::Start(e) => {
                if is_entry(e.name()) {
                    entry = Some(RawDates::default());
                    tag = None;
                } else if entry.is_some() {
                    tag = DateTag::for_name(e.name());
                    text.clear();
                }
            }
            Event::Text(t) => {
                if tag.is_some() {
                    if let Ok(value) = t.unescape() {
                        text.push_str(&value);
                    }
                }
            }
            Event::CData(c) => {
                if tag.is_some() {
                    text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(e) => {
                if is_entry(e.name()) {
                    if let Some(found) = entry.take() {
                        dates.push(found.best());
                    }
                } else if let (Some(current), Some(found)) = (tag.take(), entry.as_mut()) {
                    found.set(current, text.trim());
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    dates
}

/// `date_published` of every JSON Feed item, in order.
fn json_dates(body: &str) -> Vec<Option<String>> {
    let Ok(doc) = serde_json::from_str::<serde_json::Value>(body) else {
        return Vec::new();
    };
    doc.get("items")
        .and_then(|items| items.as_array())
        .map(|items| {
            items
                .iter()
                .map(|item| {
                    item.get("date_published")
                        .and_then(|d| d.as_str())
                        .map(str::to_string)
                })
                .collect()
        })
        .unwrap_or_default()
}
