// src/services/arxiv.rs

//! arXiv query API fetcher.
//!
//! Builds one boolean OR query over keywords and (optionally) quoted author
//! names, fetches the newest submissions as Atom, and re-checks the author
//! filter locally because the server matches keywords OR authors.

use quick_xml::Reader;
use quick_xml::events::Event;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{ArxivConfig, Paper};
use crate::utils::http::HttpGet;

/// Fetcher for the arXiv export API.
pub struct ArxivFetcher<'a> {
    http: &'a dyn HttpGet,
    config: &'a ArxivConfig,
}

impl<'a> ArxivFetcher<'a> {
    pub fn new(http: &'a dyn HttpGet, config: &'a ArxivConfig) -> Self {
        Self { http, config }
    }

    /// Build the `search_query` expression, or `None` if there is nothing to
    /// search for.
    pub fn build_query(keywords: &[String], authors: Option<&[String]>) -> Option<String> {
        let keyword_query = keywords
            .iter()
            .map(|kw| format!("all:{kw}"))
            .collect::<Vec<_>>()
            .join(" OR ");

        let author_query = authors
            .unwrap_or_default()
            .iter()
            .map(|name| format!("au:\"{name}\""))
            .collect::<Vec<_>>()
            .join(" OR ");

        match (keyword_query.is_empty(), author_query.is_empty()) {
            (false, false) => Some(format!("({keyword_query}) OR ({author_query})")),
            (false, true) => Some(keyword_query),
            (true, false) => Some(author_query),
            (true, true) => None,
        }
    }

    /// Full request URL for a query, newest submissions first.
    pub fn query_url(&self, query: &str) -> Result<Url> {
        let max_results = self.config.max_results.to_string();
        let url = Url::parse_with_params(
            &self.config.endpoint,
            &[
                ("search_query", query),
                ("start", "0"),
                ("max_results", max_results.as_str()),
                ("sortBy", "submittedDate"),
                ("sortOrder", "descending"),
            ],
        )?;
        Ok(url)
    }

    /// Fetch papers matching the keywords or authors.
    ///
    /// With an author filter, only entries listing one of those authors are
    /// returned, whatever the reason the server matched them.
    pub async fn fetch(
        &self,
        keywords: &[String],
        authors: Option<&[String]>,
    ) -> Result<Vec<Paper>> {
        let Some(query) = Self::build_query(keywords, authors) else {
            log::warn!("arXiv source has no keywords or authors, skipping request");
            return Ok(Vec::new());
        };

        let url = self.query_url(&query)?;
        let body = self.http.get_text(url.as_str()).await?;
        let mut papers = parse_feed(&body)?;
        let returned = papers.len();

        if let Some(filter) = authors {
            papers.retain(|paper| paper.has_author_in(filter));
        }

        log::info!(
            "arXiv: {} entries returned, {} kept for query {}",
            returned,
            papers.len(),
            query
        );
        Ok(papers)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Title,
    Summary,
    Published,
    AuthorName,
}

impl Field {
    fn for_tag(tag: &[u8], in_author: bool) -> Option<Self> {
        match tag {
            b"name" if in_author => Some(Self::AuthorName),
            _ if in_author => None,
            b"id" => Some(Self::Id),
            b"title" => Some(Self::Title),
            b"summary" => Some(Self::Summary),
            b"published" => Some(Self::Published),
            _ => None,
        }
    }

    fn tag(self) -> &'static [u8] {
        match self {
            Self::Id => b"id",
            Self::Title => b"title",
            Self::Summary => b"summary",
            Self::Published => b"published",
            Self::AuthorName => b"name",
        }
    }
}

#[derive(Debug, Default)]
struct EntryBuilder {
    id: Option<String>,
    title: Option<String>,
    summary: Option<String>,
    published: Option<String>,
    authors: Vec<String>,
}

impl EntryBuilder {
    fn set(&mut self, field: Field, value: &str) {
        let value = value.trim().to_string();
        match field {
            Field::Id => self.id = Some(value),
            Field::Title => self.title = Some(value),
            Field::Summary => self.summary = Some(value),
            Field::Published => self.published = Some(value),
            Field::AuthorName => self.authors.push(value),
        }
    }

    fn finish(self) -> Result<Paper> {
        let missing = |tag: &str| AppError::parse("arXiv entry", format!("missing <{tag}>"));

        let id = self.id.ok_or_else(|| missing("id"))?;
        Ok(Paper {
            link: id.clone(),
            id,
            title: self.title.ok_or_else(|| missing("title"))?,
            summary: self.summary.ok_or_else(|| missing("summary"))?,
            authors: self.authors,
            published: self.published.ok_or_else(|| missing("published"))?,
        })
    }
}

/// Parse an arXiv Atom response into papers, in document order.
///
/// Entries missing `id`, `title`, `summary` or `published` fail the whole
/// response.
pub fn parse_feed(xml: &str) -> Result<Vec<Paper>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut papers = Vec::new();
    let mut entry: Option<EntryBuilder> = None;
    let mut in_author = false;
    let mut field: Option<Field> = None;
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"entry" => {
                    entry = Some(EntryBuilder::default());
                    in_author = false;
                    field = None;
                }
                b"author" if entry.is_some() => in_author = true,
                tag if entry.is_some() => {
                    field = Field::for_tag(tag, in_author);
                    text.clear();
                }
                _ => {}
            },
            Event::Text(t) => {
                if field.is_some() {
                    text.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if field.is_some() {
                    text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"entry" => {
                    if let Some(builder) = entry.take() {
                        papers.push(builder.finish()?);
                    }
                    field = None;
                }
                b"author" => in_author = false,
                tag => {
                    if let (Some(current), Some(builder)) = (field, entry.as_mut()) {
                        if current.tag() == tag {
                            builder.set(current, &text);
                            field = None;
                        }
                    }
                }
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(papers)
}
