//! RSS and Atom feed parsing.
//!
//! Both wire formats are read with one streaming pass over the document:
//! RSS `<item>` and Atom `<entry>` elements are item boundaries, and the fields
//! inside them are resolved with fallback chains (first non-empty wins):
//!
//! | Field | Chain | Default |
//! |-------|-------|---------|
//! | title | `title` | `"Untitled"` |
//! | link | `link@href`, `link` text | `""` |
//! | published | `pubDate`, `updated`, `published` | `""` |
//! | summary | `description`, `summary`, `content` / `content:encoded` | `"No summary"` |
//!
//! Parsing never fails outright. A broken document yields the items completed
//! before the break, and [`ParsedFeed::error`] says what went wrong.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, warn};

use crate::models::RawFeedItem;
use crate::utils::truncate_for_log;

pub const UNTITLED: &str = "Untitled";
pub const NO_SUMMARY: &str = "No summary";

/// Items extracted from one feed document.
#[derive(Debug, Default)]
pub struct ParsedFeed {
    pub items: Vec<RawFeedItem>,
    /// Set when the document was not well-formed.
    pub error: Option<String>,
}

impl ParsedFeed {
    /// Malformed and nothing salvaged; the orchestrator counts this as a failed source.
    pub fn is_unusable(&self) -> bool {
        self.error.is_some() && self.items.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    PubDate,
    Updated,
    Published,
    Description,
    Summary,
    Content,
}

impl Field {
    fn from_names(qname: &[u8], local: &[u8]) -> Option<Self> {
        if qname == b"content:encoded" {
            return Some(Self::Content);
        }
        match local {
            b"title" => Some(Self::Title),
            b"link" => Some(Self::Link),
            b"pubDate" => Some(Self::PubDate),
            b"updated" => Some(Self::Updated),
            b"published" => Some(Self::Published),
            b"description" => Some(Self::Description),
            b"summary" => Some(Self::Summary),
            b"content" => Some(Self::Content),
            _ => None,
        }
    }
}

/// Field values collected for the item currently being read.
#[derive(Debug, Default)]
struct ItemFields {
    title: Option<String>,
    link_seen: bool,
    link_href: Option<String>,
    link_text: Option<String>,
    pub_date: Option<String>,
    updated: Option<String>,
    published: Option<String>,
    description: Option<String>,
    summary: Option<String>,
    content: Option<String>,
}

impl ItemFields {
    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link_text,
            Field::PubDate => &mut self.pub_date,
            Field::Updated => &mut self.updated,
            Field::Published => &mut self.published,
            Field::Description => &mut self.description,
            Field::Summary => &mut self.summary,
            Field::Content => &mut self.content,
        }
    }

    /// Record the `href` of the first `<link>` only; later links are ignored.
    fn open_link(&mut self, e: &BytesStart<'_>) -> bool {
        if self.link_seen {
            return false;
        }
        self.link_seen = true;
        self.link_href = href_of(e).filter(|h| !h.is_empty());
        true
    }

    fn set_first(&mut self, field: Field, text: String) {
        let slot = self.slot(field);
        if slot.is_none() && !text.is_empty() {
            *slot = Some(text);
        }
    }

    fn finish(self) -> RawFeedItem {
        RawFeedItem {
            title: self.title.unwrap_or_else(|| UNTITLED.to_string()),
            link: self.link_href.or(self.link_text).unwrap_or_default(),
            published_raw: self
                .pub_date
                .or(self.updated)
                .or(self.published)
                .unwrap_or_default(),
            summary_raw: self
                .description
                .or(self.summary)
                .or(self.content)
                .unwrap_or_else(|| NO_SUMMARY.to_string()),
        }
    }
}

/// Text being accumulated for one field element and everything nested in it.
struct Capture {
    field: Field,
    depth: usize,
    text: String,
}

/// Parse a feed document into raw items, in document order.
///
/// `source_name` is only used for logging.
pub fn parse(raw_text: &str, source_name: &str) -> ParsedFeed {
    let mut reader = Reader::from_str(raw_text);
    let mut parsed = ParsedFeed::default();

    let mut depth = 0usize;
    let mut seen_element = false;
    let mut item: Option<(ItemFields, usize)> = None;
    let mut capture: Option<Capture> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                seen_element = true;
                depth += 1;
                let local = e.local_name();
                if item.is_none() {
                    if is_item_boundary(local.as_ref()) {
                        item = Some((ItemFields::default(), depth));
                    }
                } else if capture.is_none() {
                    let field = Field::from_names(e.name().as_ref(), local.as_ref());
                    if let (Some((fields, _)), Some(field)) = (item.as_mut(), field) {
                        if field != Field::Link || fields.open_link(&e) {
                            capture = Some(Capture {
                                field,
                                depth,
                                text: String::new(),
                            });
                        }
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                seen_element = true;
                match item.as_mut() {
                    None if is_item_boundary(e.local_name().as_ref()) => {
                        parsed.items.push(ItemFields::default().finish());
                    }
                    Some((fields, _)) if capture.is_none() && e.local_name().as_ref() == b"link" => {
                        fields.open_link(&e);
                    }
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                if let Some(done) = capture.take_if(|c| c.depth == depth) {
                    if let Some((fields, _)) = item.as_mut() {
                        fields.set_first(done.field, done.text.trim().to_string());
                    }
                }
                if item.as_ref().is_some_and(|(_, d)| *d == depth)
                    && is_item_boundary(e.local_name().as_ref())
                {
                    if let Some((fields, _)) = item.take() {
                        parsed.items.push(fields.finish());
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Text(e)) => {
                if let Some(c) = capture.as_mut() {
                    c.text.push_str(&decode_text(&String::from_utf8_lossy(&e)));
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(c) = capture.as_mut() {
                    c.text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if let Some(c) = capture.as_mut() {
                    c.text.push_str(&resolve_entity(&String::from_utf8_lossy(&e)));
                }
            }
            Ok(Event::Eof) => {
                if depth > 0 {
                    parsed.error = Some(format!("document ended with {depth} unclosed element(s)"));
                } else if !seen_element {
                    parsed.error = Some("document contains no elements".to_string());
                }
                break;
            }
            Err(e) => {
                parsed.error = Some(e.to_string());
                break;
            }
            _ => {}
        }
    }

    match &parsed.error {
        Some(err) => warn!(
            source = %source_name,
            error = %err,
            salvaged = parsed.items.len(),
            preview = %truncate_for_log(raw_text, 120),
            "Feed document is malformed"
        ),
        None => debug!(source = %source_name, count = parsed.items.len(), "Parsed feed"),
    }
    parsed
}

fn is_item_boundary(local: &[u8]) -> bool {
    local == b"item" || local == b"entry"
}

fn href_of(e: &BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == b"href")
        .map(|a| decode_text(&String::from_utf8_lossy(&a.value)).trim().to_string())
}

fn decode_text(raw: &str) -> String {
    match quick_xml::escape::unescape(raw) {
        Ok(s) => s.into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// Resolve an entity reference such as `amp`, `#8217`, or an HTML name like `nbsp`.
fn resolve_entity(name: &str) -> String {
    let reference = format!("&{name};");
    if let Ok(s) = quick_xml::escape::unescape(&reference) {
        return s.into_owned();
    }
    let resolved = match name {
        "nbsp" => " ",
        "ndash" => "–",
        "mdash" => "—",
        "hellip" => "…",
        "lsquo" => "‘",
        "rsquo" => "’",
        "ldquo" => "“",
        "rdquo" => "”",
        _ => return reference,
    };
    resolved.to_string()
}
