//! Utility functions for text processing, HTML cleaning, and message splitting.
//!
//! Regex patterns are declared with `lazy_regex!`, which validates them at
//! compile time and builds them on first use.

// lazy_regex! uses once_cell internally
#![allow(clippy::non_std_lazy_statics)]

use anyhow::Result;
use html_escape::{decode_html_entities, encode_text};
use lazy_regex::lazy_regex;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;
use tracing::warn;
use unicode_segmentation::UnicodeSegmentation;

/// Match line breaks: <br>, <br/>, <br />
static RE_BREAK: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"(?i)<br\s*/?>");

/// Match paragraph and div closers
static RE_BLOCK_END: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"(?i)</(p|div|h[1-6]|li)\s*>");

/// Match any opening or closing tag, capturing the tag name
static RE_TAG: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"</?([A-Za-z][A-Za-z0-9]*)[^>]*>");

/// Match 3+ consecutive newlines
static RE_MULTI_NEWLINE: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"\n{3,}");

/// Tags Telegram accepts in HTML parse mode
const TELEGRAM_ALLOWED_TAGS: &[&str] = &[
    "b", "strong", "i", "em", "u", "ins", "s", "strike", "del", "code", "pre", "a",
];

/// Converts wiki HTML into the subset Telegram can render.
///
/// Paragraph and line breaks become newlines, supported formatting tags are
/// kept and every other tag is dropped. Text is entity-decoded and escaped
/// again, so named entities such as `&nbsp;` never reach Telegram.
///
/// # Examples
///
/// ```
/// use mezmur_bot::utils::telegram_html;
/// let input = "<div class=\"poem\"><p>Line one<br/>Line <b>two</b></p><p>Next</p></div>";
/// assert_eq!(telegram_html(input), "Line one\nLine <b>two</b>\n\nNext");
/// ```
#[must_use]
pub fn telegram_html(html: &str) -> String {
    let text = RE_BREAK.replace_all(html, "\n");
    let text = RE_BLOCK_END.replace_all(&text, "\n\n");

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in RE_TAG.captures_iter(&text) {
        let Some(tag) = caps.get(0) else { continue };
        out.push_str(&encode_text(&decode_html_entities(&text[last..tag.start()])));
        if is_allowed_tag(&caps) {
            out.push_str(tag.as_str());
        }
        last = tag.end();
    }
    out.push_str(&encode_text(&decode_html_entities(&text[last..])));

    RE_MULTI_NEWLINE.replace_all(&out, "\n\n").trim().to_string()
}

fn tag_name(caps: &regex::Captures) -> String {
    caps.get(1)
        .map_or(String::new(), |m| m.as_str().to_ascii_lowercase())
}

fn is_allowed_tag(caps: &regex::Captures) -> bool {
    TELEGRAM_ALLOWED_TAGS.contains(&tag_name(caps).as_str())
}

/// Splits Telegram HTML into parts of at most `max_length` characters.
///
/// Cuts prefer line boundaries. Formatting tags still open at a cut are
/// closed at the end of that part and reopened at the start of the next, so
/// every part parses on its own. Entities are never cut.
///
/// # Examples
///
/// ```
/// use mezmur_bot::utils::split_html_message;
/// let html = format!("<i>{}</i>", "Chorus line\n".repeat(10));
/// let parts = split_html_message(&html, 50);
/// assert!(parts.len() > 1);
/// assert!(parts.iter().all(|p| p.starts_with("<i>") && p.ends_with("</i>")));
/// ```
#[must_use]
pub fn split_html_message(html: &str, max_length: usize) -> Vec<String> {
    let mut splitter = HtmlSplitter::new(max_length);
    let mut last = 0;
    for caps in RE_TAG.captures_iter(html) {
        let Some(tag) = caps.get(0) else { continue };
        splitter.push_text(&html[last..tag.start()]);
        splitter.push_tag(tag.as_str(), tag_name(&caps));
        last = tag.end();
    }
    splitter.push_text(&html[last..]);
    splitter.finish()
}

struct HtmlSplitter {
    max_length: usize,
    parts: Vec<String>,
    current: String,
    current_len: usize,
    has_text: bool,
    /// Open tags as `(name, opening tag)`, outermost first
    open: Vec<(String, String)>,
}

impl HtmlSplitter {
    const fn new(max_length: usize) -> Self {
        Self {
            max_length,
            parts: Vec::new(),
            current: String::new(),
            current_len: 0,
            has_text: false,
            open: Vec::new(),
        }
    }

    fn closing_len(&self) -> usize {
        self.open.iter().map(|(name, _)| name.len() + 3).sum()
    }

    fn fits(&self, len: usize) -> bool {
        self.current_len + len + self.closing_len() <= self.max_length
    }

    fn append(&mut self, piece: &str) {
        self.current.push_str(piece);
        self.current_len += piece.chars().count();
        if !piece.trim().is_empty() {
            self.has_text = true;
        }
    }

    /// Closes the current part and starts the next one with the open tags
    fn flush(&mut self) {
        if self.has_text {
            let mut part = self.current.trim_end().to_string();
            for (name, _) in self.open.iter().rev() {
                part.push_str("</");
                part.push_str(name);
                part.push('>');
            }
            self.parts.push(part);
        }
        self.current = self.open.iter().map(|(_, raw)| raw.as_str()).collect();
        self.current_len = self.current.chars().count();
        self.has_text = false;
    }

    fn push_tag(&mut self, raw: &str, name: String) {
        if raw.starts_with("</") {
            if let Some(pos) = self.open.iter().rposition(|(open, _)| *open == name) {
                self.open.remove(pos);
            }
            self.current.push_str(raw);
            self.current_len += raw.chars().count();
            return;
        }
        // The tag and its closer must both fit
        if !self.fits(raw.chars().count() + name.len() + 3) && self.has_text {
            self.flush();
        }
        self.current.push_str(raw);
        self.current_len += raw.chars().count();
        self.open.push((name, raw.to_string()));
    }

    fn push_text(&mut self, text: &str) {
        for line in text.split_inclusive('\n') {
            let len = line.chars().count();
            if !self.fits(len) && self.has_text {
                self.flush();
            }
            if self.fits(len) {
                self.append(line);
                continue;
            }
            for atom in text_atoms(line) {
                if !self.fits(atom.chars().count()) {
                    self.flush();
                }
                self.append(atom);
            }
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.parts
    }
}

/// Graphemes of escaped text, with each `&...;` entity kept as one unit
fn text_atoms(text: &str) -> Vec<&str> {
    let mut atoms = Vec::new();
    let mut entity_start = None;
    for (i, grapheme) in text.grapheme_indices(true) {
        match entity_start {
            Some(start) if grapheme == ";" => {
                atoms.push(&text[start..i + 1]);
                entity_start = None;
            }
            Some(_) => {}
            None if grapheme == "&" => entity_start = Some(i),
            None => atoms.push(grapheme),
        }
    }
    if let Some(start) = entity_start {
        atoms.push(&text[start..]);
    }
    atoms
}

/// Splits a long message into parts that fit within `max_length` characters.
///
/// Lines are kept whole where possible; a single line longer than the limit
/// is split by grapheme clusters so multi-byte text is never cut mid-character.
///
/// # Examples
///
/// ```
/// use mezmur_bot::utils::split_long_message;
/// let long_msg = "A verse of a long song\n".repeat(300);
/// let parts = split_long_message(&long_msg, 4000);
/// assert!(parts.len() > 1);
/// ```
#[must_use]
pub fn split_long_message(message: &str, max_length: usize) -> Vec<String> {
    if message.is_empty() {
        return Vec::new();
    }

    if message.chars().count() <= max_length {
        return vec![message.to_string()];
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in message.lines() {
        let line_len = line.chars().count();

        if line_len > max_length {
            if !current.is_empty() {
                parts.push(current.trim_end().to_string());
                current.clear();
                current_len = 0;
            }

            let mut chunk = String::new();
            let mut chunk_len = 0;
            for grapheme in line.graphemes(true) {
                let grapheme_len = grapheme.chars().count();
                if chunk_len + grapheme_len > max_length {
                    parts.push(std::mem::take(&mut chunk));
                    chunk_len = 0;
                }
                chunk.push_str(grapheme);
                chunk_len += grapheme_len;
            }
            if !chunk.is_empty() {
                current.push_str(&chunk);
                current.push('\n');
                current_len = chunk_len + 1;
            }
            continue;
        }

        // +1 for the newline
        if current_len + line_len + 1 > max_length && !current.is_empty() {
            parts.push(current.trim_end().to_string());
            current.clear();
            current_len = 0;
        }
        current.push_str(line);
        current.push('\n');
        current_len += line_len + 1;
    }

    if !current.trim().is_empty() {
        parts.push(current.trim_end().to_string());
    }

    parts
}

/// Safely truncates a string to a maximum character length (not bytes).
///
/// This is UTF-8 safe and will not panic on multi-byte characters.
///
/// # Examples
///
/// ```
/// use mezmur_bot::utils::truncate_str;
/// let s = "ምስጋና ይሁን";
/// assert_eq!(truncate_str(s, 5), "ምስጋና ");
/// ```
pub fn truncate_str(s: impl AsRef<str>, max_chars: usize) -> String {
    let s = s.as_ref();
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    s.char_indices()
        .nth(max_chars)
        .map_or_else(|| s.to_string(), |(pos, _)| s[..pos].to_string())
}

/// Retry a Telegram API operation with exponential backoff.
///
/// The retry strategy uses exponential backoff with jitter:
/// - Initial delay: 500ms
/// - Max delay: 4s
/// - Max attempts: 3 (see constants in `config.rs`)
///
/// Only Telegram calls go through here; lyrics API failures surface
/// immediately.
///
/// # Examples
///
/// ```no_run
/// use mezmur_bot::utils::retry_telegram_operation;
/// use anyhow::Result;
///
/// async fn send() -> Result<()> {
///     Ok(())
/// }
///
/// # async fn example() -> Result<()> {
/// retry_telegram_operation(|| async { send().await }).await?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns the last error if every attempt fails.
pub async fn retry_telegram_operation<F, Fut, T>(operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    use crate::config::{
        TELEGRAM_API_INITIAL_BACKOFF_MS, TELEGRAM_API_MAX_BACKOFF_MS, TELEGRAM_API_MAX_RETRIES,
    };

    let retry_strategy = ExponentialBackoff::from_millis(TELEGRAM_API_INITIAL_BACKOFF_MS)
        .max_delay(Duration::from_millis(TELEGRAM_API_MAX_BACKOFF_MS))
        .map(jitter)
        .take(TELEGRAM_API_MAX_RETRIES);

    Retry::spawn(retry_strategy, operation).await.map_err(|e| {
        warn!(
            "Telegram API operation failed after {} attempts: {}",
            TELEGRAM_API_MAX_RETRIES, e
        );
        e
    })
}
