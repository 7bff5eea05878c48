//! Render hints derived from message text.
//!
//! Hints are never transmitted. They are recomputed from `text` whenever a
//! message is constructed, so two messages with the same sender and text
//! always carry identical hints.
//!
//! Only computed replies are analysed; human messages render as plain text.
//!
//! A fenced block is three backticks, an optional language tag of word
//! characters, a newline, the body, a newline, and three closing backticks.
//! Text outside blocks becomes text segments; whitespace-only segments are
//! dropped.

/// Opening and closing marker of a fenced code block.
const FENCE: &str = "```";

/// Language reported for blocks without a tag.
const DEFAULT_LANGUAGE: &str = "plaintext";

/// Derived presentation data for one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderHints {
    /// Entire text is one fenced block.
    pub is_code: bool,
    /// Language tag of a leading fence, if present and non-empty.
    pub language: Option<String>,
    /// Text contains at least one fence marker.
    pub has_code_blocks: bool,
    /// Text/code breakdown. Empty for plain messages.
    pub segments: Vec<Segment>,
}

/// One piece of a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Prose.
    Text(String),
    /// Fenced code block body.
    Code {
        /// Language tag, `plaintext` when absent.
        language: String,
        /// Block body without fences.
        content: String,
    },
}

impl RenderHints {
    /// Hints for a plain (human) message.
    pub fn plain() -> Self {
        Self::default()
    }

    /// Analyse text for fenced code blocks.
    pub fn analyze(text: &str) -> Self {
        Self {
            is_code: text.starts_with(FENCE) && text.ends_with(FENCE),
            language: leading_language(text),
            has_code_blocks: text.contains(FENCE),
            segments: segments(text),
        }
    }
}

/// Language tag of a fence that opens the text.
pub fn leading_language(text: &str) -> Option<String> {
    let rest = text.strip_prefix(FENCE)?;
    let (tag, _) = split_tag_line(rest)?;
    if tag.is_empty() { None } else { Some(tag.to_string()) }
}

/// Split text into text and code segments.
pub fn segments(text: &str) -> Vec<Segment> {
    if !text.contains(FENCE) {
        return vec![Segment::Text(text.to_string())];
    }

    let mut parts = Vec::new();
    let mut cursor = 0;
    let mut search = 0;

    while let Some(offset) = text[search..].find(FENCE) {
        let start = search + offset;
        match match_block(&text[start..]) {
            Some(block) => {
                parts.push(Segment::Text(text[cursor..start].to_string()));
                parts.push(Segment::Code {
                    language: if block.language.is_empty() {
                        DEFAULT_LANGUAGE.to_string()
                    } else {
                        block.language.to_string()
                    },
                    content: block.content.to_string(),
                });
                cursor = start + block.len;
                search = cursor;
            },
            // Backticks are single bytes, so start + 1 is a char boundary.
            None => search = start + 1,
        }
    }
    parts.push(Segment::Text(text[cursor..].to_string()));

    parts.retain(|part| match part {
        Segment::Text(content) | Segment::Code { content, .. } => !content.trim().is_empty(),
    });
    parts
}

struct Block<'a> {
    language: &'a str,
    content: &'a str,
    len: usize,
}

/// Match a fenced block at the start of `text`, which begins with a fence.
fn match_block(text: &str) -> Option<Block<'_>> {
    let after_open = text.strip_prefix(FENCE)?;
    let (language, body) = split_tag_line(after_open)?;

    let close = format!("\n{FENCE}");
    let end = body.find(&close)?;

    let len = FENCE.len() + language.len() + 1 + end + close.len();
    Some(Block { language, content: &body[..end], len })
}

/// Split `tag\nrest` where `tag` is only word characters.
fn split_tag_line(text: &str) -> Option<(&str, &str)> {
    let newline = text.find('\n')?;
    let tag = &text[..newline];
    if tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Some((tag, &text[newline + 1..]))
    } else {
        None
    }
}
