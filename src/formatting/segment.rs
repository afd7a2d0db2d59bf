//! Splitting a model response into prose and code parts.

use regex::Regex;

use super::language::{self, PLAIN_TEXT};

lazy_static::lazy_static! {
    /// A fenced code block: an opening triple backtick with an optional
    /// language tag, then the body, then the closing triple backtick.
    static ref FENCE_REGEX: Regex =
        Regex::new(r"(?s)```(\w+)?\s*(.*?)```")
            .expect("Failed to compile fence regex");
}

/// Substrings that make an unfenced response a candidate for being code
/// as a whole.
const CODE_KEYWORDS: &[&str] = &[
    "def ", "function", "class ", "import ", "var ", "const ", "let ",
    "print", "console",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Code { language: String, content: String },
}

/// Split `response` into segments in source order.
///
/// Fenced blocks become [`Segment::Code`] with a trimmed body and either the
/// declared language or a detected one. Runs of text between them become
/// [`Segment::Text`] as is, whitespace-only runs included. A response
/// without a single complete fence is classified as a whole.
pub fn segment(response: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last_end = 0;

    for caps in FENCE_REGEX.captures_iter(response) {
        let (Some(fence), Some(body)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        if fence.start() > last_end {
            segments.push(Segment::Text(
                response[last_end..fence.start()].to_string(),
            ));
        }
        let content = body.as_str().trim();
        let language = caps.get(1).map_or_else(
            || language::detect(content).to_string(),
            |m| m.as_str().to_string(),
        );
        segments.push(Segment::Code { language, content: content.to_string() });
        last_end = fence.end();
    }

    if segments.is_empty() {
        return vec![classify_whole(response)];
    }

    if last_end < response.len() {
        segments.push(Segment::Text(response[last_end..].to_string()));
    }
    segments
}

fn classify_whole(response: &str) -> Segment {
    if CODE_KEYWORDS.iter().any(|keyword| response.contains(keyword)) {
        let language = language::detect(response);
        if language != PLAIN_TEXT {
            return Segment::Code {
                language: language.to_string(),
                content: response.to_string(),
            };
        }
    }
    Segment::Text(response.to_string())
}
