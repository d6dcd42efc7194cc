//! Parsing of the free-text analysis returned by the nutrition service.
//!
//! The service answers with a markdown-like block:
//!
//! ```text
//! **Pros of Oat Milk**
//! 1. **Fiber**: Contains beta-glucans.
//! 2. **Fortified**: Often fortified with calcium.
//! **Cons of Oat Milk**
//! 1. **Sugar**: Some brands add sugar.
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static PROS_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\*\*Pros(?: of [^\n]*?)?\*\*(.*?)\*\*Cons(?: of [^\n]*?)?\*\*")
        .unwrap_or_else(|err| panic!("invalid pros pattern: {err}"))
});

static CONS_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\*\*Cons(?: of [^\n]*?)?\*\*(.*)")
        .unwrap_or_else(|err| panic!("invalid cons pattern: {err}"))
});

static ITEM_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+\.\s").unwrap_or_else(|err| panic!("invalid item pattern: {err}"))
});

static ITEM_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\d+\.\s*\*\*([^\n]*?)\*\*:\s*(.*)")
        .unwrap_or_else(|err| panic!("invalid header pattern: {err}"))
});

static ITEM_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+\.\s*").unwrap_or_else(|err| panic!("invalid number pattern: {err}"))
});

static RATING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^[^0-9]*?(\d+(?:\.\d+)?)(?:\s*/\s*5)?[\s:.\-]*(.*)$")
        .unwrap_or_else(|err| panic!("invalid rating pattern: {err}"))
});

const MAX_SCORE: f32 = 5.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub header: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub pros: Vec<Finding>,
    pub cons: Vec<Finding>,
}

impl AnalysisReport {
    pub fn is_empty(&self) -> bool {
        self.pros.is_empty() && self.cons.is_empty()
    }

    /// Plain-text rendering used by the CLI.
    pub fn render_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (title, findings) in [("Benefits", &self.pros), ("Risks", &self.cons)] {
            lines.push(format!("{}:", title));
            if findings.is_empty() {
                lines.push("  (none listed)".into());
            }
            for finding in findings {
                lines.push(format!("  - {}: {}", finding.header, finding.body));
            }
        }
        lines
    }
}

/// Splits the analysis text into its pros and cons findings. Missing
/// sections yield empty lists.
pub fn parse_analysis(text: &str) -> AnalysisReport {
    let pros = PROS_BLOCK
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|block| split_items(block.as_str()))
        .unwrap_or_default();
    let cons = CONS_BLOCK
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|block| split_items(block.as_str()))
        .unwrap_or_default();

    AnalysisReport {
        pros: pros.iter().map(|item| to_finding(item)).collect(),
        cons: cons.iter().map(|item| to_finding(item)).collect(),
    }
}

/// Breaks a block into items, starting a new item at every line that opens
/// with `N. `.
fn split_items(block: &str) -> Vec<String> {
    let trimmed = block.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    let mut items: Vec<String> = Vec::new();
    for line in trimmed.lines() {
        match items.last_mut() {
            Some(current) if !ITEM_START.is_match(line) => {
                current.push('\n');
                current.push_str(line);
            }
            _ => items.push(line.to_string()),
        }
    }
    items
}

fn to_finding(item: &str) -> Finding {
    match ITEM_HEADER.captures(item) {
        Some(caps) => Finding {
            header: caps[1].trim().to_string(),
            body: caps[2].trim().to_string(),
        },
        None => Finding {
            header: "Info".into(),
            body: ITEM_NUMBER.replace(item, "").trim().to_string(),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rating {
    /// Out of five.
    pub score: Option<f32>,
    pub phrase: String,
}

/// Reads a rating answer such as `4/5 - Looks Good`. The service is asked to
/// put the number first; anything after it is the phrase.
pub fn parse_rating(text: &str) -> Rating {
    let trimmed = text.trim();
    match RATING.captures(trimmed) {
        Some(caps) => Rating {
            score: caps[1]
                .parse::<f32>()
                .ok()
                .map(|score| score.clamp(0.0, MAX_SCORE)),
            phrase: caps[2].trim().to_string(),
        },
        None => Rating {
            score: None,
            phrase: trimmed.to_string(),
        },
    }
}
