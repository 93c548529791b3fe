//! Daily open burn advisory extraction.
//!
//! The advisory page publishes one `<pre>` block per day, headed by a bold
//! line such as `Open Burn Announcement for Tuesday, June 3rd, 2025`. Today's
//! block is found by exact header match and the two burn windows are pulled
//! out of its text with regular expressions.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use scraper::{ElementRef, Html};
use tracing::debug;

use super::parse_selector;
use crate::models::{BurnAdvisory, BurnWindow};

const HEADER_PREFIX: &str = "Open Burn Announcement";

const TIME_RANGE: &str =
    r"(\d{1,2}:\d{2}\s*[ap]\.?m\.?\s*to\s*\d{1,2}:\d{2}\s*[ap]\.?m\.?)";

// The gap after each anchor stops at the next section label
static AGRICULTURAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)Agricultural burning:[^:]*?recommend agricultural burning\s*be limited to the period from\s*{TIME_RANGE}"
    ))
    .expect("valid regex")
});

static BACKYARD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)Backyard burning inside special control areas:[^:]*?backyard burning is allowed\s*from\s*{TIME_RANGE}"
    ))
    .expect("valid regex")
});

/// Extracts today's burn advisory from a parsed document
pub trait AdvisoryExtractor: Send + Sync {
    fn extract_advisory(&self, document: &Html, today: NaiveDate) -> BurnAdvisory;
}

/// Ordinal suffix as the advisory source writes it.
///
/// 11, 12 and 13 get "th" because only 1/21/31, 2/22 and 3/23 are special.
pub fn ordinal_suffix(day: u32) -> &'static str {
    match day {
        1 | 21 | 31 => "st",
        2 | 22 => "nd",
        3 | 23 => "rd",
        _ => "th",
    }
}

/// Header line of the announcement block for `date`
pub fn announcement_header(date: NaiveDate) -> String {
    format!(
        "{} for {}, {} {}{}, {}",
        HEADER_PREFIX,
        date.format("%A"),
        date.format("%B"),
        date.day(),
        ordinal_suffix(date.day()),
        date.year()
    )
}

/// Finds the `<pre>` block whose bold header names today's date
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnouncementBlockExtractor;

impl AdvisoryExtractor for AnnouncementBlockExtractor {
    fn extract_advisory(&self, document: &Html, today: NaiveDate) -> BurnAdvisory {
        let expected = announcement_header(today);
        debug!("Looking for announcement header '{}'", expected);

        let bold = match parse_selector("b") {
            Ok(selector) => selector,
            Err(e) => return BurnAdvisory::unavailable(e.to_string()),
        };

        let mut seen_header: Option<String> = None;
        let mut block: Option<ElementRef> = None;

        for node in document.select(&bold) {
            let text = normalize_whitespace(&node.text().collect::<String>());
            if !text.starts_with(HEADER_PREFIX) {
                continue;
            }
            let matches_today = text == expected;
            seen_header = Some(text);

            if matches_today {
                let parent = node.parent().and_then(ElementRef::wrap);
                if let Some(pre) = parent.filter(|p| p.value().name() == "pre") {
                    block = Some(pre);
                    break;
                }
            }
        }

        let Some(block) = block else {
            return BurnAdvisory::unavailable(format!(
                "Today's burn announcement not found. Expected: '{}'. Actual header from site: '{}'.",
                expected,
                seen_header.as_deref().unwrap_or("None")
            ));
        };

        let text: String = block.text().collect();
        BurnAdvisory {
            agricultural: extract_window(&AGRICULTURAL_RE, &text),
            backyard: extract_window(&BACKYARD_RE, &text),
            error: None,
        }
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn extract_window(pattern: &Regex, text: &str) -> BurnWindow {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| BurnWindow::Window(strip_sentence_period(m.as_str())))
        .unwrap_or(BurnWindow::NoBurning)
}

/// Drop a trailing sentence period, keeping the one that closes "a.m."/"p.m."
fn strip_sentence_period(time: &str) -> String {
    let time = time.trim();
    let lower = time.to_ascii_lowercase();
    if lower.ends_with("a.m.") || lower.ends_with("p.m.") {
        return time.to_string();
    }
    time.strip_suffix('.').unwrap_or(time).to_string()
}
