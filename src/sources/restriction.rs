//! Public use restriction level extraction.
//!
//! The level sits as bare text after a label inside a heading:
//!
//! ```html
//! <h2><span>Current Public Use Restriction Level:</span><br><span>HIGH</span></h2>
//! ```
//!
//! It has no id or class of its own, so it is located by position relative to
//! the label.

use scraper::{ElementRef, Html};
use tracing::{debug, warn};

use super::{parse_selector, FetchError};
use crate::models::RestrictionLevel;

const HEADING_TEXT: &str = "Current Public Use Restriction Level";
const LABEL_TEXT: &str = "Current Public Use Restriction Level:";

/// Extracts the restriction level from a parsed document
pub trait RestrictionExtractor: Send + Sync {
    fn extract_restriction_level(&self, document: &Html) -> RestrictionLevel;
}

/// Walks `h2` → label `span` → `br` → `span`
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelledHeadingExtractor;

impl RestrictionExtractor for LabelledHeadingExtractor {
    fn extract_restriction_level(&self, document: &Html) -> RestrictionLevel {
        match find_level_text(document) {
            Ok(Some(text)) => {
                debug!("Scraped restriction level '{}'", text.trim());
                RestrictionLevel::from_text(&text)
            }
            Ok(None) => {
                warn!("Could not find the restriction level element");
                RestrictionLevel::not_available()
            }
            Err(e) => {
                warn!("Restriction level extraction failed: {}", e);
                RestrictionLevel::error()
            }
        }
    }
}

fn find_level_text(document: &Html) -> Result<Option<String>, FetchError> {
    let headings = parse_selector("h2")?;

    for heading in document.select(&headings) {
        if !element_text(&heading).contains(HEADING_TEXT) {
            continue;
        }

        let labels = heading
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|child| is_tag(child, "span") && element_text(child).contains(LABEL_TEXT));

        for label in labels {
            let mut siblings = label.next_siblings().filter_map(ElementRef::wrap);
            if !siblings.any(|el| is_tag(&el, "br")) {
                continue;
            }
            if let Some(level) = siblings.find(|el| is_tag(el, "span")) {
                return Ok(Some(element_text(&level)));
            }
        }
    }

    Ok(None)
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect()
}

fn is_tag(element: &ElementRef, name: &str) -> bool {
    element.value().name() == name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RestrictionKind, UrgencyTier};

    fn extract(html: &str) -> RestrictionLevel {
        LabelledHeadingExtractor.extract_restriction_level(&Html::parse_document(html))
    }

    #[test]
    fn test_level_after_label_is_trimmed() {
        let level = extract(
            r#"<html><body>
            <h2 class="banner"><span>Current Public Use Restriction Level:</span><br><span> HIGH </span></h2>
            </body></html>"#,
        );
        assert_eq!(level.text, "HIGH");
        assert_eq!(level.kind, RestrictionKind::High);
        assert_eq!(level.urgency(), UrgencyTier::Elevated);
    }

    #[test]
    fn test_skips_unrelated_headings_and_spans() {
        let level = extract(
            r#"<h2><span>Fire Season</span><br><span>OPEN</span></h2>
            <h2>Current Public Use Restriction Level
              <span>Updated daily</span>
              <span>Current Public Use Restriction Level:</span>
              <em>as of today</em>
              <br>
              <strong>note</strong>
              <span>extreme</span>
            </h2>"#,
        );
        assert_eq!(level.text, "extreme");
        assert_eq!(level.urgency(), UrgencyTier::Highest);
    }

    #[test]
    fn test_free_text_level_is_neutral() {
        let level = extract(
            r#"<h2><span>Current Public Use Restriction Level:</span><br><span>Level 3 - Partial Hootowl</span></h2>"#,
        );
        assert_eq!(level.text, "Level 3 - Partial Hootowl");
        assert_eq!(level.urgency(), UrgencyTier::Neutral);
    }

    #[test]
    fn test_missing_line_break_is_not_available() {
        let level = extract(
            r#"<h2><span>Current Public Use Restriction Level:</span><span>LOW</span></h2>"#,
        );
        assert_eq!(level, RestrictionLevel::not_available());
    }

    #[test]
    fn test_missing_heading_is_not_available() {
        let level = extract(r#"<h3><span>Current Public Use Restriction Level:</span><br><span>LOW</span></h3>"#);
        assert_eq!(level, RestrictionLevel::not_available());
        assert_ne!(level, RestrictionLevel::error());
    }

    #[test]
    fn test_label_must_be_direct_child() {
        let level = extract(
            r#"<h2>Current Public Use Restriction Level<div><span>Current Public Use Restriction Level:</span><br><span>LOW</span></div></h2>"#,
        );
        assert_eq!(level, RestrictionLevel::not_available());
    }
}
