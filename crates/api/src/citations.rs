use crate::consts::{CITATION_MARKER_PATTERN, MAX_PENDING_MARKER_BYTES};
use regex::Regex;
use std::sync::OnceLock;

fn citation_marker() -> &'static Regex {
    static CITATION_MARKER: OnceLock<Regex> = OnceLock::new();
    CITATION_MARKER.get_or_init(|| {
        Regex::new(CITATION_MARKER_PATTERN).expect("Failed to compile citation marker regex")
    })
}

/// Remove every complete citation marker from `text`
pub fn strip_citation_markers(text: &str) -> String {
    citation_marker().replace_all(text, "").into_owned()
}

/// Strips citation markers from a stream of text deltas
///
/// A marker may arrive split over several deltas, so text from an unclosed
/// `【` onwards is held back until the marker closes, grows past
/// `MAX_PENDING_MARKER_BYTES`, or the stream ends.
#[derive(Debug, Default)]
pub struct CitationStripper {
    pending: String,
}

impl CitationStripper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one delta; returns the text that is safe to emit now
    pub fn push(&mut self, delta: &str) -> String {
        self.pending.push_str(delta);
        let cleaned = strip_citation_markers(&self.pending);

        match cleaned.rfind('【') {
            Some(pos)
                if !cleaned[pos..].contains('】')
                    && cleaned.len() - pos <= MAX_PENDING_MARKER_BYTES =>
            {
                self.pending = cleaned[pos..].to_string();
                cleaned[..pos].to_string()
            }
            _ => {
                self.pending.clear();
                cleaned
            }
        }
    }

    /// Flush whatever is still held back
    pub fn finish(&mut self) -> String {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_complete_markers() {
        assert_eq!(
            strip_citation_markers("Ektefeller hefter for egen gjeld【4:0†ekteskapsloven.pdf】."),
            "Ektefeller hefter for egen gjeld."
        );
        assert_eq!(strip_citation_markers("Ingen kilder"), "Ingen kilder");
    }

    #[test]
    fn test_brackets_without_dagger_are_kept() {
        assert_eq!(strip_citation_markers("【merknad】"), "【merknad】");
    }

    #[test]
    fn test_marker_split_across_deltas() {
        let mut stripper = CitationStripper::new();
        let mut out = String::new();
        for delta in ["Arv ", "deles likt【", "12:3†", "arveloven.pdf", "】 mellom barna."] {
            out.push_str(&stripper.push(delta));
        }
        out.push_str(&stripper.finish());

        assert_eq!(out, "Arv deles likt mellom barna.");
    }

    #[test]
    fn test_text_before_open_marker_is_emitted_immediately() {
        let mut stripper = CitationStripper::new();
        assert_eq!(stripper.push("Se § 3【1:0"), "Se § 3");
        assert_eq!(stripper.push("†kilde】 og § 4"), " og § 4");
        assert_eq!(stripper.finish(), "");
    }

    #[test]
    fn test_unclosed_marker_is_flushed_at_end() {
        let mut stripper = CitationStripper::new();
        assert_eq!(stripper.push("Tekst 【uferdig"), "Tekst ");
        assert_eq!(stripper.finish(), "【uferdig");
    }

    #[test]
    fn test_overlong_pending_marker_is_released() {
        let mut stripper = CitationStripper::new();
        let long = format!("【{}", "x".repeat(MAX_PENDING_MARKER_BYTES + 10));
        assert_eq!(stripper.push(&long), long);
        assert_eq!(stripper.finish(), "");
    }
}
