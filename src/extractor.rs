use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use tracing::{debug, error};

use crate::pdf_reader::{self, DocumentError};

/// Returned by `random_summary` when extraction found nothing usable.
pub const NO_SUMMARIES: &str = "No summaries available";

/// Body length cap for title-anchored and fixed-anchor summaries.
const BODY_CAP: usize = 150;
/// Body length cap for fallback paragraph summaries.
const PARAGRAPH_CAP: usize = 200;
/// At most this many numbered points are folded into one summary.
const MAX_POINTS: usize = 3;
/// The fallback pass stops after this many paragraphs.
const MAX_PARAGRAPHS: usize = 10;

/// Titles known to appear in the source collection without a " by " line.
/// Document-specific data, matched case-insensitively as literal anchors.
const FIXED_ANCHORS: [&str; 3] = [
    "Atomic Habits",
    "Deep Work",
    "The 7 Habits of Highly Effective People",
];

/// A paragraph must mention one of these to survive the fallback pass.
const KEYWORDS: [&str; 5] = ["book", "author", "principle", "habit", "rule"];

enum Source {
    Document(PathBuf),
    Text(String),
}

/// Extracts book summaries from a source document and hands them out,
/// one at random or all at once.
///
/// The summary set is built on first use and cached for the lifetime of the
/// instance; the source document is assumed static. A failed extraction
/// leaves any previously cached set untouched.
pub struct SummaryExtractor {
    source: Source,
    /// `None` = not yet extracted; `Some` = extracted, possibly empty.
    cache: Option<Vec<String>>,
}

impl SummaryExtractor {
    pub fn new(path: &Path) -> Self {
        Self {
            source: Source::Document(path.to_path_buf()),
            cache: None,
        }
    }

    /// Build an extractor over already-acquired text. Used when the caller
    /// has the document content in hand (and by the tests).
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            source: Source::Text(text.into()),
            cache: None,
        }
    }

    /// Run the full pipeline and replace the cached set.
    ///
    /// Deterministic for identical input text. On acquisition failure the
    /// error propagates and the cache keeps its previous contents.
    pub fn extract(&mut self) -> Result<&[String], DocumentError> {
        let text = match &self.source {
            Source::Document(path) => {
                let pages = pdf_reader::page_texts(path).map_err(|e| {
                    error!(path = %path.display(), error = %e, "failed to read source document");
                    e
                })?;
                pages.join("\n")
            }
            Source::Text(text) => text.clone(),
        };

        self.cache = Some(extract_summaries(&text));
        Ok(self.cache.as_deref().unwrap_or(&[]))
    }

    /// The cached summary set, extracting first if this instance has not
    /// run yet.
    pub fn summaries(&mut self) -> Result<&[String], DocumentError> {
        if self.cache.is_none() {
            self.extract()?;
        }
        Ok(self.cache.as_deref().unwrap_or(&[]))
    }

    /// One summary chosen uniformly at random, or the [`NO_SUMMARIES`]
    /// sentinel when the set is empty. An empty set is a valid terminal
    /// state, not an error.
    pub fn random_summary(&mut self) -> Result<String, DocumentError> {
        let set = self.summaries()?;
        Ok(set
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| NO_SUMMARIES.to_string()))
    }
}

/// Run all extraction passes over the joined document text.
///
/// Primary (title-anchored) and secondary (fixed-anchor) results accumulate
/// into one ordered, deduplicated list; the paragraph fallback only applies
/// when both produced nothing.
pub fn extract_summaries(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text.split('\n').collect();

    let mut summaries = title_pass(&lines);
    let primary = summaries.len();
    anchor_pass(text, &mut summaries);
    debug!(
        primary,
        secondary = summaries.len() - primary,
        "structured passes complete"
    );

    if summaries.is_empty() {
        summaries = paragraph_fallback(text);
        debug!(fallback = summaries.len(), "paragraph fallback applied");
    }

    summaries
}

/// Primary pass: find title lines, harvest the numbered points that follow,
/// and format each pair into a summary.
fn title_pass(lines: &[&str]) -> Vec<String> {
    let mut summaries = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if !is_title_line(lines[i]) {
            i += 1;
            continue;
        }

        let title = lines[i].trim();
        let mut points: Vec<String> = Vec::new();
        let mut j = i + 1;

        while j < lines.len() && points.len() < MAX_POINTS {
            if is_title_line(lines[j]) {
                break;
            }
            if let Some(content) = bullet_content(lines[j]) {
                if content.chars().count() > 10 {
                    let mut point = content.to_string();
                    // A wrapped bullet continues on the next line; merge it.
                    if let Some(next) = lines.get(j + 1) {
                        let next = next.trim();
                        if !next.is_empty()
                            && bullet_content(next).is_none()
                            && find_ascii_ci(next, " by ", 0).is_none()
                        {
                            point.push(' ');
                            point.push_str(next);
                            j += 1;
                        }
                    }
                    points.push(point);
                }
            }
            j += 1;
        }

        if points.is_empty() {
            i += 1;
        } else {
            if let Some(summary) = format_summary(title, &points) {
                summaries.push(summary);
            }
            // Resume after the lines the point scan consumed.
            i = j;
        }
    }

    summaries
}

/// A title line introduces a new book section: it names an author with
/// " by ", is long enough to be a real title, and is not itself a numbered
/// list item.
fn is_title_line(line: &str) -> bool {
    let line = line.trim();
    line.chars().count() > 20
        && find_ascii_ci(line, " by ", 0).is_some()
        && bullet_content(line).is_none()
}

/// If the line is a numbered bullet (digits, `.`/`)` markers, whitespace,
/// content), return the trimmed content.
fn bullet_content(line: &str) -> Option<&str> {
    let line = line.trim();
    let after_digits = line.trim_start_matches(|c: char| c.is_ascii_digit());
    if after_digits.len() == line.len() {
        return None;
    }
    let after_marker = after_digits.trim_start_matches(['.', ')']);
    if after_marker.len() == after_digits.len() {
        return None;
    }
    let content = after_marker.strip_prefix(|c: char| c.is_whitespace())?;
    Some(content.trim())
}

/// Build one `"<BookName> – <body>"` string from a title line and its
/// collected points.
fn format_summary(title: &str, points: &[String]) -> Option<String> {
    let at = find_ascii_ci(title, " by ", 0)?;
    let book_name = clean_book_name(&title[..at]);

    let mut body = points.first()?.clone();
    if body.chars().count() < 100 {
        if let Some(second) = points.get(1) {
            body.push_str(". ");
            body.push_str(second);
        }
    }
    let body = cap_body(&collapse_whitespace(&body), BODY_CAP);

    Some(format!("{book_name} – {body}"))
}

/// Drop leading numbering, punctuation, and stray zero-width characters
/// left over from section headings like "1.1 Atomic Habits".
fn clean_book_name(raw: &str) -> String {
    raw.trim()
        .trim_start_matches(|c: char| {
            c.is_ascii_digit()
                || c.is_ascii_punctuation()
                || c.is_whitespace()
                || matches!(c, '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{feff}')
        })
        .trim_end()
        .to_string()
}

/// Secondary pass: look for the fixed title anchors, taking the text up to
/// the first colon as the title and the colon-delimited body after it.
/// Appends to the accumulated list, skipping exact duplicates.
fn anchor_pass(text: &str, summaries: &mut Vec<String>) {
    for anchor in FIXED_ANCHORS {
        let mut from = 0;
        while let Some(pos) = find_ascii_ci(text, anchor, from) {
            from = pos + anchor.len();

            let line_end = text[pos..]
                .find('\n')
                .map(|offset| pos + offset)
                .unwrap_or(text.len());
            let line = &text[pos..line_end];
            let Some(colon) = line.find(':') else {
                continue;
            };

            let title = line[..colon].trim();
            let body = anchor_body(&line[colon + 1..], &text[line_end..]);
            if body.is_empty() {
                continue;
            }

            let mut capped: String = collapse_whitespace(&body).chars().take(BODY_CAP).collect();
            capped.push_str("...");
            let summary = format!("{title} – {capped}");

            if !summaries.iter().any(|existing| existing == &summary) {
                summaries.push(summary);
            }
        }
    }
}

/// Collect anchor body text: the rest of the anchor's line after the colon,
/// then following lines until a blank line or a capitalized line start.
fn anchor_body(first: &str, rest: &str) -> String {
    let mut body = first.trim().to_string();

    let rest = rest.strip_prefix('\n').unwrap_or(rest);
    for line in rest.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if line.chars().next().is_some_and(|c| c.is_uppercase()) {
            break;
        }
        if !body.is_empty() {
            body.push(' ');
        }
        body.push_str(line);
    }

    body
}

/// Fallback pass: when no structured titles were found, salvage paragraphs
/// that at least talk about books.
fn paragraph_fallback(text: &str) -> Vec<String> {
    let mut summaries = Vec::new();

    for paragraph in text.split("\n\n") {
        let paragraph = paragraph.trim();
        if paragraph.chars().count() <= 50 {
            continue;
        }
        let lower = paragraph.to_lowercase();
        if !KEYWORDS.iter().any(|keyword| lower.contains(keyword)) {
            continue;
        }

        let mut summary: String = collapse_whitespace(paragraph)
            .chars()
            .take(PARAGRAPH_CAP)
            .collect();
        summary.push_str("...");
        summaries.push(summary);

        if summaries.len() >= MAX_PARAGRAPHS {
            break;
        }
    }

    summaries
}

/// Truncate to `cap` characters, marking the cut with an ellipsis only when
/// something was actually dropped.
fn cap_body(body: &str, cap: usize) -> String {
    if body.chars().count() <= cap {
        body.to_string()
    } else {
        let mut capped: String = body.chars().take(cap).collect();
        capped.push_str("...");
        capped
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Byte offset of the first ASCII-case-insensitive occurrence of `needle`
/// at or after `from`. The needles used here are all ASCII, so a matched
/// offset always lands on a char boundary.
fn find_ascii_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let haystack = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || from + needle.len() > haystack.len() {
        return None;
    }
    (from..=haystack.len() - needle.len())
        .find(|&i| haystack[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_TITLES: &str = "Atomic Habits by James Clear\n\
        1.) Small habits compound over time\n\
        2.) Identity change drives lasting change\n\
        Deep Work by Cal Newport\n\
        1. Focused work without distraction produces rare value\n\
        2. Schedule every minute of your working day deliberately\n";

    #[test]
    fn title_line_predicate() {
        assert!(is_title_line("Atomic Habits by James Clear"));
        assert!(is_title_line("ATOMIC HABITS BY JAMES CLEAR"));
        // too short
        assert!(!is_title_line("A by B"));
        // no author marker
        assert!(!is_title_line("A long line without the magic word in it"));
    }

    #[test]
    fn bullet_lines_are_never_titles() {
        let line = "3. Some list item about a book by Someone Great";
        assert!(line.chars().count() > 20);
        assert!(!is_title_line(line));
        // all three marker shapes parse as bullets
        assert_eq!(bullet_content("1. content here"), Some("content here"));
        assert_eq!(bullet_content("2) content here"), Some("content here"));
        assert_eq!(bullet_content("3.) content here"), Some("content here"));
        // decimal numbers and plain prose are not bullets
        assert_eq!(bullet_content("3.14159 is not a bullet"), None);
        assert_eq!(bullet_content("plain prose line"), None);
    }

    #[test]
    fn two_title_scenario() {
        let summaries = extract_summaries(TWO_TITLES);
        assert_eq!(summaries.len(), 2);
        assert!(summaries[0].starts_with("Atomic Habits – Small habits compound over time"));
        assert!(summaries[1].starts_with("Deep Work – Focused work without distraction"));
    }

    #[test]
    fn short_first_point_pulls_in_second() {
        let summaries = extract_summaries(TWO_TITLES);
        assert_eq!(
            summaries[0],
            "Atomic Habits – Small habits compound over time. \
             Identity change drives lasting change"
        );
    }

    #[test]
    fn wrapped_bullet_merges_continuation_line() {
        let text = "The Pragmatic Programmer by Hunt and Thomas\n\
            1. Care about your craft and think\n\
            about your work while doing it\n";
        let summaries = extract_summaries(text);
        assert_eq!(summaries.len(), 1);
        assert!(summaries[0].contains("think about your work"));
    }

    #[test]
    fn section_numbering_is_stripped_from_book_name() {
        let text = "2.1 Atomic Habits by James Clear\n\
            1. Tiny changes deliver remarkable results over the long run\n";
        let summaries = extract_summaries(text);
        assert!(summaries[0].starts_with("Atomic Habits – "));
    }

    #[test]
    fn body_is_capped_at_150_with_ellipsis() {
        let long_point = format!("1. {}", "x".repeat(300));
        let text = format!("Some Long Enough Title by An Author\n{long_point}\n");
        let summaries = extract_summaries(&text);
        assert_eq!(summaries.len(), 1);
        let body = summaries[0]
            .split_once(" – ")
            .map(|(_, body)| body)
            .unwrap();
        assert!(body.ends_with("..."));
        assert_eq!(body.trim_end_matches('.').chars().count(), 150);
    }

    #[test]
    fn title_without_points_yields_nothing() {
        let text = "Atomic Habits by James Clear\n\
            just prose with no numbered points following the title\n";
        // prose line is merged nowhere, no points collected
        assert!(extract_summaries(text)
            .iter()
            .all(|s| !s.starts_with("Atomic Habits –")));
    }

    #[test]
    fn anchor_pass_extracts_colon_delimited_body() {
        let text = "Deep Work: the ability to focus without distraction\n\
            on a cognitively demanding task\n\nOther text.";
        let summaries = extract_summaries(text);
        assert_eq!(summaries.len(), 1);
        assert!(summaries[0].starts_with("Deep Work – the ability to focus"));
        assert!(summaries[0].contains("cognitively demanding task"));
        assert!(summaries[0].ends_with("..."));
    }

    #[test]
    fn anchor_pass_skips_exact_duplicates() {
        let block = "Atomic Habits: tiny changes bring remarkable results";
        let text = format!("{block}\n\n{block}\n");
        let summaries = extract_summaries(&text);
        assert_eq!(summaries.len(), 1);
    }

    #[test]
    fn fallback_only_when_structured_passes_find_nothing() {
        let text = "This paragraph talks at length about a book on good habits \
                    and the principles behind them, well past fifty characters.\n\n\
                    Too short.\n\n\
                    A second paragraph about the author and the rules they propose, \
                    also comfortably past the fifty character threshold.";
        let summaries = extract_summaries(text);
        assert_eq!(summaries.len(), 2);
        assert!(summaries.iter().all(|s| s.ends_with("...")));
        // fallback bodies are capped at 200 before the ellipsis
        assert!(summaries
            .iter()
            .all(|s| s.trim_end_matches('.').chars().count() <= 200));
    }

    #[test]
    fn fallback_stops_after_ten_paragraphs() {
        let paragraph = "A paragraph that mentions a book and stretches itself \
                         comfortably past the fifty character minimum.";
        let text = vec![paragraph; 15].join("\n\n");
        assert_eq!(extract_summaries(&text).len(), 10);
    }

    #[test]
    fn fallback_ignores_keyword_free_paragraphs() {
        let text = "A long paragraph about nothing in particular that still \
                    manages to exceed the fifty character minimum easily.";
        assert!(extract_summaries(text).is_empty());
    }

    #[test]
    fn extraction_is_idempotent() {
        let mut extractor = SummaryExtractor::from_text(TWO_TITLES);
        let first = extractor.extract().unwrap().to_vec();
        let second = extractor.extract().unwrap().to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn random_summary_comes_from_the_extracted_set() {
        let mut extractor = SummaryExtractor::from_text(TWO_TITLES);
        let expected = extractor.summaries().unwrap().to_vec();
        for _ in 0..20 {
            let pick = extractor.random_summary().unwrap();
            assert!(expected.contains(&pick));
        }
    }

    #[test]
    fn empty_input_yields_the_sentinel() {
        let mut extractor = SummaryExtractor::from_text("");
        assert_eq!(extractor.random_summary().unwrap(), NO_SUMMARIES);
        assert!(extractor.summaries().unwrap().is_empty());
    }

    #[test]
    fn case_insensitive_search_helper() {
        assert_eq!(find_ascii_ci("Atomic Habits BY James", " by ", 0), Some(13));
        assert_eq!(find_ascii_ci("abc", "xyz", 0), None);
        assert_eq!(find_ascii_ci("by by", " by ", 3), None);
    }
}
