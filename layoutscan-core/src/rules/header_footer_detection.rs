use super::engine::LineTypeRule;
use crate::config::HeaderFooterConfig;
use crate::error::Result;
use crate::types::{Document, LineType, Page};
use std::collections::HashSet;

// HeaderFooterDetectionRule - running page furniture repeated at the same position on neighbouring pages
pub struct HeaderFooterDetectionRule<'a> {
    config: &'a HeaderFooterConfig,
}

/// A header or footer candidate: line index on the page plus its text.
type Candidate<'d> = (usize, &'d str);

impl<'a> HeaderFooterDetectionRule<'a> {
    pub fn new(config: &'a HeaderFooterConfig) -> Self {
        Self { config }
    }

    /// First `max_lines_header` non-empty lines, top down.
    fn header_candidates<'d>(&self, page: &'d Page) -> Vec<Candidate<'d>> {
        page.lines
            .iter()
            .enumerate()
            .filter(|(_, line)| !line.text.trim().is_empty())
            .take(self.config.max_lines_header)
            .map(|(index, line)| (index, line.text.trim()))
            .collect()
    }

    /// Last `max_lines_footer` non-empty lines, bottom up.
    fn footer_candidates<'d>(&self, page: &'d Page) -> Vec<Candidate<'d>> {
        page.lines
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, line)| !line.text.trim().is_empty())
            .take(self.config.max_lines_footer)
            .map(|(index, line)| (index, line.text.trim()))
            .collect()
    }

    fn is_similar(&self, a: &str, b: &str) -> bool {
        strsim::levenshtein(a, b) <= self.config.max_distance
    }

    /// Line indices per page whose candidate repeats on the previous or next page.
    fn repeated(&self, candidates: &[Vec<Candidate<'_>>]) -> Vec<HashSet<usize>> {
        let mut marked = vec![HashSet::new(); candidates.len()];
        for (page_index, page_candidates) in candidates.iter().enumerate() {
            for (position, (line_index, text)) in page_candidates.iter().enumerate() {
                let neighbours = [page_index.checked_sub(1), Some(page_index + 1)];
                let repeats = neighbours
                    .iter()
                    .flatten()
                    .filter_map(|&other| candidates.get(other))
                    .filter_map(|other| other.get(position))
                    .any(|(_, other_text)| self.is_similar(text, other_text));
                if repeats {
                    marked[page_index].insert(*line_index);
                }
            }
        }
        marked
    }
}

impl<'a> LineTypeRule for HeaderFooterDetectionRule<'a> {
    fn apply(&mut self, document: &mut Document) -> Result<()> {
        if document.pages.len() < self.config.min_pages {
            log::debug!(
                "Header/footer detection skipped: {} pages (min {})",
                document.pages.len(),
                self.config.min_pages
            );
            return Ok(());
        }

        let (headers, footers) = {
            let header_candidates: Vec<_> = document
                .pages
                .iter()
                .map(|page| self.header_candidates(page))
                .collect();
            let footer_candidates: Vec<_> = document
                .pages
                .iter()
                .map(|page| self.footer_candidates(page))
                .collect();
            (
                self.repeated(&header_candidates),
                self.repeated(&footer_candidates),
            )
        };

        let mut header_lines = 0u32;
        let mut footer_lines = 0u32;
        for (page_index, page) in document.pages.iter_mut().enumerate() {
            for (line_index, line) in page.lines.iter_mut().enumerate() {
                if !line.line_type.is_body() {
                    continue;
                }
                if headers[page_index].contains(&line_index) {
                    line.line_type = LineType::Header;
                    header_lines += 1;
                } else if footers[page_index].contains(&line_index) {
                    line.line_type = LineType::Footer;
                    footer_lines += 1;
                }
            }
        }

        document.counts.no_lines_header += header_lines;
        document.counts.no_lines_footer += footer_lines;
        log::info!(
            "Header/footer detection: {} header lines, {} footer lines",
            header_lines,
            footer_lines
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Line;

    fn page(page_no: u32, texts: &[&str]) -> Page {
        let mut page = Page::new(page_no);
        for (index, text) in texts.iter().enumerate() {
            let no = index as u32 + 1;
            page.lines.push(Line::new(no, no, 72.0, 500.0, text));
        }
        page
    }

    fn document(pages: Vec<Page>) -> Document {
        let mut document = Document::new("doc-1", "manual.pdf");
        document.pages = pages;
        document
    }

    #[test]
    fn test_running_header_and_page_number_footer() {
        let mut doc = document(vec![
            page(1, &["ACME Installation Manual", "Safety comes first.", "Page 1"]),
            page(2, &["ACME Installation Manual", "Mount the bracket on the wall.", "Page 2"]),
            page(3, &["ACME Installation Manual", "Connect power last.", "Page 3"]),
        ]);
        let config = HeaderFooterConfig {
            max_lines_header: 1,
            max_lines_footer: 1,
            ..HeaderFooterConfig::default()
        };
        HeaderFooterDetectionRule::new(&config).apply(&mut doc).unwrap();

        for page in &doc.pages {
            assert_eq!(page.lines[0].line_type, LineType::Header);
            assert_eq!(page.lines[1].line_type, LineType::Body);
            assert_eq!(page.lines[2].line_type, LineType::Footer);
        }
        assert_eq!(doc.counts.no_lines_header, 3);
        assert_eq!(doc.counts.no_lines_footer, 3);
    }

    #[test]
    fn test_distinct_first_lines_stay_body() {
        let mut doc = document(vec![
            page(1, &["Chapter one begins here", "text"]),
            page(2, &["A completely different opening", "more text"]),
        ]);
        let config = HeaderFooterConfig {
            max_lines_header: 1,
            max_lines_footer: 0,
            ..HeaderFooterConfig::default()
        };
        HeaderFooterDetectionRule::new(&config).apply(&mut doc).unwrap();
        assert_eq!(doc.count_line_type(LineType::Header), 0);
    }

    #[test]
    fn test_single_page_is_skipped_and_empty_lines_ignored() {
        let mut single = document(vec![page(1, &["Title", "Page 1"])]);
        let config = HeaderFooterConfig::default();
        HeaderFooterDetectionRule::new(&config).apply(&mut single).unwrap();
        assert_eq!(single.count_line_type(LineType::Body), 2);

        // Footer positions are counted over non-empty lines only
        let mut doc = document(vec![
            page(1, &["Intro text", "Report 2024", ""]),
            page(2, &["Other words entirely", "Report 2024"]),
        ]);
        let config = HeaderFooterConfig {
            max_lines_header: 0,
            max_lines_footer: 1,
            ..HeaderFooterConfig::default()
        };
        HeaderFooterDetectionRule::new(&config).apply(&mut doc).unwrap();
        assert_eq!(doc.pages[0].lines[1].line_type, LineType::Footer);
        assert_eq!(doc.pages[0].lines[2].line_type, LineType::Body);
        assert_eq!(doc.pages[1].lines[1].line_type, LineType::Footer);
    }
}
