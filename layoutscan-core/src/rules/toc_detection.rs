use super::engine::LineTypeRule;
use crate::config::TocConfig;
use crate::error::Result;
use crate::types::{Document, Line, LineType};
use std::collections::BTreeMap;

// TocDetectionRule - table of contents on the first pages, as page-numbered lines or as a table
pub struct TocDetectionRule<'a> {
    config: &'a TocConfig,
}

/// Lines of one candidate run, as (page index, line index).
type Run = Vec<(usize, usize)>;

impl<'a> TocDetectionRule<'a> {
    pub fn new(config: &'a TocConfig) -> Self {
        Self { config }
    }

    /// Trailing page reference of a TOC line such as `2. Method ..... 14`.
    fn page_reference(text: &str, page_count: u32) -> Option<u32> {
        let mut tokens = text.split_whitespace();
        let last = tokens.next_back()?;
        tokens.next_back()?;
        let number = last.trim_start_matches('.').parse::<u32>().ok()?;
        (1..=page_count).contains(&number).then_some(number)
    }

    fn cell_page_reference(text: &str, page_count: u32) -> Option<u32> {
        let number = text.split_whitespace().next_back()?.parse::<u32>().ok()?;
        (1..=page_count).contains(&number).then_some(number)
    }

    /// Runs of body lines with non-decreasing trailing page numbers.
    fn line_runs(&self, document: &Document) -> Vec<Run> {
        let page_count = document.pages.len() as u32;
        let mut runs = Vec::new();
        let mut current: Run = Vec::new();
        let mut last_reference = 0u32;

        for (page_index, page) in document.pages.iter().enumerate() {
            if page.page_no > self.config.last_page {
                break;
            }
            for (line_index, line) in page.lines.iter().enumerate() {
                if line.table_cell.is_some() {
                    continue;
                }
                match Self::page_reference(&line.text, page_count) {
                    Some(reference) if line.line_type.is_body() => {
                        if reference < last_reference {
                            runs.push(std::mem::take(&mut current));
                        }
                        current.push((page_index, line_index));
                        last_reference = reference;
                    }
                    _ if matches!(line.line_type, LineType::Header | LineType::Footer) => {}
                    _ => {
                        runs.push(std::mem::take(&mut current));
                        last_reference = 0;
                    }
                }
            }
        }
        runs.push(current);
        runs
    }

    /// Tables whose last column holds non-decreasing page numbers.
    fn table_runs(&self, document: &Document) -> Vec<Run> {
        let page_count = document.pages.len() as u32;

        // table -> row -> (column, lines)
        let mut tables: BTreeMap<u32, BTreeMap<u32, Vec<(u32, usize, usize)>>> = BTreeMap::new();
        for (page_index, page) in document.pages.iter().enumerate() {
            if page.page_no > self.config.last_page {
                break;
            }
            for (line_index, line) in page.lines.iter().enumerate() {
                if let Some(cell) = line.table_cell {
                    tables
                        .entry(cell.table_no)
                        .or_default()
                        .entry(cell.row_no)
                        .or_default()
                        .push((cell.column_no, page_index, line_index));
                }
            }
        }

        let mut runs = Vec::new();
        for rows in tables.values() {
            let mut references = 0usize;
            let mut last_reference = 0u32;
            for cells in rows.values() {
                let Some(last_column) = cells.iter().map(|(column, _, _)| *column).max() else {
                    continue;
                };
                let reference = cells
                    .iter()
                    .filter(|(column, _, _)| *column == last_column)
                    .find_map(|(_, p, l)| {
                        Self::cell_page_reference(&line_at(document, *p, *l).text, page_count)
                    });
                if let Some(reference) = reference {
                    if reference >= last_reference {
                        references += 1;
                        last_reference = reference;
                    }
                }
            }
            if references >= self.config.min_entries {
                runs.push(
                    rows.values()
                        .flatten()
                        .map(|(_, p, l)| (*p, *l))
                        .filter(|(p, l)| line_at(document, *p, *l).line_type.is_body())
                        .collect(),
                );
            }
        }
        runs
    }
}

fn line_at(document: &Document, page_index: usize, line_index: usize) -> &Line {
    &document.pages[page_index].lines[line_index]
}

impl<'a> LineTypeRule for TocDetectionRule<'a> {
    fn apply(&mut self, document: &mut Document) -> Result<()> {
        let mut runs: Vec<Run> = self
            .line_runs(document)
            .into_iter()
            .filter(|run| run.len() >= self.config.min_entries)
            .collect();
        runs.extend(self.table_runs(document));

        let mut toc_lines = 0u32;
        for (page_index, line_index) in runs.into_iter().flatten() {
            let line = &mut document.pages[page_index].lines[line_index];
            if line.line_type.is_body() {
                line.line_type = LineType::Toc;
                toc_lines += 1;
            }
        }

        document.counts.no_lines_toc += toc_lines;
        log::info!("TOC detection: {} lines", toc_lines);
        Ok(())
    }
}
