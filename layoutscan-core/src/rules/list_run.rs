//! Shared bookkeeping for the list classifiers: a list is a sequence of
//! aligned entry lines plus the indented continuation lines between them.

use super::heading_detection::is_aligned;
use crate::types::{Document, LineType};

/// (page index, line index)
pub(crate) type LinePosition = (usize, usize);

#[derive(Debug, Clone)]
pub(crate) struct ListRun {
    /// Index of the rule that opened the list
    pub rule_index: usize,
    pub anchor_llx: f32,
    /// Last accepted numbering token (unused for bullets)
    pub predecessor: String,
    pub entries: Vec<LinePosition>,
    pub continuations: Vec<LinePosition>,
}

impl ListRun {
    pub fn open(rule_index: usize, anchor_llx: f32, predecessor: &str, at: LinePosition) -> Self {
        Self {
            rule_index,
            anchor_llx,
            predecessor: predecessor.to_string(),
            entries: vec![at],
            continuations: Vec::new(),
        }
    }

    pub fn is_aligned(&self, llx: f32, tolerance: f32) -> bool {
        is_aligned(self.anchor_llx, llx, tolerance)
    }

    /// Continuation text sits to the right of the entry marker.
    pub fn is_continuation(&self, llx: f32, tolerance: f32) -> bool {
        llx > self.anchor_llx * (1.0 + tolerance / 100.0)
    }
}

/// Collects finished runs and classifies those long enough to be lists.
pub(crate) struct ListCollector {
    line_type: LineType,
    min_entries: usize,
    current: Option<ListRun>,
    lists: u32,
    lines: u32,
    finished: Vec<ListRun>,
}

impl ListCollector {
    pub fn new(line_type: LineType, min_entries: usize) -> Self {
        Self {
            line_type,
            min_entries,
            current: None,
            lists: 0,
            lines: 0,
            finished: Vec::new(),
        }
    }

    pub fn current(&self) -> Option<&ListRun> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut ListRun> {
        self.current.as_mut()
    }

    pub fn start(&mut self, run: ListRun) {
        self.finish();
        self.current = Some(run);
    }

    pub fn finish(&mut self) {
        if let Some(run) = self.current.take() {
            if run.entries.len() >= self.min_entries {
                self.finished.push(run);
            }
        }
    }

    /// Classify the collected lists; returns (lists, lines).
    pub fn apply(mut self, document: &mut Document) -> (u32, u32) {
        self.finish();
        for run in &self.finished {
            self.lists += 1;
            for &(page_index, line_index) in run.entries.iter().chain(&run.continuations) {
                let line = &mut document.pages[page_index].lines[line_index];
                if line.line_type.is_body() {
                    line.line_type = self.line_type;
                    self.lines += 1;
                }
            }
        }
        (self.lists, self.lines)
    }
}

/// Page furniture does not interrupt a list running across a page break.
pub(crate) fn is_transparent(line_type: LineType) -> bool {
    matches!(line_type, LineType::Header | LineType::Footer)
}
