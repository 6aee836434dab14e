use super::engine::LineTypeRule;
use super::registry::RuleRegistry;
use crate::config::HeadingConfig;
use crate::error::Result;
use crate::types::{first_token, Document, LineType};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::HashMap;

/// One open heading level.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleHierarchyEntry {
    /// Index into the registry's rule table
    pub rule_index: usize,
    /// 1-based heading level
    pub level: u32,
    /// llx of the line that opened this level
    pub anchor_llx: f32,
    /// Last accepted numbering target at this level
    pub predecessor: String,
}

/// A heading occurrence for the table-of-contents export.
#[derive(Debug, Clone, PartialEq)]
pub struct TocEntry {
    pub level: u32,
    pub text: String,
    pub page_no: u32,
    /// Following body lines, padded with "" up to the configured count
    pub context: Vec<String>,
    pub regexp: Option<String>,
}

impl Serialize for TocEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let len = 3 + self.context.len() + usize::from(self.regexp.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("headingLevel", &self.level)?;
        map.serialize_entry("headingText", &self.text)?;
        map.serialize_entry("pageNo", &self.page_no)?;
        for (index, line) in self.context.iter().enumerate() {
            map.serialize_entry(&format!("headingCtxLine{}", index + 1), line)?;
        }
        if let Some(regexp) = &self.regexp {
            map.serialize_entry("regexp", regexp)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingToc {
    pub document_id: String,
    pub document_file_name: String,
    pub toc: Vec<TocEntry>,
}

// HeadingDetectionRule - numbering-rule hierarchy over the body lines of a document
pub struct HeadingDetectionRule<'a> {
    registry: &'a RuleRegistry,
    config: &'a HeadingConfig,
    hierarchy: Vec<RuleHierarchyEntry>,
    toc: Vec<TocEntry>,
    /// (page index, line index) of each TOC entry, for the context pass
    positions: Vec<(usize, usize)>,
}

impl<'a> HeadingDetectionRule<'a> {
    pub fn new(registry: &'a RuleRegistry, config: &'a HeadingConfig) -> Self {
        Self {
            registry,
            config,
            hierarchy: Vec::new(),
            toc: Vec::new(),
            positions: Vec::new(),
        }
    }

    /// Currently open levels, shallowest first.
    pub fn hierarchy(&self) -> &[RuleHierarchyEntry] {
        &self.hierarchy
    }

    pub fn toc_entries(&self) -> &[TocEntry] {
        &self.toc
    }

    /// Heading TOC of the last processed document.
    pub fn heading_toc(&self, document: &Document) -> HeadingToc {
        HeadingToc {
            document_id: document.document_id.clone(),
            document_file_name: document.file_name.clone(),
            toc: self.toc.clone(),
        }
    }

    /// Heading level for one line, or `None` when it stays body text.
    /// Updates the open hierarchy as a side effect.
    pub fn classify_line(&mut self, text: &str, llx: f32) -> Option<(u32, usize)> {
        let registry = self.registry;
        if let Some(anti_pattern) = registry.anti_pattern_match(text) {
            log::trace!("'{}' rejected by anti-pattern {}", text, anti_pattern.name);
            return None;
        }
        let first = first_token(text);

        for depth in (0..self.hierarchy.len()).rev() {
            let entry = &self.hierarchy[depth];
            let rule = &registry.rules[entry.rule_index];
            let target = rule.target(text, first);

            if !rule.matches(target) {
                continue;
            }
            if !rule.is_ascending(&entry.predecessor, target) {
                if rule.is_valid_start(target) {
                    // A restart is opened as a new level below
                    break;
                }
                continue;
            }
            if !is_aligned(entry.anchor_llx, llx, self.config.tolerance_llx) {
                return None;
            }

            let (level, rule_index) = (entry.level, entry.rule_index);
            self.hierarchy[depth].predecessor = target.to_string();
            self.hierarchy.truncate(depth + 1);
            return Some((level, rule_index));
        }

        let level = self.hierarchy.len() as u32 + 1;
        if level > self.config.max_level {
            return None;
        }

        let (rule_index, rule) = registry.rules.iter().enumerate().find(|(_, rule)| {
            let target = rule.target(text, first);
            rule.matches(target) && rule.is_valid_start(target)
        })?;

        self.hierarchy.push(RuleHierarchyEntry {
            rule_index,
            level,
            anchor_llx: llx,
            predecessor: rule.target(text, first).to_string(),
        });
        Some((level, rule_index))
    }

    fn collect_context(&mut self, document: &Document) {
        let wanted = self.config.toc_context_lines;
        for (entry, &(page_index, line_index)) in self.toc.iter_mut().zip(&self.positions) {
            let mut context: Vec<String> = document.pages[page_index..]
                .iter()
                .enumerate()
                .flat_map(|(offset, page)| {
                    let start = if offset == 0 { line_index + 1 } else { 0 };
                    page.lines[start..].iter()
                })
                .filter(|line| line.line_type.is_body())
                .take(wanted)
                .map(|line| line.text.clone())
                .collect();
            context.resize(wanted, String::new());
            entry.context = context;
        }
    }
}

impl<'a> LineTypeRule for HeadingDetectionRule<'a> {
    fn apply(&mut self, document: &mut Document) -> Result<()> {
        self.hierarchy.clear();
        self.toc.clear();
        self.positions.clear();

        if document.pages.len() < self.config.min_pages || self.config.max_level == 0 {
            log::debug!(
                "Heading detection skipped: {} pages (min {}), max level {}",
                document.pages.len(),
                self.config.min_pages,
                self.config.max_level
            );
            return Ok(());
        }

        for (page_index, page) in document.pages.iter_mut().enumerate() {
            let mut paragraph_lines: HashMap<u32, usize> = HashMap::new();
            for line in &page.lines {
                *paragraph_lines.entry(line.paragraph_no).or_default() += 1;
            }

            for (line_index, line) in page.lines.iter_mut().enumerate() {
                // Headings are single-line paragraphs with more than one token
                if !line.line_type.is_body()
                    || line.text.trim() == line.first_token()
                    || paragraph_lines[&line.paragraph_no] > 1
                {
                    continue;
                }
                if let Some((level, rule_index)) = self.classify_line(&line.text, line.llx) {
                    line.line_type = LineType::Heading(level);
                    let regexp = if self.config.toc_include_regexp {
                        Some(self.registry.rules[rule_index].regex.as_str().to_string())
                    } else {
                        None
                    };
                    self.toc.push(TocEntry {
                        level,
                        text: line.text.clone(),
                        page_no: page.page_no,
                        context: Vec::new(),
                        regexp,
                    });
                    self.positions.push((page_index, line_index));
                }
            }
        }

        self.collect_context(document);
        document.counts.no_headings += self.toc.len() as u32;

        log::info!(
            "Heading detection: {} headings, {} levels open at end of document",
            self.toc.len(),
            self.hierarchy.len()
        );
        Ok(())
    }
}

/// A continuation may sit at the anchor or be indented by up to
/// `tolerance` percent of it, never to its left.
pub fn is_aligned(anchor_llx: f32, llx: f32, tolerance: f32) -> bool {
    llx >= anchor_llx && llx <= anchor_llx * (1.0 + tolerance / 100.0)
}
