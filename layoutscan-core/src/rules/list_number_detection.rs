use super::engine::LineTypeRule;
use super::list_run::{is_transparent, ListCollector, ListRun};
use super::registry::RuleRegistry;
use crate::config::ListNumberConfig;
use crate::error::Result;
use crate::types::{Document, LineType};

// ListNumberDetectionRule - aligned entries with ascending enumerators under one numbering rule
pub struct ListNumberDetectionRule<'a> {
    registry: &'a RuleRegistry,
    config: &'a ListNumberConfig,
}

impl<'a> ListNumberDetectionRule<'a> {
    pub fn new(registry: &'a RuleRegistry, config: &'a ListNumberConfig) -> Self {
        Self { registry, config }
    }

    /// First rule for which the line can open a new list.
    fn opening_rule(&self, text: &str, first_token: &str) -> Option<usize> {
        self.registry.rules.iter().position(|rule| {
            let target = rule.target(text, first_token);
            rule.matches(target) && rule.is_valid_start(target)
        })
    }
}

impl<'a> LineTypeRule for ListNumberDetectionRule<'a> {
    fn apply(&mut self, document: &mut Document) -> Result<()> {
        let tolerance = self.config.tolerance_llx;
        let mut collector = ListCollector::new(LineType::ListNumber, self.config.min_entries);

        for (page_index, page) in document.pages.iter().enumerate() {
            for (line_index, line) in page.lines.iter().enumerate() {
                if !line.line_type.is_body() {
                    if !is_transparent(line.line_type) {
                        collector.finish();
                    }
                    continue;
                }
                let text = line.text.trim();
                if text.is_empty() || self.registry.anti_pattern_match(text).is_some() {
                    collector.finish();
                    continue;
                }

                let position = (page_index, line_index);
                let first_token = line.first_token();

                if let Some(run) = collector.current_mut() {
                    let rule = &self.registry.rules[run.rule_index];
                    let target = rule.target(text, first_token);
                    if rule.matches(target)
                        && rule.is_ascending(&run.predecessor, target)
                        && run.is_aligned(line.llx, tolerance)
                    {
                        run.predecessor = target.to_string();
                        run.entries.push(position);
                        continue;
                    }
                }

                if let Some(rule_index) = self.opening_rule(text, first_token) {
                    let target = self.registry.rules[rule_index].target(text, first_token);
                    collector.start(ListRun::open(rule_index, line.llx, target, position));
                    continue;
                }

                match collector.current_mut() {
                    Some(run) if run.is_continuation(line.llx, tolerance) => {
                        run.continuations.push(position);
                    }
                    _ => collector.finish(),
                }
            }
        }

        let (lists, lines) = collector.apply(document);
        document.counts.no_lists_number += lists;
        log::info!("Numbered list detection: {} lists, {} lines", lists, lines);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Line, Page};

    fn page(page_no: u32, lines: &[(&str, f32)]) -> Page {
        let mut page = Page::new(page_no);
        for (index, (text, llx)) in lines.iter().enumerate() {
            let no = index as u32 + 1;
            page.lines.push(Line::new(no, no, *llx, 500.0, text));
        }
        page
    }

    fn run(pages: Vec<Page>) -> Document {
        let mut doc = Document::new("doc-1", "steps.pdf");
        doc.pages = pages;
        let registry = RuleRegistry::list_number_defaults();
        let config = ListNumberConfig::default();
        ListNumberDetectionRule::new(&registry, &config)
            .apply(&mut doc)
            .unwrap();
        doc
    }

    fn types(doc: &Document) -> Vec<LineType> {
        doc.lines().map(|(_, line)| line.line_type).collect()
    }

    #[test]
    fn test_ascending_entries_with_continuation() {
        let doc = run(vec![page(
            1,
            &[
                ("Proceed as follows:", 72.0),
                ("a) remove the cover", 80.0),
                ("carefully", 95.0),
                ("b) disconnect the cable", 80.0),
                ("c) replace the fuse", 80.0),
                ("Done.", 72.0),
            ],
        )]);
        assert_eq!(
            types(&doc),
            vec![
                LineType::Body,
                LineType::ListNumber,
                LineType::ListNumber,
                LineType::ListNumber,
                LineType::ListNumber,
                LineType::Body,
            ]
        );
        assert_eq!(doc.counts.no_lists_number, 1);
    }

    #[test]
    fn test_restart_closes_the_running_list() {
        let doc = run(vec![page(
            1,
            &[
                ("(1) first", 80.0),
                ("(2) second", 80.0),
                ("(1) again", 80.0),
                ("(2) and again", 80.0),
            ],
        )]);
        assert_eq!(doc.count_line_type(LineType::ListNumber), 4);
        assert_eq!(doc.counts.no_lists_number, 2);
    }

    #[test]
    fn test_gaps_misalignment_and_anti_patterns() {
        let doc = run(vec![page(
            1,
            &[
                ("1) start", 80.0),
                ("3) skipped two", 80.0),
                ("i) roman", 80.0),
                ("ii) roman shifted", 120.0),
                ("12.05.2023 dated entry", 80.0),
            ],
        )]);
        assert_eq!(doc.count_line_type(LineType::ListNumber), 0);
        assert_eq!(doc.counts.no_lists_number, 0);
    }

    #[test]
    fn test_roman_list_across_pages() {
        let mut first = page(1, &[("i. scope", 80.0), ("ii. terms", 80.0), ("Page 1", 300.0)]);
        first.lines[2].line_type = LineType::Footer;
        let doc = run(vec![first, page(2, &[("iii. usage", 80.0)])]);
        assert_eq!(doc.count_line_type(LineType::ListNumber), 3);
        assert_eq!(doc.counts.no_lists_number, 1);
    }
}
