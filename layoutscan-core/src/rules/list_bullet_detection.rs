use super::engine::LineTypeRule;
use super::list_run::{is_transparent, ListCollector, ListRun};
use super::registry::BulletRegistry;
use crate::config::ListBulletConfig;
use crate::error::Result;
use crate::types::{Document, LineType};

// ListBulletDetectionRule - runs of aligned lines opened by the same bullet glyph
pub struct ListBulletDetectionRule<'a> {
    registry: &'a BulletRegistry,
    config: &'a ListBulletConfig,
}

impl<'a> ListBulletDetectionRule<'a> {
    pub fn new(registry: &'a BulletRegistry, config: &'a ListBulletConfig) -> Self {
        Self { registry, config }
    }
}

impl<'a> LineTypeRule for ListBulletDetectionRule<'a> {
    fn apply(&mut self, document: &mut Document) -> Result<()> {
        let tolerance = self.config.tolerance_llx;
        let mut collector = ListCollector::new(LineType::ListBullet, self.config.min_entries);

        for (page_index, page) in document.pages.iter().enumerate() {
            for (line_index, line) in page.lines.iter().enumerate() {
                if !line.line_type.is_body() {
                    if !is_transparent(line.line_type) {
                        collector.finish();
                    }
                    continue;
                }
                if line.text.trim().is_empty() || self.registry.is_anti_pattern(&line.text) {
                    collector.finish();
                    continue;
                }

                let position = (page_index, line_index);
                match self.registry.match_rule(line.first_token()) {
                    Some(rule_index) => {
                        let continues = collector.current().is_some_and(|run| {
                            run.rule_index == rule_index && run.is_aligned(line.llx, tolerance)
                        });
                        if continues {
                            if let Some(run) = collector.current_mut() {
                                run.entries.push(position);
                            }
                        } else {
                            collector.start(ListRun::open(rule_index, line.llx, "", position));
                        }
                    }
                    None => match collector.current_mut() {
                        Some(run) if run.is_continuation(line.llx, tolerance) => {
                            run.continuations.push(position);
                        }
                        _ => collector.finish(),
                    },
                }
            }
        }

        let (lists, lines) = collector.apply(document);
        document.counts.no_lists_bullet += lists;
        log::info!("Bulleted list detection: {} lists, {} lines", lists, lines);
        Ok(())
    }
}
