use crate::config::ParsingConfig;
use crate::error::Result;
use crate::types::*;
use std::cell::RefCell;
use std::time::{Duration, Instant};

use super::header_footer_detection::HeaderFooterDetectionRule;
use super::heading_detection::{HeadingDetectionRule, HeadingToc};
use super::list_bullet_detection::ListBulletDetectionRule;
use super::list_number_detection::ListNumberDetectionRule;
use super::registry::{BulletRegistry, RuleRegistry};
use super::table_detection::TableDetectionRule;
use super::toc_detection::TocDetectionRule;

/// The line-type classifiers, named as in the `pipeline.rules` config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    HeaderFooterDetection,
    TocDetection,
    TableDetection,
    HeadingDetection,
    ListBulletDetection,
    ListNumberDetection,
}

/// Classifiers in execution order. Each one only rewrites lines still
/// typed `Body`, so earlier rules take precedence.
pub const RULE_ORDER: [RuleKind; 6] = [
    RuleKind::HeaderFooterDetection,
    RuleKind::TocDetection,
    RuleKind::TableDetection,
    RuleKind::HeadingDetection,
    RuleKind::ListBulletDetection,
    RuleKind::ListNumberDetection,
];

impl RuleKind {
    pub fn name(self) -> &'static str {
        match self {
            RuleKind::HeaderFooterDetection => "HeaderFooterDetection",
            RuleKind::TocDetection => "TocDetection",
            RuleKind::TableDetection => "TableDetection",
            RuleKind::HeadingDetection => "HeadingDetection",
            RuleKind::ListBulletDetection => "ListBulletDetection",
            RuleKind::ListNumberDetection => "ListNumberDetection",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        RULE_ORDER.into_iter().find(|kind| kind.name() == name)
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// Sequential line-type pipeline infrastructure
pub trait LineTypeRule {
    fn apply(&mut self, document: &mut Document) -> Result<()>;
}

/// Runs the line-type classifiers over a built document.
pub struct LineTypeEngine {
    heading_rules: RuleRegistry,
    list_number_rules: RuleRegistry,
    bullet_rules: BulletRegistry,
    rule_timings: RefCell<Vec<(RuleKind, Duration)>>,
}

impl LineTypeEngine {
    /// Load the rule tables, honouring any configured override files.
    pub fn new(config: &ParsingConfig) -> Result<Self> {
        let heading_rules = RuleRegistry::load(
            config.heading.rule_file.as_deref(),
            RuleRegistry::heading_defaults,
        )?;
        let list_number_rules = RuleRegistry::load(
            config.list_number.rule_file.as_deref(),
            RuleRegistry::list_number_defaults,
        )?;
        let bullet_rules = BulletRegistry::load(config.list_bullet.rule_file.as_deref())?;

        for rule in &config.pipeline.rules {
            if RuleKind::from_name(&rule.name).is_none() {
                log::warn!("Ignoring unknown rule in pipeline config: {}", rule.name);
            }
        }

        log::debug!(
            "Rule tables loaded: {} heading rules, {} numbered-list rules, {} bullet rules",
            heading_rules.rules.len(),
            list_number_rules.rules.len(),
            bullet_rules.rules.len()
        );

        Ok(Self {
            heading_rules,
            list_number_rules,
            bullet_rules,
            rule_timings: RefCell::new(Vec::new()),
        })
    }

    pub fn heading_rules(&self) -> &RuleRegistry {
        &self.heading_rules
    }

    /// Per-rule durations of the last `apply`, in execution order.
    pub fn rule_timings(&self) -> Vec<(RuleKind, Duration)> {
        self.rule_timings.borrow().clone()
    }

    /// Classify every line of the document. Returns the heading TOC when
    /// heading detection ran.
    pub fn apply(
        &self,
        document: &mut Document,
        config: &ParsingConfig,
    ) -> Result<Option<HeadingToc>> {
        log::info!(
            "Applying line-type rules to {} lines of '{}'",
            document.counts.no_lines,
            document.file_name
        );
        self.rule_timings.borrow_mut().clear();

        let mut heading_toc = None;
        for kind in RULE_ORDER {
            if !config.pipeline.is_enabled(kind.name()) {
                log::info!("Skipping disabled rule: {}", kind);
                continue;
            }

            let rule_start = Instant::now();
            self.apply_rule(kind, document, config, &mut heading_toc)?;
            let elapsed = rule_start.elapsed();
            log::debug!("{} finished in {:.1}ms", kind, elapsed.as_secs_f64() * 1000.0);
            self.rule_timings.borrow_mut().push((kind, elapsed));
        }

        Ok(heading_toc)
    }

    fn apply_rule(
        &self,
        kind: RuleKind,
        document: &mut Document,
        config: &ParsingConfig,
        heading_toc: &mut Option<HeadingToc>,
    ) -> Result<()> {
        match kind {
            RuleKind::HeaderFooterDetection => {
                HeaderFooterDetectionRule::new(&config.header_footer).apply(document)
            }
            RuleKind::TocDetection => TocDetectionRule::new(&config.toc).apply(document),
            RuleKind::TableDetection => TableDetectionRule::new().apply(document),
            RuleKind::HeadingDetection => {
                let mut rule = HeadingDetectionRule::new(&self.heading_rules, &config.heading);
                rule.apply(document)?;
                *heading_toc = Some(rule.heading_toc(document));
                Ok(())
            }
            RuleKind::ListBulletDetection => {
                ListBulletDetectionRule::new(&self.bullet_rules, &config.list_bullet)
                    .apply(document)
            }
            RuleKind::ListNumberDetection => {
                ListNumberDetectionRule::new(&self.list_number_rules, &config.list_number)
                    .apply(document)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleConfig;

    fn page(page_no: u32, lines: &[(&str, f32)]) -> Page {
        let mut page = Page::new(page_no);
        for (index, (text, llx)) in lines.iter().enumerate() {
            let no = index as u32 + 1;
            page.lines.push(Line::new(no, no, *llx, 500.0, text));
        }
        page.no_lines = lines.len() as u32;
        page
    }

    fn sample() -> Document {
        let mut doc = Document::new("doc-1", "guide.pdf");
        doc.pages = vec![
            page(
                1,
                &[
                    ("Field Guide", 200.0),
                    ("1. Overview", 72.0),
                    ("Read this first.", 72.0),
                    ("• keep it dry", 80.0),
                    ("• keep it clean", 80.0),
                    ("Page 1", 300.0),
                ],
            ),
            page(
                2,
                &[
                    ("Field Guide", 200.0),
                    ("2. Usage", 72.0),
                    ("a) open the lid", 80.0),
                    ("b) press start", 80.0),
                    ("Page 2", 300.0),
                ],
            ),
        ];
        doc.counts.no_lines = 11;
        doc
    }

    #[test]
    fn test_full_pipeline_classifies_in_order() {
        let config = ParsingConfig::default();
        let engine = LineTypeEngine::new(&config).unwrap();
        let mut doc = sample();
        let toc = engine.apply(&mut doc, &config).unwrap().unwrap();

        let page1: Vec<LineType> = doc.pages[0].lines.iter().map(|l| l.line_type).collect();
        assert_eq!(
            page1,
            vec![
                LineType::Header,
                LineType::Heading(1),
                LineType::Body,
                LineType::ListBullet,
                LineType::ListBullet,
                LineType::Footer,
            ]
        );
        let page2: Vec<LineType> = doc.pages[1].lines.iter().map(|l| l.line_type).collect();
        assert_eq!(
            page2,
            vec![
                LineType::Header,
                LineType::Heading(1),
                LineType::Heading(2),
                LineType::Heading(2),
                LineType::Footer,
            ]
        );

        assert_eq!(toc.toc.len(), 4);
        assert_eq!(doc.counts.no_lines_header, 2);
        assert_eq!(doc.counts.no_lists_bullet, 1);
        let timings = engine.rule_timings();
        assert_eq!(timings.len(), RULE_ORDER.len());
        assert_eq!(timings[3].0, RuleKind::HeadingDetection);
    }

    #[test]
    fn test_disabled_rules_are_skipped() {
        let mut config = ParsingConfig::default();
        for rule in &mut config.pipeline.rules {
            if rule.name == RuleKind::HeadingDetection.name() || rule.name == "TocDetection" {
                rule.enabled = false;
            }
        }
        config.pipeline.rules.push(RuleConfig {
            name: "SomethingElse".to_string(),
            enabled: true,
        });

        let engine = LineTypeEngine::new(&config).unwrap();
        let mut doc = sample();
        let toc = engine.apply(&mut doc, &config).unwrap();

        assert!(toc.is_none());
        assert_eq!(doc.count_line_type(LineType::Header), 2);
        assert_eq!(doc.counts.no_headings, 0);
        // Without headings the lettered items form a numbered list
        assert_eq!(doc.count_line_type(LineType::ListNumber), 2);
        let ran: Vec<RuleKind> = engine
            .rule_timings()
            .into_iter()
            .map(|(kind, _)| kind)
            .collect();
        assert_eq!(
            ran,
            vec![
                RuleKind::HeaderFooterDetection,
                RuleKind::TableDetection,
                RuleKind::ListBulletDetection,
                RuleKind::ListNumberDetection,
            ]
        );
    }

    #[test]
    fn test_rule_names_match_config_names() {
        for kind in RULE_ORDER {
            assert_eq!(RuleKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(RuleKind::from_name("SomethingElse"), None);
        assert_eq!(RuleKind::from_name("headingdetection"), None);

        let config = ParsingConfig::default();
        let configured: Vec<&str> = config
            .pipeline
            .rules
            .iter()
            .map(|rule| rule.name.as_str())
            .collect();
        let expected: Vec<&str> = RULE_ORDER.iter().map(|kind| kind.name()).collect();
        assert_eq!(configured, expected);
    }

    #[test]
    fn test_missing_rule_file_fails_engine_creation() {
        let mut config = ParsingConfig::default();
        config.heading.rule_file = Some("/nonexistent/heading_rules.json".into());
        assert!(LineTypeEngine::new(&config).is_err());
    }
}
