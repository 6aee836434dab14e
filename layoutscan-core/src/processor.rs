use crate::config::ParsingConfig;
use crate::output::{heading_toc_file_path, view_file_path};
use crate::rules::{HeadingToc, LineTypeEngine, RuleKind};
use crate::tetml::{parse_tetml, LayoutBuilder};
use crate::types::*;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Duration of one pipeline step, with the per-rule breakdown for the
/// classification step.
#[derive(Debug, Clone)]
pub struct StepTiming {
    pub step: &'static str,
    pub duration: Duration,
    pub rules: Vec<(RuleKind, Duration)>,
}

/// Collects step timings when `--profile` is on; otherwise a no-op.
pub struct StepProfiler {
    enabled: bool,
    steps: Vec<StepTiming>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            steps: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step: &'static str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let duration = start.elapsed();
        log::debug!("{} took {:.1}ms", step, millis(duration));

        self.steps.push(StepTiming {
            step,
            duration,
            rules: Vec::new(),
        });
        result
    }

    /// Attach rule durations to the most recent step.
    pub fn attach_rules(&mut self, rules: Vec<(RuleKind, Duration)>) {
        if let Some(last) = self.steps.last_mut() {
            last.rules = rules;
        }
    }

    pub fn steps(&self) -> &[StepTiming] {
        &self.steps
    }

    pub fn total(&self) -> Duration {
        self.steps.iter().map(|timing| timing.duration).sum()
    }

    pub fn print_summary(&self) {
        if !self.enabled || self.steps.is_empty() {
            return;
        }

        let total = self.total();
        println!("\n📊 Timings:");
        for timing in &self.steps {
            let share = if total.is_zero() {
                0.0
            } else {
                timing.duration.as_secs_f64() / total.as_secs_f64() * 100.0
            };
            println!(
                "   {:<26} {:>9.1}ms {:>5.1}%",
                timing.step,
                millis(timing.duration),
                share
            );
            for (kind, duration) in &timing.rules {
                println!("     - {:<22} {:>9.1}ms", kind.name(), millis(*duration));
            }
        }
        println!("   {:<26} {:>9.1}ms", "Total", millis(total));
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Everything one run produces for a document.
#[derive(Debug)]
pub struct ProcessedDocument {
    pub document: Document,
    pub stats: BuildStats,
    /// Only present when heading detection ran
    pub heading_toc: Option<HeadingToc>,
}

pub struct DocumentProcessor {
    config: ParsingConfig,
    engine: LineTypeEngine,
}

impl DocumentProcessor {
    /// Create a processor; rule override files are loaded here.
    pub fn new(config: ParsingConfig) -> Result<Self> {
        let engine = LineTypeEngine::new(&config).context("Failed to load line-type rules")?;
        Ok(Self { config, engine })
    }

    pub fn config(&self) -> &ParsingConfig {
        &self.config
    }

    pub fn engine(&self) -> &LineTypeEngine {
        &self.engine
    }

    /// Process TETML held in memory.
    pub fn process_str(
        &self,
        xml: &str,
        document_id: &str,
        file_name: &str,
    ) -> Result<ProcessedDocument> {
        let mut profiler = StepProfiler::new(false);
        self.process_str_with_profiling(xml, document_id, file_name, &mut profiler)
    }

    pub fn process_str_with_profiling(
        &self,
        xml: &str,
        document_id: &str,
        file_name: &str,
        profiler: &mut StepProfiler,
    ) -> Result<ProcessedDocument> {
        let root = profiler
            .time_step("Parse XML", || parse_tetml(xml))
            .with_context(|| format!("Failed to parse TETML of {}", file_name))?;

        let granularity = self.config.output.granularity;
        let builder = LayoutBuilder::new(granularity);
        let (mut document, stats) = profiler
            .time_step("Build layout", || {
                builder.build(&root, document_id, file_name)
            })
            .with_context(|| format!("Failed to build layout model of {}", file_name))?;

        // Line types only exist in the line view
        let heading_toc = if granularity == Granularity::Line {
            let heading_toc = profiler
                .time_step("Classify lines", || {
                    self.engine.apply(&mut document, &self.config)
                })
                .with_context(|| format!("Failed to classify lines of {}", file_name))?;
            profiler.attach_rules(self.engine.rule_timings());
            heading_toc
        } else {
            log::debug!("Granularity {} - skipping line-type rules", granularity.as_str());
            None
        };

        log::info!(
            "Processed '{}': {} pages, {} lines, {} headings",
            file_name,
            document.counts.no_pages,
            document.counts.no_lines,
            document.counts.no_headings
        );

        Ok(ProcessedDocument {
            document,
            stats,
            heading_toc,
        })
    }

    /// Process a TETML file from disk.
    pub fn process_file(&self, input_path: &Path, document_id: &str) -> Result<ProcessedDocument> {
        let mut profiler = StepProfiler::new(false);
        self.process_file_with_profiling(input_path, document_id, &mut profiler)
    }

    pub fn process_file_with_profiling(
        &self,
        input_path: &Path,
        document_id: &str,
        profiler: &mut StepProfiler,
    ) -> Result<ProcessedDocument> {
        let xml = profiler
            .time_step("Read TETML", || std::fs::read_to_string(input_path))
            .with_context(|| format!("Failed to read {}", input_path.display()))?;

        let file_name = input_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();

        self.process_str_with_profiling(&xml, document_id, &file_name, profiler)
    }

    /// Write the configured view (and heading TOC) into `output_dir`.
    /// Returns the written paths.
    pub fn write_outputs(
        &self,
        processed: &ProcessedDocument,
        output_dir: &Path,
        stem: &str,
    ) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        let granularity = self.config.output.granularity;
        let view_path = view_file_path(output_dir, stem, granularity);
        processed
            .document
            .save_with_granularity(&view_path, granularity)
            .with_context(|| format!("Failed to write {}", view_path.display()))?;
        let mut written = vec![view_path];

        if self.config.output.heading_toc {
            match &processed.heading_toc {
                Some(toc) => {
                    let toc_path = heading_toc_file_path(output_dir, stem);
                    toc.save_to_json(&toc_path)
                        .with_context(|| format!("Failed to write {}", toc_path.display()))?;
                    written.push(toc_path);
                }
                None => log::warn!("Heading TOC requested but heading detection did not run"),
            }
        }

        Ok(written)
    }

    /// Write the active heading rule table as a rule override file.
    pub fn export_heading_rules(&self, path: &Path) -> Result<()> {
        let rule_file = self.engine.heading_rules().to_rule_file();
        let json = serde_json::to_string_pretty(&rule_file)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"<TET><Document><Pages>
<Page number="1"><Content><Para><Line llx="72" urx="300"><Text>1. Scope</Text></Line></Para></Content></Page>
<Page number="2"><Content><Para><Line llx="72" urx="300"><Text>2. Terms</Text></Line></Para></Content></Page>
</Pages></Document></TET>"#;

    #[test]
    fn test_profiler_records_only_when_enabled() {
        let mut disabled = StepProfiler::new(false);
        assert_eq!(disabled.time_step("step", || 41 + 1), 42);
        disabled.attach_rules(vec![(RuleKind::TocDetection, Duration::from_millis(1))]);
        assert!(disabled.steps().is_empty());

        let mut enabled = StepProfiler::new(true);
        enabled.time_step("step", || ());
        assert_eq!(enabled.steps().len(), 1);
        assert_eq!(enabled.total(), enabled.steps()[0].duration);
    }

    #[test]
    fn test_profiled_run_breaks_down_classification_by_rule() {
        let processor = DocumentProcessor::new(ParsingConfig::default()).unwrap();
        let mut profiler = StepProfiler::new(true);
        processor
            .process_str_with_profiling(SMALL, "id-1", "small.tetml", &mut profiler)
            .unwrap();

        let steps: Vec<&str> = profiler.steps().iter().map(|timing| timing.step).collect();
        assert_eq!(steps, vec!["Parse XML", "Build layout", "Classify lines"]);
        assert!(profiler.steps()[0].rules.is_empty());

        let rules: Vec<RuleKind> = profiler.steps()[2]
            .rules
            .iter()
            .map(|(kind, _)| *kind)
            .collect();
        assert_eq!(rules, crate::rules::RULE_ORDER.to_vec());
    }

    #[test]
    fn test_process_str_classifies_line_view() {
        let processor = DocumentProcessor::new(ParsingConfig::default()).unwrap();
        let processed = processor.process_str(SMALL, "id-1", "small.tetml").unwrap();

        assert_eq!(processed.stats.no_lines, 2);
        assert_eq!(processed.document.counts.no_headings, 2);
        assert_eq!(processed.heading_toc.unwrap().toc.len(), 2);
    }

    #[test]
    fn test_page_granularity_skips_classification() {
        let mut config = ParsingConfig::default();
        config.output.granularity = Granularity::Page;
        let processor = DocumentProcessor::new(config).unwrap();
        let processed = processor.process_str(SMALL, "id-1", "small.tetml").unwrap();

        assert!(processed.heading_toc.is_none());
        assert_eq!(processed.document.count_line_type(LineType::Body), 2);
    }

    #[test]
    fn test_malformed_input_has_context() {
        let processor = DocumentProcessor::new(ParsingConfig::default()).unwrap();
        let err = processor
            .process_str("<TET><Document>", "id-1", "broken.tetml")
            .unwrap_err();
        assert!(err.to_string().contains("broken.tetml"));
    }

    #[test]
    fn test_export_heading_rules_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heading_rules.json");
        let processor = DocumentProcessor::new(ParsingConfig::default()).unwrap();
        processor.export_heading_rules(&path).unwrap();

        let mut config = ParsingConfig::default();
        config.heading.rule_file = Some(path);
        let reloaded = DocumentProcessor::new(config).unwrap();
        assert_eq!(
            reloaded.engine().heading_rules().rules.len(),
            processor.engine().heading_rules().rules.len()
        );
    }
}
