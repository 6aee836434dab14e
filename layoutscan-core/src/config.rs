use crate::error::Result;
use crate::rules::RULE_ORDER;
use crate::types::Granularity;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsingConfig {
    /// Output view and auxiliary exports
    #[serde(default)]
    pub output: OutputConfig,
    /// Which line-type rules run (the order itself is fixed)
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub header_footer: HeaderFooterConfig,
    #[serde(default)]
    pub toc: TocConfig,
    #[serde(default)]
    pub heading: HeadingConfig,
    #[serde(default)]
    pub list_bullet: ListBulletConfig,
    #[serde(default)]
    pub list_number: ListNumberConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// line, page or word - mutually exclusive views
    #[serde(default)]
    pub granularity: Granularity,
    /// Also write the heading table-of-contents JSON
    #[serde(default = "default_false")]
    pub heading_toc: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::Line,
            heading_toc: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Rules and their enabled flags
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Name of the rule
    pub name: String,
    /// Whether this rule is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl PipelineConfig {
    /// Rules not mentioned in the config stay enabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.rules
            .iter()
            .find(|rule| rule.name == name)
            .map(|rule| rule.enabled)
            .unwrap_or(true)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rules: RULE_ORDER
                .iter()
                .map(|kind| RuleConfig {
                    name: kind.name().to_string(),
                    enabled: true,
                })
                .collect(),
        }
    }
}

fn default_max_lines_header() -> usize {
    3
}

fn default_max_lines_footer() -> usize {
    3
}

fn default_max_distance() -> usize {
    3 // Levenshtein edits, covers running page numbers
}

fn default_header_footer_min_pages() -> usize {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderFooterConfig {
    /// Lines from the top of each page that may be headers
    #[serde(default = "default_max_lines_header")]
    pub max_lines_header: usize,
    /// Lines from the bottom of each page that may be footers
    #[serde(default = "default_max_lines_footer")]
    pub max_lines_footer: usize,
    /// Maximum edit distance between matching lines on neighbouring pages
    #[serde(default = "default_max_distance")]
    pub max_distance: usize,
    /// Minimum page count before running
    #[serde(default = "default_header_footer_min_pages")]
    pub min_pages: usize,
}

impl Default for HeaderFooterConfig {
    fn default() -> Self {
        Self {
            max_lines_header: default_max_lines_header(),
            max_lines_footer: default_max_lines_footer(),
            max_distance: default_max_distance(),
            min_pages: default_header_footer_min_pages(),
        }
    }
}

fn default_toc_last_page() -> u32 {
    5
}

fn default_toc_min_entries() -> usize {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TocConfig {
    /// Only the first pages of a document may hold a table of contents
    #[serde(default = "default_toc_last_page")]
    pub last_page: u32,
    /// Minimum number of page references forming a TOC
    #[serde(default = "default_toc_min_entries")]
    pub min_entries: usize,
}

impl Default for TocConfig {
    fn default() -> Self {
        Self {
            last_page: default_toc_last_page(),
            min_entries: default_toc_min_entries(),
        }
    }
}

fn default_max_level() -> u32 {
    3
}

fn default_heading_min_pages() -> usize {
    2
}

fn default_tolerance_llx() -> f32 {
    5.0 // percent of the anchor llx
}

fn default_toc_context_lines() -> usize {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadingConfig {
    /// Deepest heading level that may be opened (0 disables headings)
    #[serde(default = "default_max_level")]
    pub max_level: u32,
    /// Minimum page count before heading detection runs
    #[serde(default = "default_heading_min_pages")]
    pub min_pages: usize,
    /// Horizontal alignment tolerance in percent of the anchor llx
    #[serde(default = "default_tolerance_llx")]
    pub tolerance_llx: f32,
    /// Trailing body lines captured per heading in the TOC export
    #[serde(default = "default_toc_context_lines")]
    pub toc_context_lines: usize,
    /// Include the matched regexp in TOC entries
    #[serde(default = "default_false")]
    pub toc_include_regexp: bool,
    /// JSON override for the built-in rules and anti-patterns
    #[serde(default)]
    pub rule_file: Option<PathBuf>,
}

impl Default for HeadingConfig {
    fn default() -> Self {
        Self {
            max_level: default_max_level(),
            min_pages: default_heading_min_pages(),
            tolerance_llx: default_tolerance_llx(),
            toc_context_lines: default_toc_context_lines(),
            toc_include_regexp: false,
            rule_file: None,
        }
    }
}

fn default_list_min_entries() -> usize {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListBulletConfig {
    #[serde(default = "default_list_min_entries")]
    pub min_entries: usize,
    #[serde(default = "default_tolerance_llx")]
    pub tolerance_llx: f32,
    #[serde(default)]
    pub rule_file: Option<PathBuf>,
}

impl Default for ListBulletConfig {
    fn default() -> Self {
        Self {
            min_entries: default_list_min_entries(),
            tolerance_llx: default_tolerance_llx(),
            rule_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListNumberConfig {
    #[serde(default = "default_list_min_entries")]
    pub min_entries: usize,
    #[serde(default = "default_tolerance_llx")]
    pub tolerance_llx: f32,
    #[serde(default)]
    pub rule_file: Option<PathBuf>,
}

impl Default for ListNumberConfig {
    fn default() -> Self {
        Self {
            min_entries: default_list_min_entries(),
            tolerance_llx: default_tolerance_llx(),
            rule_file: None,
        }
    }
}

impl ParsingConfig {
    /// Load config from a YAML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ParsingConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load the given file, or the defaults when no path is configured
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_file(p),
            None => Ok(Self::default()),
        }
    }
}
