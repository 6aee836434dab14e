//! Rule registry: ordered, immutable tables of anti-patterns and numbering
//! rules, built in or loaded from a JSON override file.
//!
//! Override file shape:
//!
//! ```json
//! {
//!   "lineTypeAntiPatterns": [{ "name": "DATE", "regexp": "^\\d{1,2}\\.\\d{1,2}\\." }],
//!   "lineTypeRules": [{
//!     "name": "(999)", "isFirstToken": true, "regexp": "^\\(\\d+\\)$",
//!     "functionIsAsc": "is_asc_string_integers", "startValues": ["(1)"]
//!   }]
//! }
//! ```

use super::numbering::{Comparator, NumberingFamily, NumberingStyle};
use crate::error::{LayoutError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_true() -> bool {
    true
}

// ===== RULE FILE FORMAT =====

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleFile {
    #[serde(default)]
    pub line_type_anti_patterns: Vec<AntiPatternEntry>,
    #[serde(default)]
    pub line_type_rules: Vec<RuleEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AntiPatternEntry {
    pub name: String,
    pub regexp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleEntry {
    pub name: String,
    #[serde(default = "default_true")]
    pub is_first_token: bool,
    pub regexp: String,
    /// Comparator name; bullet rule files leave it out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_is_asc: Option<String>,
    #[serde(default)]
    pub start_values: Vec<String>,
}

impl RuleFile {
    /// Read a rule file. A configured file that does not exist is fatal.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(LayoutError::RuleFileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

// ===== COMPILED RULES =====

#[derive(Debug, Clone)]
pub struct AntiPattern {
    pub name: String,
    pub regex: Regex,
}

impl AntiPattern {
    pub fn new(name: &str, pattern: &str) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            regex: Regex::new(pattern)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    /// Match against the first token (true) or the whole line (false)
    pub is_first_token: bool,
    pub regex: Regex,
    pub comparator: Comparator,
    pub start_values: Vec<String>,
    pub style: NumberingStyle,
}

impl Rule {
    /// Built-in rule: pattern and start value derive from family and style.
    pub fn builtin(name: &str, family: NumberingFamily, style: NumberingStyle) -> Self {
        let comparator = if style.is_first_token() {
            Comparator::new(family)
        } else {
            Comparator::token(family)
        };
        Self {
            name: name.to_string(),
            is_first_token: style.is_first_token(),
            regex: Regex::new(&style.pattern(family))
                .expect("built-in numbering patterns are valid"),
            comparator,
            start_values: vec![style.start_value(family)],
            style,
        }
    }

    fn from_entry(entry: &RuleEntry) -> Result<Self> {
        let comparator_name = entry
            .function_is_asc
            .as_deref()
            .ok_or_else(|| LayoutError::MissingComparator(entry.name.clone()))?;
        let comparator =
            Comparator::from_name(comparator_name).ok_or_else(|| LayoutError::UnknownComparator {
                rule: entry.name.clone(),
                name: comparator_name.to_string(),
            })?;
        Ok(Self {
            name: entry.name.clone(),
            is_first_token: entry.is_first_token,
            regex: Regex::new(&entry.regexp)?,
            comparator,
            start_values: entry.start_values.clone(),
            style: NumberingStyle::Custom,
        })
    }

    fn to_entry(&self) -> RuleEntry {
        RuleEntry {
            name: self.name.clone(),
            is_first_token: self.is_first_token,
            regexp: self.regex.as_str().to_string(),
            function_is_asc: Some(self.comparator.name()),
            start_values: self.start_values.clone(),
        }
    }

    /// The part of a line this rule looks at.
    pub fn target<'a>(&self, text: &'a str, first_token: &'a str) -> &'a str {
        if self.is_first_token {
            first_token
        } else {
            text
        }
    }

    pub fn matches(&self, target: &str) -> bool {
        self.regex.is_match(target)
    }

    pub fn is_ascending(&self, predecessor: &str, candidate: &str) -> bool {
        self.comparator.is_ascending(predecessor, candidate)
    }

    /// Can `target` open a new sequence of this rule?
    ///
    /// Numeric first tokens qualify when their fractional part equals that
    /// of a start value, so `2.` restarts a `1.` sequence and `2.1` opens a
    /// `.1` level but `1.12` does not. Other first tokens must equal a start
    /// value. Whole-line rules accept any target beginning with a start-value
    /// prefix.
    pub fn is_valid_start(&self, target: &str) -> bool {
        if !self.is_first_token {
            return self
                .start_values
                .iter()
                .any(|prefix| target.starts_with(prefix.as_str()));
        }

        if let Some(value) = parse_outline_number(target) {
            let fraction = fractional_part(value);
            return self
                .start_values
                .iter()
                .filter_map(|start| parse_outline_number(start))
                .any(|start| (fractional_part(start) - fraction).abs() < 1e-9);
        }

        self.start_values.iter().any(|start| start == target)
    }
}

/// Numeric targets: digits with at most one period, e.g. `2.`, `3`, `1.10`.
fn parse_outline_number(text: &str) -> Option<f64> {
    let digits = text.bytes().filter(u8::is_ascii_digit).count();
    let periods = text.bytes().filter(|&b| b == b'.').count();
    if digits == 0 || periods > 1 || digits + periods != text.len() {
        return None;
    }
    text.parse().ok()
}

fn fractional_part(value: f64) -> f64 {
    value - value.floor()
}

// ===== REGISTRIES =====

/// Anti-patterns plus numbering rules, ordered from most to least specific.
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    pub anti_patterns: Vec<AntiPattern>,
    pub rules: Vec<Rule>,
}

impl RuleRegistry {
    /// Use the override file when configured, the built-in table otherwise.
    pub fn load(rule_file: Option<&Path>, defaults: fn() -> Self) -> Result<Self> {
        match rule_file {
            Some(path) => {
                let registry = Self::from_rule_file(&RuleFile::from_file(path)?)?;
                log::info!(
                    "Loaded {} rules and {} anti-patterns from {}",
                    registry.rules.len(),
                    registry.anti_patterns.len(),
                    path.display()
                );
                Ok(registry)
            }
            None => Ok(defaults()),
        }
    }

    pub fn from_rule_file(file: &RuleFile) -> Result<Self> {
        let anti_patterns = file
            .line_type_anti_patterns
            .iter()
            .map(|entry| AntiPattern::new(&entry.name, &entry.regexp))
            .collect::<Result<Vec<_>>>()?;
        let rules = file
            .line_type_rules
            .iter()
            .map(Rule::from_entry)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            anti_patterns,
            rules,
        })
    }

    pub fn to_rule_file(&self) -> RuleFile {
        RuleFile {
            line_type_anti_patterns: self
                .anti_patterns
                .iter()
                .map(|ap| AntiPatternEntry {
                    name: ap.name.clone(),
                    regexp: ap.regex.as_str().to_string(),
                })
                .collect(),
            line_type_rules: self.rules.iter().map(Rule::to_entry).collect(),
        }
    }

    /// First anti-pattern matching the text, if any.
    pub fn anti_pattern_match(&self, text: &str) -> Option<&AntiPattern> {
        self.anti_patterns.iter().find(|ap| ap.regex.is_match(text))
    }

    /// Built-in heading table: every family and style, most specific first.
    pub fn heading_defaults() -> Self {
        let mut rules = Self::first_token_numbering_rules();

        for (name, fraction_digits) in [("999.9", 1), ("999.99", 2), ("999.999", 3)] {
            rules.push(Rule::builtin(
                name,
                NumberingFamily::Decimal,
                NumberingStyle::Outline { fraction_digits },
            ));
        }

        use NumberingFamily::*;
        for (name, family) in [
            ("999 Aa", Integer),
            ("A Aa", UpperLetter),
            ("ROM Aa", UpperRoman),
            ("a Aa", LowerLetter),
            ("rom Aa", LowerRoman),
        ] {
            rules.push(Rule::builtin(name, family, NumberingStyle::BareTitle));
        }

        Self {
            anti_patterns: default_anti_patterns(),
            rules,
        }
    }

    /// Built-in numbered-list table: decorated first-token forms only.
    pub fn list_number_defaults() -> Self {
        Self {
            anti_patterns: default_anti_patterns(),
            rules: Self::first_token_numbering_rules(),
        }
    }

    fn first_token_numbering_rules() -> Vec<Rule> {
        use NumberingFamily::*;
        use NumberingStyle::*;

        let table = [
            ("(999)", Integer, Parenthesized),
            ("(A)", UpperLetter, Parenthesized),
            ("(a)", LowerLetter, Parenthesized),
            ("(ROM)", UpperRoman, Parenthesized),
            ("(rom)", LowerRoman, Parenthesized),
            ("[999]", Integer, Bracketed),
            ("[A]", UpperLetter, Bracketed),
            ("[ROM]", UpperRoman, Bracketed),
            ("[a]", LowerLetter, Bracketed),
            ("[rom]", LowerRoman, Bracketed),
            ("999)", Integer, ClosingParen),
            ("999.", Integer, Period),
            ("A)", UpperLetter, ClosingParen),
            ("A.", UpperLetter, Period),
            ("a)", LowerLetter, ClosingParen),
            ("a.", LowerLetter, Period),
            ("ROM)", UpperRoman, ClosingParen),
            ("ROM.", UpperRoman, Period),
            ("rom)", LowerRoman, ClosingParen),
            ("rom.", LowerRoman, Period),
        ];

        table
            .iter()
            .map(|(name, family, style)| Rule::builtin(name, *family, *style))
            .collect()
    }
}

fn default_anti_patterns() -> Vec<AntiPattern> {
    let table = [
        ("DATE", r"^\d{1,2}\.\d{1,2}\.\d{2,4}"),
        ("TIME", r"^\d{1,2}:\d{2}"),
        ("PAGE_OF", r"(?i)^page\s+\d+\s*(of|/)\s*\d+"),
        ("AMOUNT", r"^\d{1,3}([.,]\d{3})+[.,]\d{2}\b"),
        ("PERCENT", r"^\d+([.,]\d+)?\s*%"),
    ];
    table
        .iter()
        .map(|(name, pattern)| AntiPattern {
            name: name.to_string(),
            regex: Regex::new(pattern).expect("built-in anti-patterns are valid"),
        })
        .collect()
}

/// Bullet symbols matched against the first token of a line.
#[derive(Debug, Clone)]
pub struct BulletRule {
    pub name: String,
    pub regex: Regex,
}

#[derive(Debug, Clone)]
pub struct BulletRegistry {
    pub anti_patterns: Vec<AntiPattern>,
    pub rules: Vec<BulletRule>,
}

impl BulletRegistry {
    pub fn load(rule_file: Option<&Path>) -> Result<Self> {
        let Some(path) = rule_file else {
            return Ok(Self::defaults());
        };
        let file = RuleFile::from_file(path)?;
        let anti_patterns = file
            .line_type_anti_patterns
            .iter()
            .map(|entry| AntiPattern::new(&entry.name, &entry.regexp))
            .collect::<Result<Vec<_>>>()?;
        let rules = file
            .line_type_rules
            .iter()
            .map(|entry| {
                Ok(BulletRule {
                    name: entry.name.clone(),
                    regex: Regex::new(&entry.regexp)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            anti_patterns,
            rules,
        })
    }

    pub fn defaults() -> Self {
        let table = [
            ("BULLET", "^•$"),
            ("BLACK_CIRCLE", "^●$"),
            ("WHITE_BULLET", "^◦$"),
            ("SMALL_SQUARE", "^▪$"),
            ("SQUARE", "^■$"),
            ("POINTER", "^►$"),
            ("ARROWHEAD", "^➢$"),
            ("CHECK", "^✓$"),
            ("HYPHEN", "^-$"),
            ("EN_DASH", "^–$"),
            ("ASTERISK", r"^\*$"),
            ("LETTER_O", "^o$"),
            // Symbol-font bullets land in the private use area
            ("SYMBOL_FONT", "^[\u{F0A7}\u{F0B7}\u{F0D8}]$"),
        ];
        Self {
            anti_patterns: Vec::new(),
            rules: table
                .iter()
                .map(|(name, pattern)| BulletRule {
                    name: name.to_string(),
                    regex: Regex::new(pattern).expect("built-in bullet patterns are valid"),
                })
                .collect(),
        }
    }

    /// Index of the first bullet rule matching the token.
    pub fn match_rule(&self, first_token: &str) -> Option<usize> {
        self.rules.iter().position(|rule| rule.regex.is_match(first_token))
    }

    pub fn is_anti_pattern(&self, text: &str) -> bool {
        self.anti_patterns.iter().any(|ap| ap.regex.is_match(text))
    }
}
