//! Numbering families and their ascending comparators.
//!
//! A comparator answers one question: is `candidate` the immediate successor
//! of `predecessor` inside its numbering family? Both strings are assumed to
//! already match the pattern of the rule that owns the comparator.

use crate::types::first_token;
use regex::Regex;
use std::sync::LazyLock;

static DIGITS_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

static DECIMAL_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+\.\d+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberingFamily {
    Integer,
    UpperLetter,
    LowerLetter,
    UpperRoman,
    LowerRoman,
    /// Outline numbers such as 1.1, 2.13
    Decimal,
}

impl NumberingFamily {
    pub fn is_ascending(&self, predecessor: &str, candidate: &str) -> bool {
        match self {
            NumberingFamily::Integer => is_asc_string_integers(predecessor, candidate),
            NumberingFamily::UpperLetter => is_asc_uppercase_letters(predecessor, candidate),
            NumberingFamily::LowerLetter => is_asc_lowercase_letters(predecessor, candidate),
            NumberingFamily::UpperRoman | NumberingFamily::LowerRoman => {
                is_asc_romans(predecessor, candidate)
            }
            NumberingFamily::Decimal => is_asc_string_floats(predecessor, candidate),
        }
    }

    /// Regex fragment for one numbering token of this family.
    fn token_pattern(&self) -> &'static str {
        match self {
            NumberingFamily::Integer => r"\d+",
            NumberingFamily::UpperLetter => r"[A-Z]",
            NumberingFamily::LowerLetter => r"[a-z]",
            NumberingFamily::UpperRoman => r"[IVXLCDM]+",
            NumberingFamily::LowerRoman => r"[ivxlcdm]+",
            NumberingFamily::Decimal => r"\d+\.\d+",
        }
    }

    /// First value of a fresh sequence.
    fn first_value(&self) -> &'static str {
        match self {
            NumberingFamily::Integer => "1",
            NumberingFamily::UpperLetter => "A",
            NumberingFamily::LowerLetter => "a",
            NumberingFamily::UpperRoman => "I",
            NumberingFamily::LowerRoman => "i",
            NumberingFamily::Decimal => "1.1",
        }
    }
}

/// Family comparator, optionally restricted to the first token of each
/// string (used by whole-line rules).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Comparator {
    pub family: NumberingFamily,
    pub token_scoped: bool,
}

impl Comparator {
    pub fn new(family: NumberingFamily) -> Self {
        Self {
            family,
            token_scoped: false,
        }
    }

    pub fn token(family: NumberingFamily) -> Self {
        Self {
            family,
            token_scoped: true,
        }
    }

    pub fn is_ascending(&self, predecessor: &str, candidate: &str) -> bool {
        if self.token_scoped {
            self.family
                .is_ascending(first_token(predecessor), first_token(candidate))
        } else {
            self.family.is_ascending(predecessor, candidate)
        }
    }

    /// Resolve a rule-file comparator name such as `is_asc_romans_token`.
    /// The `is_asc_` prefix is optional.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        let name = name.strip_prefix("is_asc_").unwrap_or(name);
        let (base, token_scoped) = match name.strip_suffix("_token") {
            Some(base) => (base, true),
            None => (name, false),
        };
        let family = match base {
            "string_integers" => NumberingFamily::Integer,
            "uppercase_letters" => NumberingFamily::UpperLetter,
            "lowercase_letters" => NumberingFamily::LowerLetter,
            "romans" => NumberingFamily::UpperRoman,
            "string_floats" => NumberingFamily::Decimal,
            _ => return None,
        };
        Some(Self {
            family,
            token_scoped,
        })
    }

    pub fn name(&self) -> String {
        let base = match self.family {
            NumberingFamily::Integer => "is_asc_string_integers",
            NumberingFamily::UpperLetter => "is_asc_uppercase_letters",
            NumberingFamily::LowerLetter => "is_asc_lowercase_letters",
            NumberingFamily::UpperRoman | NumberingFamily::LowerRoman => "is_asc_romans",
            NumberingFamily::Decimal => "is_asc_string_floats",
        };
        if self.token_scoped {
            format!("{base}_token")
        } else {
            base.to_string()
        }
    }
}

/// How a numbering token is decorated on the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberingStyle {
    /// (1) (a) (iv)
    Parenthesized,
    /// [1] [a] [iv]
    Bracketed,
    /// 1) a) iv)
    ClosingParen,
    /// 1. a. iv.
    Period,
    /// 1.1 / 1.12 / 1.123 with a fixed number of fraction digits
    Outline { fraction_digits: usize },
    /// Bare token followed by a capitalized word, matched on the whole line
    BareTitle,
    /// Loaded from a rule file, pattern given verbatim
    Custom,
}

impl NumberingStyle {
    /// Whole-line styles match against the full text instead of the first token.
    pub fn is_first_token(&self) -> bool {
        !matches!(self, NumberingStyle::BareTitle)
    }

    /// Anchored regexp for this style applied to a family.
    pub fn pattern(&self, family: NumberingFamily) -> String {
        let token = family.token_pattern();
        match self {
            NumberingStyle::Parenthesized => format!(r"^\({token}\)$"),
            NumberingStyle::Bracketed => format!(r"^\[{token}\]$"),
            NumberingStyle::ClosingParen => format!(r"^{token}\)$"),
            NumberingStyle::Period => format!(r"^{token}\.$"),
            NumberingStyle::Outline { fraction_digits } => {
                format!(r"^\d+\.\d{{{fraction_digits}}}$")
            }
            NumberingStyle::BareTitle => format!(r"^{token}\s+[A-Z]"),
            NumberingStyle::Custom => token.to_string(),
        }
    }

    /// The value (or, for whole-line rules, the prefix) opening a new sequence.
    pub fn start_value(&self, family: NumberingFamily) -> String {
        let first = family.first_value();
        match self {
            NumberingStyle::Parenthesized => format!("({first})"),
            NumberingStyle::Bracketed => format!("[{first}]"),
            NumberingStyle::ClosingParen => format!("{first})"),
            NumberingStyle::Period => format!("{first}."),
            NumberingStyle::Outline { fraction_digits } => {
                format!("1.{}1", "0".repeat(fraction_digits.saturating_sub(1)))
            }
            NumberingStyle::BareTitle => format!("{first} "),
            NumberingStyle::Custom => first.to_string(),
        }
    }
}

// ===== ASCENDING COMPARATORS =====

fn first_integer(text: &str) -> Option<u64> {
    DIGITS_REGEX.find(text)?.as_str().parse().ok()
}

fn first_decimal(text: &str) -> Option<f64> {
    DECIMAL_REGEX.find(text)?.as_str().parse().ok()
}

fn first_letter(text: &str) -> Option<char> {
    text.chars()
        .find(|c| c.is_alphabetic())
        .and_then(|c| c.to_lowercase().next())
}

fn letter_successor(predecessor: &str, candidate: &str) -> bool {
    match (first_letter(predecessor), first_letter(candidate)) {
        (Some(p), Some(c)) => c as u32 == p as u32 + 1,
        _ => false,
    }
}

/// Parse a roman numeral in subtractive notation, ignoring surrounding
/// brackets and punctuation. Case-insensitive.
pub fn roman_to_int(text: &str) -> Option<u32> {
    let core = text.trim_matches(|c: char| !c.is_ascii_alphabetic());
    if core.is_empty() {
        return None;
    }

    let mut values = Vec::with_capacity(core.len());
    for c in core.chars() {
        let value = match c.to_ascii_uppercase() {
            'I' => 1,
            'V' => 5,
            'X' => 10,
            'L' => 50,
            'C' => 100,
            'D' => 500,
            'M' => 1000,
            _ => return None,
        };
        values.push(value);
    }

    let mut total = 0i64;
    for (i, value) in values.iter().enumerate() {
        match values.get(i + 1) {
            Some(next) if value < next => total -= *value as i64,
            _ => total += *value as i64,
        }
    }
    u32::try_from(total).ok().filter(|v| *v > 0)
}

pub fn is_asc_string_integers(predecessor: &str, candidate: &str) -> bool {
    match (first_integer(predecessor), first_integer(candidate)) {
        (Some(p), Some(c)) => p.checked_add(1) == Some(c),
        _ => false,
    }
}

pub fn is_asc_uppercase_letters(predecessor: &str, candidate: &str) -> bool {
    letter_successor(predecessor, candidate)
}

pub fn is_asc_lowercase_letters(predecessor: &str, candidate: &str) -> bool {
    letter_successor(predecessor, candidate)
}

pub fn is_asc_romans(predecessor: &str, candidate: &str) -> bool {
    match (roman_to_int(predecessor), roman_to_int(candidate)) {
        (Some(p), Some(c)) => p + 1 == c,
        _ => false,
    }
}

/// Outline numbers ascend when the candidate is larger by at most 1.
pub fn is_asc_string_floats(predecessor: &str, candidate: &str) -> bool {
    match (first_decimal(predecessor), first_decimal(candidate)) {
        (Some(p), Some(c)) => {
            let diff = c - p;
            diff > 0.0 && diff <= 1.0
        }
        _ => false,
    }
}

pub fn is_asc_string_integers_token(predecessor: &str, candidate: &str) -> bool {
    is_asc_string_integers(first_token(predecessor), first_token(candidate))
}

pub fn is_asc_uppercase_letters_token(predecessor: &str, candidate: &str) -> bool {
    is_asc_uppercase_letters(first_token(predecessor), first_token(candidate))
}

pub fn is_asc_lowercase_letters_token(predecessor: &str, candidate: &str) -> bool {
    is_asc_lowercase_letters(first_token(predecessor), first_token(candidate))
}

pub fn is_asc_romans_token(predecessor: &str, candidate: &str) -> bool {
    is_asc_romans(first_token(predecessor), first_token(candidate))
}

pub fn is_asc_string_floats_token(predecessor: &str, candidate: &str) -> bool {
    is_asc_string_floats(first_token(predecessor), first_token(candidate))
}
