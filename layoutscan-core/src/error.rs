//! Error types for layoutscan-core.
//!
//! Every variant is fatal for the document being processed: the builder and
//! the classifiers perform no recovery, the caller marks the document failed.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for layoutscan-core operations.
pub type Result<T> = std::result::Result<T, LayoutError>;

#[derive(Error, Debug)]
pub enum LayoutError {
    /// I/O error when reading input or writing output files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The TETML input is not well-formed XML.
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// JSON (de)serialization failed (rule files, output views).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration could not be parsed.
    #[error("YAML config error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A rule or anti-pattern carries an invalid regular expression.
    #[error("Invalid regexp: {0}")]
    Regex(#[from] regex::Error),

    /// A rule override file is configured but does not exist.
    #[error("Rule file not found: {}", .0.display())]
    RuleFileNotFound(PathBuf),

    /// A rule file names a comparator that does not exist.
    #[error("Unknown ascending comparator '{name}' in rule '{rule}'")]
    UnknownComparator { rule: String, name: String },

    /// A numbered rule was loaded without any ascending comparator.
    #[error("Rule '{0}' has no ascending comparator (functionIsAsc)")]
    MissingComparator(String),

    /// The XML root is neither `TET` nor `Document`.
    #[error("Unexpected root element '{0}', expected TET or Document")]
    UnexpectedRoot(String),

    /// A structurally required child element is absent.
    #[error("<{parent}> without required <{child}> element")]
    MissingElement {
        parent: &'static str,
        child: &'static str,
    },

    /// A required attribute is absent.
    #[error("<{element}> without required attribute '{attribute}'")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    /// An attribute could not be cast to the expected number type.
    #[error("<{element}> attribute '{attribute}' is not numeric: '{value}'")]
    InvalidAttribute {
        element: &'static str,
        attribute: &'static str,
        value: String,
    },
}
