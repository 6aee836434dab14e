// Layoutscan Core Library
//
// Turns layout-aware PDF text extraction (TETML) into a normalized document
// model and classifies every line: body, header, footer, heading, list, table
// or table of contents.

pub mod config;
pub mod error;
pub mod output;
pub mod processor;
pub mod rules;
pub mod tetml;
pub mod types;

// Re-export main types and functions for easy use
pub use config::ParsingConfig;
pub use error::{LayoutError, Result};
pub use processor::{DocumentProcessor, ProcessedDocument, StepProfiler, StepTiming};
pub use rules::{HeadingToc, LineTypeEngine, RuleKind, RuleRegistry, TocEntry};
pub use tetml::{build_document, parse_tetml, LayoutBuilder};
pub use types::*;
