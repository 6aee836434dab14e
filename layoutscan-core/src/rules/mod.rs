// Line-type rules - delegates to semantic sub-modules
// - registry.rs / numbering.rs: rule tables, anti-patterns and ascending comparators
// - engine.rs: LineTypeEngine and the LineTypeRule trait
// - one module per classifier, listed in execution order below

pub mod engine;
pub mod numbering;
pub mod registry;

pub mod header_footer_detection;
pub mod toc_detection;
pub mod table_detection;
pub mod heading_detection;
pub mod list_bullet_detection;
pub mod list_number_detection;

mod list_run;

pub use engine::*;
pub use heading_detection::{HeadingToc, RuleHierarchyEntry, TocEntry};
pub use registry::{BulletRegistry, RuleFile, RuleRegistry};
