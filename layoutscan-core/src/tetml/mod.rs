//! TETML input: XML reading and the layout model builder

pub mod builder;
pub mod element;

pub use builder::{build_document, LayoutBuilder};
pub use element::{parse_tetml, Element, ElementKind};
