use super::engine::LineTypeRule;
use crate::error::Result;
use crate::types::{Document, LineType};
use std::collections::HashSet;

// TableDetectionRule - lines extracted from table cells
#[derive(Default)]
pub struct TableDetectionRule;

impl TableDetectionRule {
    pub fn new() -> Self {
        Self
    }
}

impl LineTypeRule for TableDetectionRule {
    fn apply(&mut self, document: &mut Document) -> Result<()> {
        let mut tables = HashSet::new();
        for line in document.pages.iter_mut().flat_map(|page| page.lines.iter_mut()) {
            if let (true, Some(cell)) = (line.line_type.is_body(), line.table_cell) {
                line.line_type = LineType::Table;
                tables.insert(cell.table_no);
            }
        }

        document.counts.no_tables += tables.len() as u32;
        log::info!("Table detection: {} tables", tables.len());
        Ok(())
    }
}
