//! Layout model builder
//!
//! Walks a parsed TETML tree once and produces the `Document` model. All
//! cursor state (page, paragraph, line, table position) lives in a
//! `TraversalState` that is threaded through the recursion, so a builder can
//! be reused for any number of documents.

use crate::error::{LayoutError, Result};
use crate::tetml::element::{Element, ElementKind};
use crate::types::{
    Bookmark, BuildStats, Document, Granularity, Line, LineType, Page, TableCell, Word,
};

/// Position of the traversal inside the current page.
#[derive(Debug, Clone, Default)]
struct TraversalState {
    paragraph_no: u32,
    /// A `Para` is open but has not emitted a line yet
    paragraph_pending: bool,
    in_paragraph: bool,
    line_no_page: u32,
    line_no_paragraph: u32,
    page_words: u32,
    table_no: u32,
    table: TablePosition,
}

#[derive(Debug, Clone, Copy, Default)]
struct TablePosition {
    row_no: u32,
    column_no: u32,
    prev_span: u32,
    cell: Option<TableCell>,
    cell_lines: u32,
}

/// Horizontal extent inherited from the innermost enclosing `Box`.
#[derive(Debug, Clone, Copy, Default)]
struct Extent {
    llx: Option<f32>,
    urx: Option<f32>,
}

pub struct LayoutBuilder {
    granularity: Granularity,
}

impl Default for LayoutBuilder {
    fn default() -> Self {
        Self::new(Granularity::Line)
    }
}

impl LayoutBuilder {
    pub fn new(granularity: Granularity) -> Self {
        Self { granularity }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Build the document model from a `TET` wrapper or a bare `Document` root.
    pub fn build(
        &self,
        root: &Element,
        document_id: &str,
        file_name: &str,
    ) -> Result<(Document, BuildStats)> {
        let document_element = match &root.kind {
            ElementKind::Tet => root.child(&ElementKind::Document).ok_or(
                LayoutError::MissingElement {
                    parent: "TET",
                    child: "Document",
                },
            )?,
            ElementKind::Document => root,
            other => return Err(LayoutError::UnexpectedRoot(other.name().to_string())),
        };

        let mut document = Document::new(document_id, file_name);
        let mut state = TraversalState::default();

        let pages = document_element
            .child(&ElementKind::Pages)
            .ok_or(LayoutError::MissingElement {
                parent: "Document",
                child: "Pages",
            })?;

        for page_element in pages.children_of_kind(&ElementKind::Page) {
            let page_no = match page_element.u32_attribute("Page", "number")? {
                Some(number) => number,
                None => document.counts.no_pages + 1,
            };
            let page = self.build_page(page_element, page_no, &mut state)?;

            // Page totals fold into the document when the page closes
            document.counts.no_pages += 1;
            document.counts.no_paragraphs += page.no_paragraphs;
            document.counts.no_lines += page.no_lines;
            document.counts.no_words += page.no_words;
            document.pages.push(page);
        }

        if let Some(bookmarks) = document_element.child(&ElementKind::Bookmarks) {
            collect_bookmarks(bookmarks, 1, &mut document.bookmarks);
        }

        let stats = BuildStats {
            no_pages: document.counts.no_pages,
            no_paragraphs: document.counts.no_paragraphs,
            no_lines: document.counts.no_lines,
            no_words: document.counts.no_words,
        };

        log::info!(
            "Built layout model for '{}': {} pages, {} paragraphs, {} lines, {} words, {} tables",
            document.file_name,
            stats.no_pages,
            stats.no_paragraphs,
            stats.no_lines,
            stats.no_words,
            state.table_no
        );

        Ok((document, stats))
    }

    fn build_page(
        &self,
        page_element: &Element,
        page_no: u32,
        state: &mut TraversalState,
    ) -> Result<Page> {
        let content = page_element
            .child(&ElementKind::Content)
            .ok_or(LayoutError::MissingElement {
                parent: "Page",
                child: "Content",
            })?;

        // Page-relative counters restart, the table number runs through the document
        state.paragraph_no = 0;
        state.paragraph_pending = false;
        state.in_paragraph = false;
        state.line_no_page = 0;
        state.line_no_paragraph = 0;
        state.page_words = 0;
        state.table = TablePosition::default();

        let mut page = Page::new(page_no);
        for child in &content.children {
            self.visit(child, Extent::default(), state, &mut page)?;
        }

        page.no_paragraphs = state.paragraph_no;
        page.no_lines = state.line_no_page;
        page.no_words = state.page_words;

        log::debug!(
            "Page {}: {} paragraphs, {} lines",
            page_no,
            page.no_paragraphs,
            page.no_lines
        );
        Ok(page)
    }

    fn visit(
        &self,
        element: &Element,
        extent: Extent,
        state: &mut TraversalState,
        page: &mut Page,
    ) -> Result<()> {
        match element.kind {
            ElementKind::Para => {
                let outer = (state.in_paragraph, state.paragraph_pending);
                state.in_paragraph = true;
                state.paragraph_pending = true;
                for child in &element.children {
                    self.visit(child, extent, state, page)?;
                }
                (state.in_paragraph, state.paragraph_pending) = outer;
            }
            ElementKind::Box => {
                let extent = Extent {
                    llx: element.f32_attribute("Box", "llx")?.or(extent.llx),
                    urx: element.f32_attribute("Box", "urx")?.or(extent.urx),
                };
                if is_word_box(element) {
                    self.emit_line(element, "Box", extent, state, page)?;
                } else {
                    for child in &element.children {
                        self.visit(child, extent, state, page)?;
                    }
                }
            }
            ElementKind::Line => {
                self.emit_line(element, "Line", extent, state, page)?;
            }
            ElementKind::Table => {
                self.visit_table(element, state, page)?;
            }
            // Text and Word outside a line, DocInfo and anything informational
            _ => {}
        }
        Ok(())
    }

    fn visit_table(
        &self,
        table: &Element,
        state: &mut TraversalState,
        page: &mut Page,
    ) -> Result<()> {
        state.table_no += 1;
        let table_no = state.table_no;
        let outer = state.table;
        let lines_before = state.line_no_page;
        let outer_paragraph = (state.in_paragraph, state.paragraph_pending);
        state.in_paragraph = false;
        state.paragraph_pending = false;
        state.table = TablePosition::default();

        for row in table.children_of_kind(&ElementKind::Row) {
            state.table.row_no += 1;
            state.table.column_no = 0;
            state.table.prev_span = 1;

            for cell in row.children_of_kind(&ElementKind::Cell) {
                let span = cell.u32_attribute("Cell", "colSpan")?.unwrap_or(1);
                state.table.column_no += state.table.prev_span;
                state.table.prev_span = span;
                state.table.cell = Some(TableCell {
                    table_no,
                    row_no: state.table.row_no,
                    column_no: state.table.column_no,
                    column_span: (span > 1).then_some(span),
                });
                state.table.cell_lines = 0;

                for child in &cell.children {
                    self.visit(child, Extent::default(), state, page)?;
                }

                if state.table.cell_lines == 0 {
                    self.emit_placeholder(cell, state, page)?;
                }
            }
        }

        // Lines of a nested table fill the enclosing cell
        state.table = outer;
        state.table.cell_lines += state.line_no_page - lines_before;
        (state.in_paragraph, state.paragraph_pending) = outer_paragraph;
        Ok(())
    }

    fn emit_line(
        &self,
        element: &Element,
        element_name: &'static str,
        extent: Extent,
        state: &mut TraversalState,
        page: &mut Page,
    ) -> Result<()> {
        let llx = element
            .f32_attribute(element_name, "llx")?
            .or(extent.llx)
            .ok_or(LayoutError::MissingAttribute {
                element: element_name,
                attribute: "llx",
            })?;
        let urx = element
            .f32_attribute(element_name, "urx")?
            .or(extent.urx)
            .ok_or(LayoutError::MissingAttribute {
                element: element_name,
                attribute: "urx",
            })?;

        let word_texts = word_texts(element);
        let text = match element.child(&ElementKind::Text) {
            Some(text) => text.text.clone(),
            None if !word_texts.is_empty() => word_texts.join(" "),
            None => element.text.clone(),
        };

        let words: Vec<String> = if word_texts.is_empty() {
            text.split_whitespace().map(str::to_string).collect()
        } else {
            word_texts
        };

        self.open_paragraph_for_line(state);
        state.line_no_page += 1;
        state.line_no_paragraph += 1;
        state.page_words += words.len() as u32;
        state.table.cell_lines += 1;

        let materialized = if self.granularity == Granularity::Word {
            words
                .into_iter()
                .enumerate()
                .map(|(index, text)| Word {
                    word_no: index as u32 + 1,
                    text,
                })
                .collect()
        } else {
            Vec::new()
        };

        page.lines.push(Line {
            line_no_page: state.line_no_page,
            paragraph_no: state.paragraph_no,
            line_no: state.line_no_paragraph,
            llx,
            urx,
            text,
            line_type: LineType::Body,
            table_cell: state.table.cell,
            words: materialized,
        });
        Ok(())
    }

    /// An empty cell still occupies one paragraph and one line.
    fn emit_placeholder(
        &self,
        cell: &Element,
        state: &mut TraversalState,
        page: &mut Page,
    ) -> Result<()> {
        let llx = cell.f32_attribute("Cell", "llx")?.unwrap_or(0.0);
        let urx = cell.f32_attribute("Cell", "urx")?.unwrap_or(0.0);

        state.paragraph_no += 1;
        state.line_no_page += 1;
        state.line_no_paragraph = 1;

        page.lines.push(Line {
            line_no_page: state.line_no_page,
            paragraph_no: state.paragraph_no,
            line_no: 1,
            llx,
            urx,
            text: String::new(),
            line_type: LineType::Body,
            table_cell: state.table.cell,
            words: Vec::new(),
        });
        Ok(())
    }

    fn open_paragraph_for_line(&self, state: &mut TraversalState) {
        if state.in_paragraph {
            if state.paragraph_pending {
                state.paragraph_no += 1;
                state.line_no_paragraph = 0;
                state.paragraph_pending = false;
            }
        } else {
            // A line outside any Para is a paragraph of its own
            state.paragraph_no += 1;
            state.line_no_paragraph = 0;
        }
    }
}

/// Convenience wrapper around `LayoutBuilder`.
pub fn build_document(
    root: &Element,
    document_id: &str,
    file_name: &str,
    granularity: Granularity,
) -> Result<(Document, BuildStats)> {
    LayoutBuilder::new(granularity).build(root, document_id, file_name)
}

fn is_word_box(element: &Element) -> bool {
    element.has_child(&ElementKind::Word) && !element.has_child(&ElementKind::Line)
}

fn word_texts(element: &Element) -> Vec<String> {
    element
        .children_of_kind(&ElementKind::Word)
        .map(|word| match word.child(&ElementKind::Text) {
            Some(text) => text.text.clone(),
            None => word.text.clone(),
        })
        .filter(|text| !text.is_empty())
        .collect()
}

fn collect_bookmarks(parent: &Element, level: u32, out: &mut Vec<Bookmark>) {
    for bookmark in parent.children_of_kind(&ElementKind::Bookmark) {
        if let Some(title) = bookmark.child(&ElementKind::Title) {
            out.push(Bookmark {
                level,
                title: title.text.trim().to_string(),
            });
        }
        collect_bookmarks(bookmark, level + 1, out);
    }
}
