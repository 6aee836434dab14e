//! JSON output views
//!
//! Exactly one view is written per run: `line` (classified lines), `page`
//! (paragraph texts) or `word` (word lists). The heading TOC is a separate
//! file next to the line view.

use crate::error::Result;
use crate::rules::HeadingToc;
use crate::types::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

// ===== LINE VIEW =====

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineView<'a> {
    pub document_id: &'a str,
    pub document_file_name: &'a str,
    pub no_pages_in_doc: u32,
    pub no_paragraphs_in_doc: u32,
    pub no_lines_in_doc: u32,
    pub no_headings_in_doc: u32,
    pub no_lists_bullet_in_doc: u32,
    pub no_lists_number_in_doc: u32,
    pub no_tables_in_doc: u32,
    pub no_lines_footer: u32,
    pub no_lines_header: u32,
    pub no_lines_toc: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bookmarks: Vec<&'a Bookmark>,
    pub pages: Vec<LineViewPage<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineViewPage<'a> {
    pub page_no: u32,
    pub no_paragraphs_in_page: u32,
    pub no_lines_in_page: u32,
    pub lines: Vec<LineViewLine<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineViewLine<'a> {
    #[serde(rename = "coordLLX")]
    pub coord_llx: f32,
    #[serde(rename = "coordURX")]
    pub coord_urx: f32,
    pub line_no: u32,
    pub line_no_page: u32,
    pub line_type: LineType,
    pub paragraph_no: u32,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_no: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_no: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_span: Option<u32>,
}

// ===== PAGE VIEW =====

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView<'a> {
    pub document_id: &'a str,
    pub document_file_name: &'a str,
    pub no_pages_in_doc: u32,
    pub no_paragraphs_in_doc: u32,
    pub pages: Vec<PageViewPage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageViewPage {
    pub page_no: u32,
    pub no_paragraphs_in_page: u32,
    pub paragraphs: Vec<PageViewParagraph>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageViewParagraph {
    pub paragraph_no: u32,
    pub text: String,
}

// ===== WORD VIEW =====

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordView<'a> {
    pub document_id: &'a str,
    pub document_file_name: &'a str,
    pub no_pages_in_doc: u32,
    pub no_paragraphs_in_doc: u32,
    pub no_lines_in_doc: u32,
    pub no_words_in_doc: u32,
    pub pages: Vec<WordViewPage<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordViewPage<'a> {
    pub page_no: u32,
    pub paragraphs: Vec<WordViewParagraph<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordViewParagraph<'a> {
    pub paragraph_no: u32,
    pub lines: Vec<WordViewLine<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordViewLine<'a> {
    pub line_no: u32,
    pub words: &'a [Word],
}

impl Document {
    pub fn to_line_view(&self) -> LineView<'_> {
        let pages = self
            .pages
            .iter()
            .map(|page| LineViewPage {
                page_no: page.page_no,
                no_paragraphs_in_page: page.no_paragraphs,
                no_lines_in_page: page.no_lines,
                lines: page
                    .lines
                    .iter()
                    .map(|line| LineViewLine {
                        coord_llx: line.llx,
                        coord_urx: line.urx,
                        line_no: line.line_no,
                        line_no_page: line.line_no_page,
                        line_type: line.line_type,
                        paragraph_no: line.paragraph_no,
                        text: &line.text,
                        column_no: line.table_cell.map(|cell| cell.column_no),
                        row_no: line.table_cell.map(|cell| cell.row_no),
                        column_span: line.table_cell.and_then(|cell| cell.column_span),
                    })
                    .collect(),
            })
            .collect();

        LineView {
            document_id: &self.document_id,
            document_file_name: &self.file_name,
            no_pages_in_doc: self.counts.no_pages,
            no_paragraphs_in_doc: self.counts.no_paragraphs,
            no_lines_in_doc: self.counts.no_lines,
            no_headings_in_doc: self.counts.no_headings,
            no_lists_bullet_in_doc: self.counts.no_lists_bullet,
            no_lists_number_in_doc: self.counts.no_lists_number,
            no_tables_in_doc: self.counts.no_tables,
            no_lines_footer: self.counts.no_lines_footer,
            no_lines_header: self.counts.no_lines_header,
            no_lines_toc: self.counts.no_lines_toc,
            bookmarks: self.bookmarks.iter().collect(),
            pages,
        }
    }

    pub fn to_page_view(&self) -> PageView<'_> {
        let pages = self
            .pages
            .iter()
            .map(|page| PageViewPage {
                page_no: page.page_no,
                no_paragraphs_in_page: page.no_paragraphs,
                paragraphs: page
                    .paragraphs()
                    .into_iter()
                    .map(|(paragraph_no, lines)| PageViewParagraph {
                        paragraph_no,
                        text: lines
                            .iter()
                            .map(|line| line.text.as_str())
                            .filter(|text| !text.is_empty())
                            .collect::<Vec<_>>()
                            .join(" "),
                    })
                    .collect(),
            })
            .collect();

        PageView {
            document_id: &self.document_id,
            document_file_name: &self.file_name,
            no_pages_in_doc: self.counts.no_pages,
            no_paragraphs_in_doc: self.counts.no_paragraphs,
            pages,
        }
    }

    pub fn to_word_view(&self) -> WordView<'_> {
        let pages = self
            .pages
            .iter()
            .map(|page| WordViewPage {
                page_no: page.page_no,
                paragraphs: page
                    .paragraphs()
                    .into_iter()
                    .map(|(paragraph_no, lines)| WordViewParagraph {
                        paragraph_no,
                        lines: lines
                            .into_iter()
                            .map(|line| WordViewLine {
                                line_no: line.line_no,
                                words: &line.words,
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        WordView {
            document_id: &self.document_id,
            document_file_name: &self.file_name,
            no_pages_in_doc: self.counts.no_pages,
            no_paragraphs_in_doc: self.counts.no_paragraphs,
            no_lines_in_doc: self.counts.no_lines,
            no_words_in_doc: self.counts.no_words,
            pages,
        }
    }

    pub fn to_json(&self, granularity: Granularity) -> Result<String> {
        let json = match granularity {
            Granularity::Line => serde_json::to_string_pretty(&self.to_line_view())?,
            Granularity::Page => serde_json::to_string_pretty(&self.to_page_view())?,
            Granularity::Word => serde_json::to_string_pretty(&self.to_word_view())?,
        };
        Ok(json)
    }

    pub fn save_with_granularity(&self, path: &Path, granularity: Granularity) -> Result<()> {
        std::fs::write(path, self.to_json(granularity)?)?;
        Ok(())
    }
}

impl HeadingToc {
    pub fn save_to_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// `<stem>.<granularity>.json` inside `output_dir`.
pub fn view_file_path(output_dir: &Path, stem: &str, granularity: Granularity) -> PathBuf {
    output_dir.join(format!("{}.{}.json", stem, granularity.as_str()))
}

/// `<stem>.line_heading.json` inside `output_dir`.
pub fn heading_toc_file_path(output_dir: &Path, stem: &str) -> PathBuf {
    output_dir.join(format!("{}.line_heading.json", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut doc = Document::new("doc-7", "handbook.pdf");
        let mut page = Page::new(1);

        let mut heading = Line::new(1, 1, 72.0, 300.0, "1. Scope");
        heading.line_type = LineType::Heading(1);
        page.lines.push(heading);

        let mut second = Line::new(2, 2, 72.0, 500.0, "This applies");
        second.words = vec![
            Word { word_no: 1, text: "This".to_string() },
            Word { word_no: 2, text: "applies".to_string() },
        ];
        page.lines.push(second);
        let mut third = Line::new(3, 2, 72.0, 480.0, "to everyone.");
        third.line_no = 2;
        page.lines.push(third);

        let mut cell = Line::new(4, 3, 60.0, 120.0, "");
        cell.line_type = LineType::Table;
        cell.table_cell = Some(TableCell {
            table_no: 1,
            row_no: 2,
            column_no: 1,
            column_span: Some(2),
        });
        page.lines.push(cell);

        page.no_paragraphs = 3;
        page.no_lines = 4;
        doc.pages.push(page);
        doc.counts.no_pages = 1;
        doc.counts.no_paragraphs = 3;
        doc.counts.no_lines = 4;
        doc.counts.no_headings = 1;
        doc.counts.no_tables = 1;
        doc
    }

    #[test]
    fn test_line_view_shape() {
        let doc = sample();
        let json = serde_json::to_value(doc.to_line_view()).unwrap();

        assert_eq!(json["documentId"], "doc-7");
        assert_eq!(json["noLinesInDoc"], 4);
        assert_eq!(json["noHeadingsInDoc"], 1);
        assert_eq!(json["noTablesInDoc"], 1);
        assert!(json.get("bookmarks").is_none());

        let lines = &json["pages"][0]["lines"];
        assert_eq!(lines[0]["lineType"], "heading:1");
        assert_eq!(lines[0]["coordLLX"], 72.0);
        assert!(lines[0].get("rowNo").is_none());
        assert_eq!(lines[2]["lineNo"], 2);
        assert_eq!(lines[3]["text"], "");
        assert_eq!(lines[3]["rowNo"], 2);
        assert_eq!(lines[3]["columnNo"], 1);
        assert_eq!(lines[3]["columnSpan"], 2);
    }

    #[test]
    fn test_page_view_joins_paragraph_lines() {
        let doc = sample();
        let json = serde_json::to_value(doc.to_page_view()).unwrap();
        let paragraphs = &json["pages"][0]["paragraphs"];

        assert_eq!(paragraphs.as_array().unwrap().len(), 3);
        assert_eq!(paragraphs[1]["paragraphNo"], 2);
        assert_eq!(paragraphs[1]["text"], "This applies to everyone.");
        assert_eq!(paragraphs[2]["text"], "");
        assert!(json.get("noLinesInDoc").is_none());
    }

    #[test]
    fn test_word_view_nests_words() {
        let mut doc = sample();
        doc.bookmarks.push(Bookmark {
            level: 1,
            title: "Scope".to_string(),
        });
        let json = serde_json::to_value(doc.to_word_view()).unwrap();
        let words = &json["pages"][0]["paragraphs"][1]["lines"][0]["words"];
        assert_eq!(words[1]["wordNo"], 2);
        assert_eq!(words[1]["text"], "applies");

        let line_view = serde_json::to_value(doc.to_line_view()).unwrap();
        assert_eq!(line_view["bookmarks"][0]["title"], "Scope");
    }

    #[test]
    fn test_save_and_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let doc = sample();

        let path = view_file_path(dir.path(), "handbook", Granularity::Page);
        assert!(path.ends_with("handbook.page.json"));
        doc.save_with_granularity(&path, Granularity::Page).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["documentFileName"], "handbook.pdf");

        let toc_path = heading_toc_file_path(dir.path(), "handbook");
        assert!(toc_path.ends_with("handbook.line_heading.json"));
    }
}
