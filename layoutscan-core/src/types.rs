use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ===== OUTPUT GRANULARITY =====
// Exactly one view is materialized per run; the choice is made once for
// the whole pass and never mixed.

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// pages -> lines, with line types (the only view that is classified)
    #[default]
    Line,
    /// pages -> paragraph texts
    Page,
    /// pages -> paragraphs -> lines -> words
    Word,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Line => "line",
            Granularity::Page => "page",
            Granularity::Word => "word",
        }
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "line" => Ok(Granularity::Line),
            "page" => Ok(Granularity::Page),
            "word" => Ok(Granularity::Word),
            other => Err(format!("unknown granularity '{other}' (line, page or word)")),
        }
    }
}

// ===== LINE TYPES =====

/// Semantic class of a line. Starts as `Body`; classifiers only ever
/// rewrite `Body` lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineType {
    #[default]
    Body,
    Header,
    Footer,
    /// Heading at nesting level 1..=max_level
    Heading(u32),
    ListBullet,
    ListNumber,
    Table,
    Toc,
}

impl LineType {
    pub fn is_body(&self) -> bool {
        matches!(self, LineType::Body)
    }

    pub fn heading_level(&self) -> Option<u32> {
        match self {
            LineType::Heading(level) => Some(*level),
            _ => None,
        }
    }
}

impl fmt::Display for LineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineType::Body => f.write_str("body"),
            LineType::Header => f.write_str("header"),
            LineType::Footer => f.write_str("footer"),
            LineType::Heading(level) => write!(f, "heading:{level}"),
            LineType::ListBullet => f.write_str("list-bullet"),
            LineType::ListNumber => f.write_str("list-number"),
            LineType::Table => f.write_str("table"),
            LineType::Toc => f.write_str("toc"),
        }
    }
}

impl FromStr for LineType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(level) = s.strip_prefix("heading:") {
            return level
                .parse::<u32>()
                .map(LineType::Heading)
                .map_err(|_| format!("invalid heading level in line type '{s}'"));
        }
        match s {
            "body" => Ok(LineType::Body),
            "header" => Ok(LineType::Header),
            "footer" => Ok(LineType::Footer),
            "list-bullet" => Ok(LineType::ListBullet),
            "list-number" => Ok(LineType::ListNumber),
            "table" => Ok(LineType::Table),
            "toc" => Ok(LineType::Toc),
            _ => Err(format!("unknown line type '{s}'")),
        }
    }
}

impl Serialize for LineType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LineType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ===== DOCUMENT MODEL =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub document_id: String,
    pub file_name: String,
    pub pages: Vec<Page>,
    /// PDF bookmarks / outline titles, in document order
    pub bookmarks: Vec<Bookmark>,
    pub counts: DocumentCounts,
}

impl Document {
    pub fn new(document_id: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            file_name: file_name.into(),
            pages: Vec::new(),
            bookmarks: Vec::new(),
            counts: DocumentCounts::default(),
        }
    }

    /// Iterate all lines in document order together with their page number.
    pub fn lines(&self) -> impl Iterator<Item = (u32, &Line)> {
        self.pages
            .iter()
            .flat_map(|page| page.lines.iter().map(move |line| (page.page_no, line)))
    }

    /// Number of lines currently classified with the given type.
    pub fn count_line_type(&self, line_type: LineType) -> usize {
        self.lines()
            .filter(|(_, line)| line.line_type == line_type)
            .count()
    }
}

/// Aggregate counts. Structural counts are filled by the layout builder,
/// classification counts by the line-type rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentCounts {
    pub no_pages: u32,
    pub no_paragraphs: u32,
    pub no_lines: u32,
    pub no_words: u32,
    pub no_headings: u32,
    pub no_lists_bullet: u32,
    pub no_lists_number: u32,
    pub no_tables: u32,
    pub no_lines_header: u32,
    pub no_lines_footer: u32,
    pub no_lines_toc: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// 1-based
    pub page_no: u32,
    pub lines: Vec<Line>,
    pub no_paragraphs: u32,
    pub no_lines: u32,
    pub no_words: u32,
}

impl Page {
    pub fn new(page_no: u32) -> Self {
        Self {
            page_no,
            lines: Vec::new(),
            no_paragraphs: 0,
            no_lines: 0,
            no_words: 0,
        }
    }

    /// Group the page's lines by paragraph, preserving document order.
    pub fn paragraphs(&self) -> Vec<(u32, Vec<&Line>)> {
        let mut paragraphs: Vec<(u32, Vec<&Line>)> = Vec::new();
        for line in &self.lines {
            match paragraphs.last_mut() {
                Some((paragraph_no, lines)) if *paragraph_no == line.paragraph_no => {
                    lines.push(line)
                }
                _ => paragraphs.push((line.paragraph_no, vec![line])),
            }
        }
        paragraphs
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    /// 1-based position on the page
    pub line_no_page: u32,
    /// 1-based paragraph number on the page
    pub paragraph_no: u32,
    /// 1-based position inside the paragraph
    pub line_no: u32,
    pub llx: f32,
    pub urx: f32,
    pub text: String,
    pub line_type: LineType,
    /// Only for lines that come from a table cell
    pub table_cell: Option<TableCell>,
    /// Only materialized for word granularity
    pub words: Vec<Word>,
}

impl Line {
    /// Convenience constructor for a body line outside any table.
    pub fn new(line_no_page: u32, paragraph_no: u32, llx: f32, urx: f32, text: &str) -> Self {
        Self {
            line_no_page,
            paragraph_no,
            line_no: 1,
            llx,
            urx,
            text: text.to_string(),
            line_type: LineType::Body,
            table_cell: None,
            words: Vec::new(),
        }
    }

    /// First whitespace-delimited token, or "" for an empty line.
    pub fn first_token(&self) -> &str {
        first_token(&self.text)
    }
}

pub fn first_token(text: &str) -> &str {
    text.split_whitespace().next().unwrap_or("")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCell {
    /// 1-based running table number inside the document
    pub table_no: u32,
    pub row_no: u32,
    pub column_no: u32,
    /// Only present when the cell spans more than its own column
    pub column_span: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    /// 1-based position inside the line
    pub word_no: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    /// 1-based outline depth
    pub level: u32,
    pub title: String,
}

/// Structural totals reported by the layout builder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    pub no_pages: u32,
    pub no_paragraphs: u32,
    pub no_lines: u32,
    pub no_words: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_type_string_forms() {
        assert_eq!(LineType::Heading(2).to_string(), "heading:2");
        assert_eq!(LineType::ListBullet.to_string(), "list-bullet");
        assert_eq!("heading:3".parse::<LineType>(), Ok(LineType::Heading(3)));
        assert_eq!("toc".parse::<LineType>(), Ok(LineType::Toc));
        assert!("heading:x".parse::<LineType>().is_err());
        assert!("paragraph".parse::<LineType>().is_err());
    }

    #[test]
    fn line_type_serializes_as_plain_string() {
        let json = serde_json::to_string(&LineType::Heading(1)).unwrap();
        assert_eq!(json, "\"heading:1\"");
        let back: LineType = serde_json::from_str("\"list-number\"").unwrap();
        assert_eq!(back, LineType::ListNumber);
    }

    #[test]
    fn page_paragraphs_keep_order() {
        let mut page = Page::new(1);
        page.lines.push(Line::new(1, 1, 10.0, 50.0, "a"));
        page.lines.push(Line::new(2, 1, 10.0, 50.0, "b"));
        page.lines.push(Line::new(3, 2, 10.0, 50.0, "c"));

        let paragraphs = page.paragraphs();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].1.len(), 2);
        assert_eq!(paragraphs[1].0, 2);
    }

    #[test]
    fn granularity_parsing() {
        assert_eq!("WORD".parse::<Granularity>(), Ok(Granularity::Word));
        assert!("graph".parse::<Granularity>().is_err());
    }
}
