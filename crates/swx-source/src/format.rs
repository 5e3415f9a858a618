//! Text-table layout: how a published line splits into raw columns

/// How one line of a table splits into columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowLayout {
    /// Columns separated by runs of whitespace
    Whitespace,
    /// Columns separated by a single delimiter character
    Delimited(char),
    /// Columns at fixed byte offsets, given as (start, end) pairs
    FixedWidth(Vec<(usize, usize)>),
}

impl RowLayout {
    /// Split one line into trimmed raw column values.
    ///
    /// Fixed-width ranges past the end of a short line yield empty columns
    /// rather than panicking; callers treat empty columns as absent values.
    pub fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self {
            RowLayout::Whitespace => line.split_whitespace().collect(),
            RowLayout::Delimited(sep) => line.split(*sep).map(str::trim).collect(),
            RowLayout::FixedWidth(ranges) => ranges
                .iter()
                .map(|&(start, end)| {
                    let len = line.len();
                    let start = start.min(len);
                    let end = end.min(len);
                    line[start..end].trim()
                })
                .collect(),
        }
    }
}

/// Layout plus the lines to skip before data begins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFormat {
    /// Header lines to skip unconditionally
    pub skip_header: usize,
    /// Lines starting with this character are comments
    pub comment_prefix: Option<char>,
    pub layout: RowLayout,
}

impl TableFormat {
    pub fn whitespace() -> Self {
        Self {
            skip_header: 0,
            comment_prefix: None,
            layout: RowLayout::Whitespace,
        }
    }

    pub fn delimited(sep: char) -> Self {
        Self {
            skip_header: 0,
            comment_prefix: None,
            layout: RowLayout::Delimited(sep),
        }
    }

    pub fn with_header(mut self, lines: usize) -> Self {
        self.skip_header = lines;
        self
    }

    pub fn with_comments(mut self, prefix: char) -> Self {
        self.comment_prefix = Some(prefix);
        self
    }

    pub fn is_comment(&self, line: &str) -> bool {
        match self.comment_prefix {
            Some(prefix) => line.trim_start().starts_with(prefix),
            None => false,
        }
    }
}
