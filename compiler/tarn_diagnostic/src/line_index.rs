//! Byte offset to line/column conversion.

/// Line start offsets of one source text, for O(log L) lookups.
#[derive(Clone, Debug, Default)]
pub struct LineIndex {
    /// `offsets[i]` is the byte offset where line `i + 1` starts.
    offsets: Vec<u32>,
}

impl LineIndex {
    pub fn build(source: &str) -> Self {
        let mut offsets = vec![0u32];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                offsets.push(u32::try_from(i + 1).unwrap_or(u32::MAX));
            }
        }
        LineIndex { offsets }
    }

    /// 1-based line containing `offset`. Offsets past the end map to the
    /// last line.
    pub fn line(&self, offset: u32) -> u32 {
        let index = match self.offsets.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert) => insert.saturating_sub(1),
        };
        u32::try_from(index).unwrap_or(u32::MAX - 1) + 1
    }

    /// 1-based (line, column); the column counts characters, not bytes.
    pub fn line_col(&self, source: &str, offset: u32) -> (u32, u32) {
        let line = self.line(offset);
        let start = self.line_start(line).unwrap_or(0) as usize;
        let end = (offset as usize).min(source.len()).max(start);
        let prefix = source.get(start..end).unwrap_or("");
        let column = u32::try_from(prefix.chars().count()).unwrap_or(u32::MAX - 1) + 1;
        (line, column)
    }

    /// Byte offset where 1-based `line` starts.
    pub fn line_start(&self, line: u32) -> Option<u32> {
        if line == 0 {
            return None;
        }
        self.offsets.get((line - 1) as usize).copied()
    }

    /// Text of 1-based `line`, without its newline.
    pub fn line_text<'a>(&self, source: &'a str, line: u32) -> &'a str {
        let Some(start) = self.line_start(line) else {
            return "";
        };
        let end = self
            .line_start(line + 1)
            .map_or(source.len(), |next| (next as usize).saturating_sub(1));
        source
            .get(start as usize..end.max(start as usize))
            .unwrap_or("")
            .trim_end_matches('\r')
    }

    pub fn line_count(&self) -> usize {
        self.offsets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_and_columns() {
        let source = "let a = 1;\nlet b = 2;\n";
        let index = LineIndex::build(source);
        assert_eq!(index.line_col(source, 0), (1, 1));
        assert_eq!(index.line_col(source, 4), (1, 5));
        assert_eq!(index.line_col(source, 11), (2, 1));
        assert_eq!(index.line_count(), 3);
    }

    #[test]
    fn offset_past_end_maps_to_last_line() {
        let source = "(1";
        let index = LineIndex::build(source);
        assert_eq!(index.line_col(source, 5), (1, 3));
    }

    #[test]
    fn line_text_strips_newline() {
        let source = "first\r\nsecond";
        let index = LineIndex::build(source);
        assert_eq!(index.line_text(source, 1), "first");
        assert_eq!(index.line_text(source, 2), "second");
        assert_eq!(index.line_text(source, 3), "");
    }

    #[test]
    fn columns_count_characters() {
        let source = "\"é\" + 1";
        let index = LineIndex::build(source);
        // `é` takes two bytes: `+` sits at byte 5 but is the fifth character.
        assert_eq!(index.line_col(source, 5), (1, 5));
    }
}
