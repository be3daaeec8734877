//! Registry of source files, byte-offset/line-column translation, and
//! "did you mean?" identifier suggestions.

use std::collections::HashMap;

const TAB_DISPLAY_WIDTH: usize = 4;

/// A single registered source file with precomputed line offsets.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub content: String,
    line_offsets: Vec<usize>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let mut line_offsets = vec![0];
        for (i, b) in content.bytes().enumerate() {
            if b == b'\n' {
                line_offsets.push(i + 1);
            }
        }
        Self {
            name: name.into(),
            content,
            line_offsets,
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_offsets.len()
    }

    /// 1-based line number containing `offset`.
    pub fn line_for_offset(&self, offset: usize) -> usize {
        match self.line_offsets.binary_search(&offset) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }

    /// 1-based (line, column) for a byte offset. Column counts every byte
    /// (including tabs) as one character; tab expansion is a display-only
    /// concern handled by `display_column`.
    pub fn line_col_for_offset(&self, offset: usize) -> (usize, usize) {
        let line = self.line_for_offset(offset).max(1);
        let line_start = self.line_offsets.get(line - 1).copied().unwrap_or(0);
        (line, offset.saturating_sub(line_start) + 1)
    }

    /// The raw text of 1-based `line`, without its trailing newline.
    pub fn line_text(&self, line: usize) -> Option<&str> {
        if line == 0 || line > self.line_offsets.len() {
            return None;
        }
        let start = self.line_offsets[line - 1];
        let end = self
            .line_offsets
            .get(line)
            .map(|&o| o.saturating_sub(1))
            .unwrap_or(self.content.len());
        self.content.get(start..end).map(|s| s.trim_end_matches('\r'))
    }

    /// Up to `2*context+1` lines centered on `line`.
    pub fn lines_around(&self, line: usize, context: usize) -> Vec<(usize, &str)> {
        let lo = line.saturating_sub(context).max(1);
        let hi = (line + context).min(self.line_count());
        (lo..=hi)
            .filter_map(|l| self.line_text(l).map(|text| (l, text)))
            .collect()
    }

    /// Logical column expanded for display, widening each tab to the next
    /// multiple of `TAB_DISPLAY_WIDTH`. The logical column passed in (and
    /// every span stored on a diagnostic) counts a tab as a single column.
    pub fn display_column(&self, line: usize, logical_column: usize) -> usize {
        let Some(text) = self.line_text(line) else {
            return logical_column;
        };
        let mut display = 1usize;
        for (i, ch) in text.chars().enumerate() {
            if i + 1 >= logical_column {
                break;
            }
            display += if ch == '\t' {
                TAB_DISPLAY_WIDTH - ((display - 1) % TAB_DISPLAY_WIDTH)
            } else {
                1
            };
        }
        display
    }

    /// The identifier-like run of `[A-Za-z0-9_]` touching `column`.
    pub fn extract_word_at(&self, line: usize, column: usize) -> Option<String> {
        let text = self.line_text(line)?;
        let chars: Vec<char> = text.chars().collect();
        if column == 0 || column > chars.len() + 1 {
            return None;
        }
        let idx = (column - 1).min(chars.len().saturating_sub(1));
        if !chars.get(idx).is_some_and(|c| c.is_alphanumeric() || *c == '_') {
            return None;
        }
        let mut start = idx;
        while start > 0 && (chars[start - 1].is_alphanumeric() || chars[start - 1] == '_') {
            start -= 1;
        }
        let mut end = idx;
        while end + 1 < chars.len() && (chars[end + 1].is_alphanumeric() || chars[end + 1] == '_') {
            end += 1;
        }
        Some(chars[start..=end].iter().collect())
    }

    fn identifiers(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut current = String::new();
        for ch in self.content.chars() {
            if ch.is_alphanumeric() || ch == '_' {
                current.push(ch);
            } else if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            out.push(current);
        }
        out
    }
}

/// Registry of every source file touched by a compilation (the entry file
/// plus every transitively imported file).
#[derive(Debug, Default)]
pub struct SourceManager {
    files: HashMap<String, SourceFile>,
    order: Vec<String>,
}

impl SourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name`, replacing any prior registration under the same
    /// name (so a driver can be re-run against the same inputs).
    pub fn add_file(&mut self, name: impl Into<String>, content: impl Into<String>) -> &SourceFile {
        let name = name.into();
        if !self.files.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.files.insert(name.clone(), SourceFile::new(name.clone(), content));
        // Safe: we just inserted this key.
        self.files.get(&name).expect("file was just inserted")
    }

    pub fn get(&self, name: &str) -> Option<&SourceFile> {
        self.files.get(name)
    }

    /// Every identifier seen across all registered files, for fuzzy
    /// "did you mean?" suggestions.
    pub fn all_identifiers(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for name in &self.order {
            if let Some(file) = self.files.get(name) {
                for ident in file.identifiers() {
                    if seen.insert(ident.clone()) {
                        out.push(ident);
                    }
                }
            }
        }
        out
    }

    /// Up to `max` identifiers within Levenshtein distance 3 of `target`,
    /// excluding Quark's own reserved words and `target` itself.
    pub fn find_similar_identifiers(&self, target: &str, max: usize) -> Vec<String> {
        crate::fuzzy::find_similar(target, &self.all_identifiers(), max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_roundtrip() {
        let file = SourceFile::new("t.qk", "var x = 1;\nvar y = 2;\n");
        assert_eq!(file.line_col_for_offset(0), (1, 1));
        assert_eq!(file.line_col_for_offset(11), (2, 1));
        assert_eq!(file.line_text(2), Some("var y = 2;"));
    }

    #[test]
    fn extract_word_finds_identifier_under_cursor() {
        let file = SourceFile::new("t.qk", "var count = 1;");
        assert_eq!(file.extract_word_at(1, 6), Some("count".to_string()));
    }

    #[test]
    fn tabs_count_as_one_logical_column_but_expand_for_display() {
        let file = SourceFile::new("t.qk", "\tvar x = 1;");
        assert_eq!(file.display_column(1, 2), 5);
    }
}
