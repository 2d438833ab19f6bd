use crate::model::{ExtractedTable, Word};

/// One line per word: index, quoted text and coordinates.
#[must_use]
pub fn dump_words(words: &[Word], limit: usize) -> Vec<String> {
    words
        .iter()
        .take(limit)
        .enumerate()
        .map(|(index, word)| {
            format!(
                "{index:3}: '{:<15}' x={:6.1} y={:6.1}",
                word.text, word.x0, word.top
            )
        })
        .collect()
}

/// Table size as `rows x columns`, then the first `max_rows` rows with
/// every cell quoted so embedded line breaks stay visible.
#[must_use]
pub fn dump_table(table: &ExtractedTable, max_rows: usize) -> Vec<String> {
    let columns = table.rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut lines = vec![format!("{} rows x {columns} columns", table.rows.len())];
    lines.extend(table.rows.iter().take(max_rows).enumerate().map(|(index, row)| {
        let cells = row
            .iter()
            .map(|cell| format!("{cell:?}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{index:3}: [{cells}]")
    }));
    lines
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralHit {
    pub index: usize,
    pub x0: f32,
    pub top: f32,
    /// Neighbouring words as `(index, text)`, the hit included.
    pub context: Vec<(usize, String)>,
}

/// Every word whose trimmed text equals `literal`, with `before` and `after`
/// neighbours for context.
#[must_use]
pub fn find_literal(words: &[Word], literal: &str, before: usize, after: usize) -> Vec<LiteralHit> {
    words
        .iter()
        .enumerate()
        .filter(|(_, word)| word.text.trim() == literal)
        .map(|(index, word)| {
            let start = index.saturating_sub(before);
            let end = (index + after).min(words.len());
            LiteralHit {
                index,
                x0: word.x0,
                top: word.top,
                context: (start..end)
                    .map(|position| (position, words[position].text.clone()))
                    .collect(),
            }
        })
        .collect()
}
