use crate::model::Word;
use crate::options::is_timestamp_like;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ClassHeader {
    pub name: String,
    pub teachers: Vec<String>,
}

/// Class names are short labels like `5a` or `10bc`.
fn looks_like_class_name(text: &str) -> bool {
    let length = text.chars().count();
    (1..=4).contains(&length)
        && text.chars().next().is_some_and(|ch| ch.is_ascii_digit())
        && text.chars().filter(|ch| ch.is_alphabetic()).count() <= 2
}

fn split_teachers(text: &str) -> Vec<String> {
    if !text.contains('/') {
        return Vec::new();
    }
    text.split('/')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Finds the class label that directly follows the export timestamp in the
/// word stream. The word after the label, when it contains `/`, lists the
/// class teachers. Stops at the first match.
pub(crate) fn find_class_in_words(words: &[Word]) -> Option<ClassHeader> {
    for (index, current) in words.iter().enumerate() {
        let Some(lookbehind) = index.checked_sub(1).map(|before| &words[before]) else {
            continue;
        };
        let candidate = current.text.trim();
        if !looks_like_class_name(candidate) || !is_timestamp_like(&lookbehind.text) {
            continue;
        }

        let teachers = words
            .get(index + 1)
            .map(|lookahead| split_teachers(&lookahead.text))
            .unwrap_or_default();
        return Some(ClassHeader {
            name: candidate.to_string(),
            teachers,
        });
    }
    None
}

/// Line-based variant used with plain page text: the class label is the line
/// right after the first timestamp line.
pub(crate) fn find_class_in_text(text: &str) -> Option<ClassHeader> {
    let lines = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>();

    for (index, line) in lines.iter().enumerate() {
        if !is_timestamp_like(line) {
            continue;
        }
        let Some(candidate) = lines.get(index + 1) else {
            continue;
        };
        if candidate.chars().count() > 4 || !candidate.starts_with(|ch: char| ch.is_ascii_digit())
        {
            continue;
        }

        let teachers = lines
            .get(index + 2)
            .map(|line| split_teachers(line))
            .unwrap_or_default();
        return Some(ClassHeader {
            name: (*candidate).to_string(),
            teachers,
        });
    }
    None
}
