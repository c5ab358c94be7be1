use crate::story::{templates::TemplateStore, types::StoryLength};

const PARAGRAPH_BREAK: &str = "\n\n";

/// Deterministic story generator used whenever no model backend is loaded.
#[derive(Clone, Copy)]
pub struct MockGenerator {
    templates: &'static TemplateStore,
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new(TemplateStore::global())
    }
}

impl MockGenerator {
    pub fn new(templates: &'static TemplateStore) -> Self {
        Self { templates }
    }

    /// Fills the genre template and applies the length policy. Sampling
    /// parameters have no effect here.
    pub fn generate(&self, prompt: &str, genre: &str, length: StoryLength) -> String {
        let base = self.templates.lookup(genre).fill(prompt);
        match length {
            StoryLength::Short => first_paragraphs(&base, 2),
            StoryLength::Medium => base,
            StoryLength::Long => {
                let retold = replace_word(&base, "their", "the lovers'");
                let retold = replace_word(&retold, "they", "the couple");
                format!("{base}{PARAGRAPH_BREAK}{retold}")
            }
        }
    }
}

fn first_paragraphs(text: &str, keep: usize) -> String {
    let paragraphs: Vec<&str> = text.split(PARAGRAPH_BREAK).collect();
    if paragraphs.len() > keep {
        paragraphs[..keep].join(PARAGRAPH_BREAK)
    } else {
        text.to_string()
    }
}

/// Case-sensitive whole-word substitution. A match only counts when it is not
/// glued to a neighbouring letter or digit, so "theirs" and "They" survive.
fn replace_word(text: &str, word: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (start, _) in text.match_indices(word) {
        let end = start + word.len();
        let before = text[..start].chars().next_back();
        let after = text[end..].chars().next();
        if is_word_char(before) || is_word_char(after) {
            continue;
        }
        out.push_str(&text[last..start]);
        out.push_str(replacement);
        last = end;
    }
    out.push_str(&text[last..]);
    out
}

fn is_word_char(c: Option<char>) -> bool {
    c.is_some_and(|c| c.is_alphanumeric() || c == '_')
}
