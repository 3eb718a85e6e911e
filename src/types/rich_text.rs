use super::Font;

/// A single run of text with optional font override.
#[derive(Debug, Clone, PartialEq)]
pub struct RichTextRun {
    pub text: String,
    pub font: Option<Font>,
}

/// Shared string entry - can be plain text or rich text
#[derive(Debug, Clone)]
pub enum SharedString {
    Plain(String),
    Rich(Vec<RichTextRun>),
}

impl SharedString {
    /// Get the plain text representation (concatenated for rich text)
    pub fn plain_text(&self) -> String {
        match self {
            SharedString::Plain(s) => s.clone(),
            SharedString::Rich(runs) => concat_runs(runs),
        }
    }
}

/// Concatenate run texts in run order.
pub fn concat_runs(runs: &[RichTextRun]) -> String {
    let total_len: usize = runs.iter().map(|r| r.text.len()).sum();
    let mut combined = String::with_capacity(total_len);
    for run in runs {
        combined.push_str(&run.text);
    }
    combined
}
