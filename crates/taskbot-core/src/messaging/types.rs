/// Persistent reply keyboard (buttons that send their label as a message).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyKeyboard {
    pub rows: Vec<Vec<String>>,
}

impl ReplyKeyboard {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Convenience for "one button per row" layouts.
    pub fn one_per_row(labels: &[&str]) -> Self {
        Self {
            rows: labels.iter().map(|l| vec![l.to_string()]).collect(),
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flatten().map(|s| s.as_str())
    }
}

/// Capabilities / limits of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_documents: bool,
    pub supports_reply_keyboards: bool,
    pub max_message_len: usize,
}
