use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of the contest's clarification board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarificationRecord {
    /// Identifier taken from the reply link; empty when it could not be found.
    #[serde(default)]
    pub id: String,
    /// Problem the question is about. Empty for general questions.
    #[serde(default)]
    pub problem_title: String,
    /// Absolute link to the problem page.
    #[serde(default)]
    pub problem_url: String,
    /// Handle of the contestant who asked.
    #[serde(default)]
    pub user_id: String,
    /// Absolute link to the asker's profile.
    #[serde(default)]
    pub user_url: String,
    /// The question body.
    #[serde(default)]
    pub clarification_text: String,
    /// The answer body; empty while the question is open.
    #[serde(default)]
    pub response_text: String,
    /// Visibility flag exactly as the board prints it.
    #[serde(default)]
    pub is_public: String,
    /// Absolute link to the answer/edit page.
    #[serde(default)]
    pub reply_url: String,
}

impl ClarificationRecord {
    /// `true` when the record carries an id and can take part in diffing.
    pub fn is_identifiable(&self) -> bool {
        !self.id.is_empty()
    }

    /// `true` once staff have posted an answer.
    pub fn is_answered(&self) -> bool {
        !self.response_text.is_empty()
    }
}

impl fmt::Display for ClarificationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = if self.id.is_empty() { "?" } else { &self.id };
        let problem = if self.problem_title.is_empty() {
            "-"
        } else {
            &self.problem_title
        };
        write!(
            f,
            "#{id} [{problem}] by {} ({})",
            self.user_id,
            if self.is_answered() { "answered" } else { "open" }
        )
    }
}

/// How a record differs from what was last delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// The id has never been delivered before.
    New,
    /// The answer text changed since the last delivery.
    Updated,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::New => write!(f, "new"),
            ChangeKind::Updated => write!(f, "updated"),
        }
    }
}

/// A record that needs a notification, along with why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub kind: ChangeKind,
    pub record: ClarificationRecord,
}
