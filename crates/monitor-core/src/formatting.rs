//! Notification message templates.
//!
//! Output uses the chat platform's `<url|label>` link markup, one field per
//! line.

use crate::models::{Change, ChangeKind, ClarificationRecord};

/// Render `<url|label>`, or the bare label when there is no url.
fn link(url: &str, label: &str) -> String {
    if url.is_empty() {
        label.to_string()
    } else {
        format!("<{}|{}>", url, label)
    }
}

/// The problem line value, or `-` for questions not tied to a problem.
fn problem_field(record: &ClarificationRecord) -> String {
    if record.problem_title.is_empty() {
        "-".to_string()
    } else {
        link(&record.problem_url, &record.problem_title)
    }
}

/// Message for a question that has just appeared on the board.
///
/// # Examples
///
/// ```
/// use monitor_core::formatting::render_new;
/// use monitor_core::models::ClarificationRecord;
///
/// let rec = ClarificationRecord {
///     id: "5".into(),
///     user_id: "alice".into(),
///     user_url: "https://contest.example/users/alice".into(),
///     clarification_text: "Is N inclusive?".into(),
///     reply_url: "https://contest.example/clarifications/reply/5".into(),
///     ..Default::default()
/// };
/// let text = render_new(&rec);
/// assert!(text.starts_with("[Clar No.5]\n"));
/// assert!(text.contains("Problem: -\n"));
/// ```
pub fn render_new(record: &ClarificationRecord) -> String {
    format!(
        "[Clar No.{id}]\n\
         Problem: {problem}\n\
         User: {user}\n\
         Question: {question}\n\
         {reply}",
        id = record.id,
        problem = problem_field(record),
        user = link(&record.user_url, &record.user_id),
        question = record.clarification_text,
        reply = link(&record.reply_url, "Answer this clarification"),
    )
}

/// Message for a question whose answer was posted or edited.
pub fn render_answered(record: &ClarificationRecord) -> String {
    format!(
        "[Clar No.{id} answered]\n\
         Problem: {problem}\n\
         User: {user}\n\
         Question: {question}\n\
         Answer: {answer}\n\
         Public: {public}\n\
         {reply}",
        id = record.id,
        problem = problem_field(record),
        user = link(&record.user_url, &record.user_id),
        question = record.clarification_text,
        answer = record.response_text,
        public = record.is_public,
        reply = link(&record.reply_url, "Edit the answer"),
    )
}

/// Pick the template matching the change kind.
pub fn render(change: &Change) -> String {
    match change.kind {
        ChangeKind::New => render_new(&change.record),
        ChangeKind::Updated => render_answered(&change.record),
    }
}
