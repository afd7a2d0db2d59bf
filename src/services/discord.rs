//! Mirroring conversations to a Discord channel through a webhook.

use std::fmt::Write;
use std::time::Duration;

use anyhow::Result;

const TIMEOUT: Duration = Duration::from_secs(5);
const MAX_RESPONSE_CHARS: usize = 500;

pub struct LogEntry {
    /// Markdown link to the Telegram user, or their id.
    pub user: String,
    pub model_name: String,
    pub request: String,
    pub response: String,
}

pub async fn notify(
    http: &reqwest::Client,
    webhook_url: &str,
    entry: &LogEntry,
) -> Result<()> {
    http.post(webhook_url)
        .timeout(TIMEOUT)
        .json(&serde_json::json!({ "content": format_entry(entry) }))
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}

fn format_entry(entry: &LogEntry) -> String {
    let mut content = String::new();
    writeln!(content, "🤖 **{} Bot Log**", entry.model_name).ok();
    writeln!(content, "👤 From: {}", entry.user).ok();
    writeln!(content, "🧠 Model: {}", entry.model_name).ok();
    writeln!(content, "💬 Message: {}", entry.request).ok();
    let mut chars = entry.response.chars();
    let head = chars.by_ref().take(MAX_RESPONSE_CHARS).collect::<String>();
    if chars.next().is_some() {
        write!(content, "🤖 Response: {head}...").ok();
    } else {
        write!(content, "🤖 Response: {head}").ok();
    }
    content
}

/// Markdown link to a Telegram user for the log.
pub fn user_link(username: Option<&str>, user_id: u64) -> String {
    username.map_or_else(
        || format!("UserID: {user_id}"),
        |username| format!("[{username}](https://t.me/{username})"),
    )
}
