//! Client-side filtering, sorting, and rendering of the inbox.

use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;

use letterbox_common::AdminItem;
use letterbox_common::constants::PREVIEW_CHARS;

/// Listing order by creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortOrder {
    /// Newest first
    #[default]
    New,
    /// Oldest first
    Old,
}

/// Inbox filter, applied after the listing is fetched
#[derive(Debug, Clone, Default)]
pub struct Filter {
    /// Case-insensitive substring over name, email, message, and pathname
    pub query: Option<String>,
    /// First included day (UTC)
    pub from: Option<NaiveDate>,
    /// Last included day (UTC)
    pub to: Option<NaiveDate>,
    pub unread_only: bool,
    pub sort: SortOrder,
}

impl Filter {
    /// Keep matching items and order them
    pub fn apply(&self, items: Vec<AdminItem>) -> Vec<AdminItem> {
        let needle = self
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);
        let from = self.from.and_then(day_start);
        let to = self.to.and_then(day_end);

        let mut kept: Vec<AdminItem> = items
            .into_iter()
            .filter(|item| {
                let created_at = item.created_at();
                if from.is_some_and(|from| created_at < from) {
                    return false;
                }
                if to.is_some_and(|to| created_at > to) {
                    return false;
                }
                if self.unread_only && item.seen {
                    return false;
                }
                needle.as_deref().is_none_or(|needle| matches_query(item, needle))
            })
            .collect();

        match self.sort {
            SortOrder::New => kept.sort_by(|a, b| b.created_at().cmp(&a.created_at())),
            SortOrder::Old => kept.sort_by_key(AdminItem::created_at),
        }
        kept
    }
}

fn day_start(day: NaiveDate) -> Option<DateTime<Utc>> {
    day.and_hms_milli_opt(0, 0, 0, 0).map(|dt| dt.and_utc())
}

fn day_end(day: NaiveDate) -> Option<DateTime<Utc>> {
    day.and_hms_milli_opt(23, 59, 59, 999).map(|dt| dt.and_utc())
}

/// Needle is matched against the space-joined fields, so it may span two of them
fn matches_query(item: &AdminItem, needle: &str) -> bool {
    let data = item.data.as_ref();
    let haystack = [
        data.map_or("", |d| d.name.as_str()),
        data.map_or("", |d| d.email.as_str()),
        data.map_or("", |d| d.message.as_str()),
        item.pathname.as_str(),
    ]
    .join(" ")
    .to_lowercase();
    haystack.contains(needle)
}

/// First `PREVIEW_CHARS` characters of a message, with `...` when cut
pub fn preview(message: &str) -> String {
    match message.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &message[..cut]),
        None => message.to_string(),
    }
}

/// One inbox entry as shown by `list`
pub fn render_summary(item: &AdminItem) -> String {
    let marker = if item.seen { "○" } else { "●" };
    let when = item.created_at().format("%Y-%m-%d %H:%M");
    match &item.data {
        Some(data) => format!(
            "{marker} {when}  {} <{}>\n  {}\n  {}",
            data.name,
            data.email,
            item.pathname,
            preview(&data.message)
        ),
        None => format!("{marker} {when}  (unreadable record)\n  {}", item.pathname),
    }
}

/// One message in full, as shown by `show`
pub fn render_full(item: &AdminItem) -> String {
    let state = if item.seen { "seen" } else { "unread" };
    let mut out = format!(
        "📨 {}\n   Created: {}\n   Status:  {state}\n",
        item.pathname,
        item.created_at().to_rfc3339()
    );
    match &item.data {
        Some(data) => {
            out.push_str(&format!("   From:    {} <{}>\n\n", data.name, data.email));
            out.push_str(&data.message);
            out.push('\n');
        }
        None => out.push_str("\n⚠️  Record could not be decrypted or parsed.\n"),
    }
    out
}
