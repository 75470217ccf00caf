//! # Letterbox Admin
//!
//! Command-line inbox for the Letterbox contact-form service.
//!
//! ## Usage
//! ```bash
//! export LETTERBOX_ADMIN_KEY=...
//!
//! # Unread messages from March, oldest first
//! letterbox-admin list --unread --from 2026-03-01 --to 2026-03-31 --sort old
//!
//! # Read one message and mark it seen
//! letterbox-admin show contacts/2026-03-02T10-00-00-000Z-1a2b3c4d5e6f7a8b.json --mark-seen
//!
//! # Export everything matching "quote" to a spreadsheet
//! letterbox-admin export --query quote --format xlsx
//!
//! # Generate a DATA_ENC_KEY for the server
//! letterbox-admin keygen
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args as ClapArgs, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use letterbox_common::constants::{DEFAULT_API_BASE_URL, MAX_LIST_LIMIT};
use letterbox_common::{AdminItem, EncryptionKey, NormalizedSubmission, SubmitRequest};

mod client;
mod export;
mod inbox;

use client::ApiClient;
use export::ExportFormat;
use inbox::{Filter, SortOrder};

/// Letterbox admin CLI
#[derive(Parser, Debug)]
#[command(name = "letterbox-admin")]
#[command(author, version, about = "Read, triage, and export Letterbox contact messages", long_about = None)]
struct Args {
    /// Letterbox API base URL
    #[arg(long, env = "LETTERBOX_API_URL", default_value = DEFAULT_API_BASE_URL, global = true)]
    api_url: String,

    /// Shared admin key (kept in memory only)
    #[arg(long, env = "LETTERBOX_ADMIN_KEY", hide_env_values = true, global = true)]
    admin_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List messages, newest first
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Show one message in full
    Show {
        /// Record pathname, e.g. contacts/2026-...json
        pathname: String,

        /// Mark the message seen if it is unread
        #[arg(long)]
        mark_seen: bool,
    },

    /// Mark a message as seen
    Seen { pathname: String },

    /// Mark a message as unread
    Unseen { pathname: String },

    /// Export the filtered messages
    Export {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output format
        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,

        /// Output file (default: contacts-<date>.<ext>)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Send a message through the public endpoint
    Submit {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        message: String,

        /// CAPTCHA token obtained from the widget
        #[arg(long)]
        captcha_token: Option<String>,
    },

    /// Print a fresh base64 DATA_ENC_KEY
    Keygen,
}

#[derive(ClapArgs, Debug, Clone)]
struct FilterArgs {
    /// Case-insensitive search over name, email, message, and pathname
    #[arg(short, long)]
    query: Option<String>,

    /// First day to include (YYYY-MM-DD, UTC)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD, UTC)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Only unread messages
    #[arg(long)]
    unread: bool,

    /// Sort order
    #[arg(long, value_enum, default_value = "new")]
    sort: SortOrder,

    /// How many recent messages to fetch (1-50)
    #[arg(short, long, default_value_t = MAX_LIST_LIMIT)]
    limit: usize,
}

impl From<&FilterArgs> for Filter {
    fn from(args: &FilterArgs) -> Self {
        Self {
            query: args.query.clone(),
            from: args.from,
            to: args.to,
            unread_only: args.unread,
            sort: args.sort,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let client = ApiClient::new(&args.api_url, args.admin_key.clone())?;

    match args.command {
        Command::List { filter } => {
            let items = fetch_filtered(&client, &filter).await?;
            if items.is_empty() {
                println!("📭 No messages match.");
                return Ok(());
            }
            let unread = items.iter().filter(|i| !i.seen).count();
            println!("📬 {} messages ({} unread)", items.len(), unread);
            println!();
            for item in &items {
                println!("{}", inbox::render_summary(item));
                println!();
            }
        }

        Command::Show {
            pathname,
            mark_seen,
        } => {
            let items = fetch(&client, MAX_LIST_LIMIT).await?;
            let mut item = find(items, &pathname)?;
            if mark_seen && !item.seen {
                client.set_seen(&item.pathname, true).await?;
                item.seen = true;
            }
            print!("{}", inbox::render_full(&item));
        }

        Command::Seen { pathname } => {
            client.set_seen(&pathname, true).await?;
            println!("✅ Marked seen: {pathname}");
        }

        Command::Unseen { pathname } => {
            client.set_seen(&pathname, false).await?;
            println!("✅ Marked unread: {pathname}");
        }

        Command::Export {
            filter,
            format,
            out,
        } => {
            let items = fetch_filtered(&client, &filter).await?;
            let bytes = export::render(format, &items)?;
            let path = out
                .unwrap_or_else(|| PathBuf::from(format.default_file_name(Utc::now().date_naive())));
            std::fs::write(&path, &bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("📁 Exported {} messages to {}", items.len(), path.display());
        }

        Command::Submit {
            name,
            email,
            message,
            captcha_token,
        } => {
            let request = SubmitRequest {
                name: Some(name),
                email: Some(email),
                message: Some(message),
                company: None,
                turnstile_token: captcha_token,
            };
            // Same rules as the server, checked before sending
            NormalizedSubmission::from_request(&request).validate()?;

            let response = client.submit(&request).await?;
            println!("✅ Message sent.");
            if let (Some(id), Some(created_at)) = (response.id, response.created_at) {
                println!("   ID:      {id}");
                println!("   Created: {created_at}");
            }
        }

        Command::Keygen => {
            println!("🔑 DATA_ENC_KEY (KEEP PRIVATE):");
            println!("   {}", EncryptionKey::generate_base64());
        }
    }

    Ok(())
}

/// Fetch the listing behind a spinner
async fn fetch(client: &ApiClient, limit: usize) -> Result<Vec<AdminItem>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("Loading messages...");
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = client.list(limit).await;
    pb.finish_and_clear();
    Ok(result?)
}

async fn fetch_filtered(client: &ApiClient, args: &FilterArgs) -> Result<Vec<AdminItem>> {
    let items = fetch(client, args.limit).await?;
    Ok(Filter::from(args).apply(items))
}

fn find(items: Vec<AdminItem>, pathname: &str) -> Result<AdminItem> {
    items
        .into_iter()
        .find(|item| item.pathname == pathname.trim())
        .with_context(|| {
            format!("{pathname} is not among the {MAX_LIST_LIMIT} most recent messages")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_filter_args_parse() {
        let args = Args::try_parse_from([
            "letterbox-admin",
            "export",
            "--query",
            "quote",
            "--from",
            "2026-03-01",
            "--unread",
            "--sort",
            "old",
            "--format",
            "xlsx",
        ])
        .unwrap();

        let Command::Export { filter, format, out } = args.command else {
            panic!("expected export");
        };
        assert_eq!(format, ExportFormat::Xlsx);
        assert!(out.is_none());
        assert_eq!(filter.limit, MAX_LIST_LIMIT);

        let filter = Filter::from(&filter);
        assert_eq!(filter.query.as_deref(), Some("quote"));
        assert_eq!(filter.from, NaiveDate::from_ymd_opt(2026, 3, 1));
        assert!(filter.to.is_none());
        assert!(filter.unread_only);
        assert_eq!(filter.sort, SortOrder::Old);
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let result = Args::try_parse_from(["letterbox-admin", "list", "--from", "03/01/2026"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_find_by_pathname() {
        let item = AdminItem {
            pathname: "contacts/a.json".to_string(),
            uploaded_at: Utc::now(),
            size: 1,
            seen: false,
            data: None,
        };
        assert!(find(vec![item.clone()], " contacts/a.json ").is_ok());
        assert!(find(vec![item], "contacts/b.json").is_err());
    }
}
