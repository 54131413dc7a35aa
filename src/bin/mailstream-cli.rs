#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI that streams the messages of one mailbox

use clap::Parser;
use mailstream::{Client, Envelope, ImapConfig, Message};
use serde::Serialize;
use std::ops::ControlFlow;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mailstream-cli")]
#[command(about = "List the messages of an IMAP mailbox, skipping malformed ENVELOPEs")]
struct Args {
    /// Mailbox to read
    #[arg(long, default_value = "INBOX")]
    mailbox: String,

    /// Stop after this many messages
    #[arg(long)]
    limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// What gets printed per message; the body itself is only summarised.
#[derive(Serialize)]
struct Summary {
    uid: u32,
    size: usize,
    envelope: Envelope,
}

impl From<Message> for Summary {
    fn from(msg: Message) -> Self {
        Self {
            uid: msg.uid,
            size: msg.bytes().len(),
            envelope: msg.envelope,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = ImapConfig::from_env()?;
    let mut client = Client::connect(&config).await?;

    let mut summaries = Vec::new();
    let mut failure = None;
    client
        .messages(&args.mailbox, async |item: mailstream::Result<Message>| match item {
            Ok(msg) => {
                summaries.push(Summary::from(msg));
                if args.limit.is_some_and(|limit| summaries.len() >= limit) {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            }
            Err(e) => {
                failure = Some(e);
                ControlFlow::Break(())
            }
        })
        .await;

    client.logout().await.ok();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        print_table(&summaries);
    }

    match failure {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

fn print_table(summaries: &[Summary]) {
    if summaries.is_empty() {
        println!("No messages found.");
        return;
    }

    println!("{:<8} {:<20} {:<30} Subject", "UID", "Date", "From");
    println!("{}", "-".repeat(100));

    for summary in summaries {
        let date = summary
            .envelope
            .date
            .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d %H:%M").to_string());
        println!(
            "{:<8} {:<20} {:<30} {}",
            summary.uid,
            date,
            truncate(&summary.envelope.from.join(", "), 28),
            truncate(&summary.envelope.subject, 40),
        );
    }

    println!("\n{} message(s)", summaries.len());
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}
