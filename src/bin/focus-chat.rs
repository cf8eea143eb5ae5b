//! Interactive terminal client for a Focus Relay server.
//!
//! ```text
//! focus-chat --url ws://localhost:3001/ws --focus academicSearch
//! > what is attention in transformers?
//! /focus webSearchDomain   switch focus mode
//! /domain docs.rs          set (or clear, without argument) the search domain
//! /rewrite                 regenerate the last answer
//! /history                 print the transcript
//! /quit
//! ```

use std::error::Error;
use std::io::Write;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use focus_relay::adapters::client::{ChatSession, ClientError, Exchange};
use focus_relay::domain::client::{ChatClient, ClientUpdate, EntryRole};
use focus_relay::domain::conversation::FocusMode;

#[derive(Debug, Parser)]
#[command(name = "focus-chat", version, about = "Chat with a Focus Relay server")]
struct Args {
    /// WebSocket endpoint of the relay
    #[arg(long, default_value = "ws://localhost:3001/ws")]
    url: String,

    /// Initial focus mode
    #[arg(long, default_value = "webSearch")]
    focus: FocusMode,

    /// Domain for webSearchDomain
    #[arg(long)]
    domain: Option<String>,

    /// Ask one question, print the answer and exit
    question: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut state = ChatClient::new(args.focus);
    state.set_domain(args.domain);
    let mut session = ChatSession::connect(&args.url, state).await?;

    if let Some(question) = args.question {
        report(session.ask_with(&question, print_update).await);
        return Ok(session.close().await?);
    }

    println!("Connected to {} ({}). /quit to exit.", args.url, args.focus);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line.split_once(' ').unwrap_or((line, "")) {
            ("", _) => {}
            ("/quit", _) => break,
            ("/focus", mode) => match mode.trim().parse::<FocusMode>() {
                Ok(mode) => {
                    session.state_mut().set_focus_mode(mode);
                    println!("focus mode: {mode}");
                }
                Err(_) => println!("unknown focus mode '{}'; one of: {}", mode.trim(), mode_names()),
            },
            ("/domain", domain) => {
                let domain = Some(domain.trim().to_string()).filter(|d| !d.is_empty());
                session.state_mut().set_domain(domain);
                println!("domain: {}", session.state().domain().unwrap_or("(none)"));
            }
            ("/history", _) => print_history(session.state()),
            ("/rewrite", _) => {
                let last_answer = session
                    .state()
                    .transcript()
                    .iter()
                    .rev()
                    .find(|entry| entry.role() == EntryRole::Assistant)
                    .map(|entry| entry.id().clone());
                match last_answer {
                    Some(entry_id) => report(session.rewrite_with(&entry_id, print_update).await),
                    None => println!("nothing to rewrite"),
                }
            }
            _ => report(session.ask_with(line, print_update).await),
        }
        prompt();
    }

    session.close().await?;
    Ok(())
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

fn mode_names() -> String {
    FocusMode::all()
        .iter()
        .map(FocusMode::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_update(update: &ClientUpdate) {
    if let ClientUpdate::TextAppended { text, .. } = update {
        print!("{text}");
        let _ = std::io::stdout().flush();
    }
}

fn report(result: Result<Exchange, ClientError>) {
    match result {
        Ok(exchange) => {
            println!();
            for (n, source) in exchange.sources.iter().enumerate() {
                println!("  [{}] {} <{}>", n + 1, source.title, source.url);
            }
        }
        Err(err) => println!("\nerror: {err}"),
    }
}

fn print_history(state: &ChatClient) {
    for entry in state.transcript() {
        let who = match entry.role() {
            EntryRole::User => "you",
            EntryRole::Assistant => "relay",
        };
        println!("{who}: {}", entry.text());
    }
}
