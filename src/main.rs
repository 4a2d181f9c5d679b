// coach-intent - figures out which bot command a chat message is asking for
//
// This is the main entry point. Parses CLI args and dispatches to handlers.

use async_trait::async_trait;
use coach_intent_lib::{
    core::{CommandHandler, CommandRequest, Dispatcher, MemoryStore, PendingAction, Reply},
    intelligence::{extract, Block, Catalog, Category, Element},
    logging, Analyzer, Result, Settings,
};
use serde::Serialize;
use std::env;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

// The chat REPL only ever has one user
const LOCAL_USER: &str = "local";

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_cli();

    // Grab whatever the user typed
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    let command = &args[1];

    match command.as_str() {
        "classify" => handle_classify(&args[2..]),
        "extract" => handle_extract(&args[2..]),
        "respond" => handle_respond(&args[2..]),
        "chat" => handle_chat().await,
        "commands" => handle_commands(),
        "version" | "-v" | "--version" => {
            println!("coach-intent v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "-h" | "--help" => {
            print_usage();
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            Ok(())
        }
    }
}

fn handle_classify(args: &[String]) -> Result<()> {
    if args.is_empty() {
        eprintln!("Error: No text provided");
        return Ok(());
    }

    let settings = Settings::load()?;
    let analyzer = Analyzer::from_settings(&settings);
    print_json(&analyzer.classify(&args.join(" ")))
}

fn handle_extract(args: &[String]) -> Result<()> {
    let mut category: Option<Category> = None;
    let mut words = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--category" => {
                i += 1;
                match args.get(i).map(|s| Category::parse(s)) {
                    Some(Some(parsed)) => category = Some(parsed),
                    _ => {
                        eprintln!("Error: --category expects goal, action or session");
                        return Ok(());
                    }
                }
            }
            arg => words.push(arg.to_string()),
        }
        i += 1;
    }

    if words.is_empty() {
        eprintln!("Error: No text provided");
        return Ok(());
    }

    print_json(&extract(&words.join(" "), category))
}

fn handle_respond(args: &[String]) -> Result<()> {
    if args.is_empty() {
        eprintln!("Error: No text provided");
        return Ok(());
    }

    let settings = Settings::load()?;
    let analyzer = Analyzer::from_settings(&settings);
    print_json(&analyzer.process(&args.join(" ")))
}

/// Stands in for the coaching backend: says what it would have run
struct PreviewHandler;

#[async_trait]
impl CommandHandler for PreviewHandler {
    async fn handle(&self, request: &CommandRequest) -> anyhow::Result<Reply> {
        let mut text = format!("Would run {}", request.command);
        if !request.params.is_empty() {
            text.push_str(&format!(" with {}", serde_json::to_string(&request.params)?));
        }
        Ok(Reply::ephemeral(text))
    }
}

async fn handle_chat() -> Result<()> {
    let settings = Settings::load()?;
    let analyzer = Analyzer::from_settings(&settings);
    let dispatcher = Dispatcher::builder(
        Arc::new(MemoryStore::<String>::new()),
        Arc::new(MemoryStore::<PendingAction>::new()),
    )
    .session_settings(&settings.sessions)
    .fallback_handler(Arc::new(PreviewHandler))
    .build()?;

    println!("coach-intent chat. Type a message, '/login <token>' to sign in, Ctrl-D to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // Token handoff normally happens in the login form
        if let Some(token) = line.strip_prefix("/login ") {
            match dispatcher
                .complete_login(LOCAL_USER, token.trim().to_string())
                .await
            {
                Ok(Some(reply)) => print_reply(&reply),
                Ok(None) => println!("Logged in."),
                Err(e) => eprintln!("{}", e.user_message()),
            }
            continue;
        }
        if line == "/logout" {
            dispatcher.logout(LOCAL_USER);
            println!("Logged out.");
            continue;
        }

        let response = analyzer.process(line);
        match dispatcher.route(LOCAL_USER, &response).await {
            Ok(reply) => print_reply(&reply),
            Err(e) => eprintln!("{}", e.user_message()),
        }
    }

    Ok(())
}

fn handle_commands() -> Result<()> {
    let catalog = Catalog::standard();

    println!("\nAvailable commands:");
    println!("{}", "=".repeat(60));
    for entry in catalog.commands() {
        if let Some(id) = &entry.command_id {
            println!("  {:<15} {}", id, entry.description);
        }
    }
    println!("{}", "=".repeat(60));

    Ok(())
}

fn print_reply(reply: &Reply) {
    println!("{}", reply.message.text);
    for block in &reply.message.blocks {
        if let Block::Actions { elements } = block {
            for Element::Button { text, value, .. } in elements {
                println!("  [{}] -> {}", text.as_str(), value);
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_usage() {
    println!(
        r#"coach-intent v{} - Natural-language commands for the coaching bot

USAGE:
    coach-intent <COMMAND> [OPTIONS]

COMMANDS:
    classify <text>                      Show the best and runner-up intent
    extract [--category <c>] <text>      Pull slots (names, dates, times) from text
    respond <text>                       Full response the bot would send
    chat                                 Interactive session on stdin
    commands                             List available bot commands
    version                              Show version
    help                                 Show this help

EXAMPLES:
    coach-intent classify show my goals
    coach-intent extract --category session add session with John on 5/1/2024 at 3pm
    coach-intent respond help

CONFIGURATION:
    Settings are read from $COACH_INTENT_CONFIG or ~/.coach-intent/config.toml.
    Set RUST_LOG=debug for diagnostics on stderr.
"#,
        env!("CARGO_PKG_VERSION")
    );
}
