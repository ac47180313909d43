//! Headless mode for the expert demo.
//!
//! This module provides a simple line-oriented interface for running
//! round trips without a TUI. It's designed for automated testing.

use std::io::{self, BufRead};

use expert_core::{roundtrip, Bootstrapper, Environment, Session};

/// Run the demo in headless mode.
///
/// Every input line drives one complete round trip against a fresh
/// session; lines starting with `#` are commands.
pub fn run_headless() -> io::Result<()> {
    println!("=== Expert Shell Headless Mode ===");
    println!("Each line is asserted as a result fact, inference runs, and the");
    println!("first result is printed.");
    println!();
    print_commands();
    println!();

    let stdin = io::stdin();
    let mut last_session: Option<Environment> = None;

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };

        if let Some(command) = line.strip_prefix('#') {
            match command.split_whitespace().next() {
                Some("quit") | Some("exit") => {
                    println!("Goodbye!");
                    break;
                }
                Some("facts") => dump_facts(last_session.as_ref()),
                Some("help") => print_commands(),
                _ => println!("[ERROR] Unknown command: #{command}"),
            }
            continue;
        }

        run_line(&line, &mut last_session);
    }

    Ok(())
}

fn print_commands() {
    println!("Commands:");
    println!("  #facts  - Dump the last session's working memory as JSON");
    println!("  #help   - Show this help");
    println!("  #quit   - Exit");
}

/// One complete session lifecycle for one input line.
fn run_line(input: &str, last_session: &mut Option<Environment>) {
    let mut session = match Bootstrapper::new().create_session() {
        Ok(session) => session,
        Err(error) => {
            println!("[ERROR] Failed to load inference engine: {error}");
            tracing::error!(%error, "engine bootstrap failed");
            return;
        }
    };

    match roundtrip::submit_and_infer(&mut session, input) {
        Ok(results) => match results.first() {
            Some(first) => println!("Result: {first}"),
            None => println!("No results found."),
        },
        Err(error) => {
            println!("[ERROR] {error}");
            tracing::error!(%error, "round trip failed");
        }
    }

    *last_session = Some(session);
}

fn dump_facts(session: Option<&Environment>) {
    let Some(session) = session else {
        println!("[ERROR] No session has run yet");
        return;
    };
    match serde_json::to_string_pretty(&session.facts()) {
        Ok(json) => println!("{json}"),
        Err(e) => println!("[ERROR] Failed to serialize facts: {e}"),
    }
}
