//! Subcommand: `skillroute repl` -- interactive routing session.
//!
//! Each line is routed and run as one request.  Lines starting with `{` or
//! `[` are parsed as JSON input; everything else is free text.

use std::io::{self, BufRead, Write as _};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use skillroute_core::{OrchestratorOptions, Skill, SkillContext, SkillSession};
use tracing::info;

use crate::print_json;

/// One parsed REPL line.
#[derive(Debug, PartialEq)]
enum Line {
    Empty,
    Quit,
    Help,
    Skills,
    Last,
    Request(Value),
}

fn parse_line(line: &str) -> Line {
    let trimmed = line.trim();
    match trimmed {
        "" => Line::Empty,
        "quit" | "exit" | ":q" => Line::Quit,
        ":help" => Line::Help,
        ":skills" => Line::Skills,
        ":last" => Line::Last,
        _ if trimmed.starts_with('{') || trimmed.starts_with('[') => serde_json::from_str(trimmed)
            .map_or_else(|_| Line::Request(Value::from(trimmed)), Line::Request),
        _ => Line::Request(Value::from(trimmed)),
    }
}

/// Run the interactive loop until `quit` or end of input.
pub async fn cmd_repl(
    skills: Vec<Arc<dyn Skill>>,
    ctx: SkillContext,
    options: OrchestratorOptions,
) -> Result<()> {
    let session = SkillSession::with_options(skills, ctx, options);
    info!(skills = session.registry().len(), "session ready");

    println!();
    println!("  SkillRoute v{}", env!("CARGO_PKG_VERSION"));
    println!(
        "  {} skill(s) loaded. Type a request, :help, or 'quit' to exit.",
        session.registry().len()
    );
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush().context("failed to flush stdout")?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).context("failed to read input")? == 0 {
            break;
        }

        match parse_line(&line) {
            Line::Empty => continue,
            Line::Quit => {
                info!("user requested exit");
                break;
            }
            Line::Help => {
                println!("  :skills  list loaded skills");
                println!("  :last    show the last skill output");
                println!("  quit     leave the session");
                println!("  Lines starting with {{ or [ are sent as JSON input.");
            }
            Line::Skills => {
                for name in session.registry().names() {
                    println!("  {name}");
                }
            }
            Line::Last => match session.last() {
                Some(output) => print_json(&output)?,
                None => println!("  (no output yet)"),
            },
            Line::Request(input) => match session.run(input, None).await {
                Ok(output) if output.is_no_match() => {
                    println!("  No suitable skill found.");
                }
                Ok(output) => print_json(&output)?,
                Err(e) => eprintln!("  error: {e}"),
            },
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn commands_are_recognized() {
        assert_eq!(parse_line("   \n"), Line::Empty);
        assert_eq!(parse_line("quit\n"), Line::Quit);
        assert_eq!(parse_line(":q"), Line::Quit);
        assert_eq!(parse_line(":last"), Line::Last);
        assert_eq!(parse_line(":skills"), Line::Skills);
    }

    #[test]
    fn json_lines_are_structured_input() {
        assert_eq!(
            parse_line(r#"{"topic": "AI"}"#),
            Line::Request(json!({ "topic": "AI" }))
        );
        assert_eq!(parse_line("[1, 2]"), Line::Request(json!([1, 2])));
    }

    #[test]
    fn other_lines_are_text() {
        assert_eq!(parse_line(" plan a deck \n"), Line::Request(json!("plan a deck")));
        assert_eq!(parse_line("{ not json"), Line::Request(json!("{ not json")));
    }
}
