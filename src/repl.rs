//! Interactive REPL: process many inputs against one machine.

use crate::config::Config;
use crate::{expand_input, process_with_trace};
use colored::Colorize;
use pushdown_core::{Engine, MachineDefinition};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use std::sync::Arc;

const HELP_TEXT: &str = r#"
Enter an input string (e.g. aabb$) or a number n for a^n b^n $.

Commands:
  help                Show this help
  quit, exit          Exit the REPL
"#;

pub fn run(
    definition: Arc<MachineDefinition>,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "{} {} ({})",
        "pushdown".bold().cyan(),
        definition.name,
        definition.checksum.dimmed()
    );

    let rl_config = rustyline::Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(rl_config)?;

    let history_path = config.repl.history_path();
    let _ = rl.load_history(&history_path);

    println!("Type 'help' for usage.\n");

    let mut engine = Engine::new(definition);
    loop {
        let prompt = format!("{} ", "dpda>".cyan());
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                match line {
                    "" => continue,
                    "help" | "?" => println!("{}", HELP_TEXT),
                    "quit" | "exit" | "q" => break,
                    _ => {
                        let input = expand_input(line);
                        match process_with_trace(&mut engine, &input, &config.render) {
                            Ok(verdict) if verdict.is_accepted() => {
                                println!("{}\n", "Success".green())
                            }
                            Ok(_) => println!("{}\n", "Failure".red()),
                            Err(e) => {
                                println!("{}: [{}] {}\n", "Error".red(), e.error_code(), e)
                            }
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                println!("{}: {:?}", "Error".red(), err);
                break;
            }
        }
    }

    if let Err(e) = rl.save_history(&history_path) {
        tracing::debug!("failed to save history to {}: {}", history_path.display(), e);
    }

    Ok(())
}
