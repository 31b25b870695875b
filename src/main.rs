//! pushdown - deterministic pushdown automaton simulator
//!
//! Runs an input through a machine definition and prints the step-by-step
//! trace followed by the verdict.

mod config;
mod machine;
mod repl;

use clap::{CommandFactory, Parser, Subcommand};
use colored::Colorize;
use config::{Config, RenderConfig, TraceFormat};
use pushdown_core::builtin;
use pushdown_core::{CoreError, Engine, MachineDefinition, Symbol, Verdict};
use pushdown_render::{CharsetKind, JsonLinesRenderer, TableRenderer};
use std::fmt::{self, Write as _};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pushdown")]
#[command(about = "Process an input by a deterministic pushdown automaton")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Input string, or a value n for a^n b^n $ (`pushdown 3` is `pushdown aaabbb$`)
    input: Option<String>,

    /// Disable UTF-8 table formatting
    #[arg(long, global = true)]
    ascii: bool,

    /// Trace output format
    #[arg(short, long, value_enum, global = true)]
    format: Option<TraceFormat>,

    /// Machine definition file (JSON or YAML); defaults to the built-in a^n b^n $ machine
    #[arg(short, long, global = true)]
    machine: Option<PathBuf>,

    /// Config file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the machine definition and its derived metadata
    Describe,

    /// Process inputs interactively against one machine
    Repl,
}

fn main() -> ExitCode {
    // Logs go to stderr so they never interleave with the trace.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            let (message, status) = failure(e.as_ref());
            eprintln!("{}: {}", "Error".red(), message);
            ExitCode::from(status)
        }
    }
}

/// Renders an error for stderr and picks the exit status. Core errors carry
/// their code; a core error that is not a contract violation (trace output
/// or JSON failure) exits with 3, everything else with 2.
fn failure(err: &(dyn std::error::Error + 'static)) -> (String, u8) {
    let core = err.downcast_ref::<CoreError>().or_else(|| {
        match err.downcast_ref::<machine::LoadError>() {
            Some(machine::LoadError::Definition(e)) => Some(e),
            _ => None,
        }
    });
    match core {
        Some(e) => {
            let status = if e.is_contract_violation() { 2 } else { 3 };
            (format!("[{}] {}", e.error_code(), e), status)
        }
        None => (err.to_string(), 2),
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut config = Config::load(cli.config.as_deref())?;
    if cli.ascii {
        config.render.charset = CharsetKind::Ascii;
    }
    if let Some(format) = cli.format {
        config.render.format = format;
    }
    if let Some(path) = cli.machine {
        config.machine.path = Some(path);
    }

    let definition = Arc::new(machine::load(config.machine.path.as_deref())?);

    match cli.command {
        Some(Commands::Describe) => {
            print!("{}", describe(&definition)?);
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Repl) => {
            repl::run(definition, &config)?;
            Ok(ExitCode::SUCCESS)
        }
        None => {
            let Some(arg) = cli.input else {
                Cli::command().print_help()?;
                println!();
                return Ok(ExitCode::SUCCESS);
            };

            let input = expand_input(&arg);
            let mut engine = Engine::new(definition);
            let verdict = process_with_trace(&mut engine, &input, &config.render)?;

            if config.render.format != TraceFormat::Json {
                if verdict.is_accepted() {
                    println!("{}", "Success".green());
                } else {
                    println!("{}", "Failure".red());
                }
            }
            Ok(if verdict.is_accepted() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
    }
}

/// Expands a purely numeric argument n into a^n b^n $; anything else is
/// the literal input.
pub(crate) fn expand_input(arg: &str) -> String {
    match arg.trim().parse::<i64>() {
        Ok(n) => builtin::anbn_input(usize::try_from(n).unwrap_or(0)),
        Err(_) => arg.to_string(),
    }
}

/// Runs `input`, writing the trace to stdout in the configured format.
pub(crate) fn process_with_trace(
    engine: &mut Engine,
    input: &str,
    render: &RenderConfig,
) -> Result<Verdict, CoreError> {
    let stdout = io::stdout();
    match render.format {
        TraceFormat::Table => {
            println!("Processing {}", input);
            let mut renderer = TableRenderer::new(stdout.lock(), render.charset.charset());
            engine.process(input, Some(&mut renderer))
        }
        TraceFormat::Json => {
            let mut renderer = JsonLinesRenderer::new(stdout.lock());
            engine.process(input, Some(&mut renderer))
        }
        TraceFormat::Quiet => {
            println!("Processing {}", input);
            engine.process(input, None)
        }
    }
}

fn describe(definition: &MachineDefinition) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "Machine {} (checksum {})",
        definition.name.bold(),
        definition.checksum
    )?;
    if let Some(description) = &definition.raw.description {
        writeln!(out, "  {}", description)?;
    }
    writeln!(out, "Start state: {}", definition.start)?;
    writeln!(out, "End state:   {}", definition.end)?;
    writeln!(out, "States:      {}", definition.describe_states())?;
    let labels: Vec<_> = definition.labels().collect();
    writeln!(
        out,
        "Grammar rules: {}",
        if labels.is_empty() {
            "-".to_string()
        } else {
            labels.join(", ")
        }
    )?;

    writeln!(out, "Transitions ({}):", definition.action_count())?;
    let width = definition.widths().state;
    for state in definition.states() {
        for rule in definition.transitions_from(state) {
            write!(
                out,
                "  {:>3}  {:<width$}  ({}, {}) -> {:<width$}",
                rule.action.rule,
                state.as_str(),
                guard(rule.condition.input),
                guard(rule.condition.stack),
                rule.action.to.as_str(),
            )?;
            if !rule.action.push.is_empty() {
                let push: String = rule.action.push.iter().collect();
                write!(out, "  push {}", push)?;
            }
            if let Some(label) = &rule.action.label {
                write!(out, "  [{}]", label)?;
            }
            out.push('\n');
        }
    }

    let findings = definition.lint();
    if !findings.is_empty() {
        writeln!(out, "{}", "Overlapping transitions:".yellow())?;
        for finding in findings {
            writeln!(out, "  {}", finding)?;
        }
    }
    Ok(out)
}

fn guard(symbol: Option<Symbol>) -> String {
    symbol.map_or_else(|| "-".to_string(), |s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_expand_input() {
        assert_eq!(expand_input("3"), "aaabbb$");
        assert_eq!(expand_input("0"), "$");
        assert_eq!(expand_input("-2"), "$");
        assert_eq!(expand_input("aab$"), "aab$");
        assert_eq!(expand_input("3a"), "3a");
    }

    #[test]
    fn test_parse_input_and_flags() {
        let cli = Cli::try_parse_from(["pushdown", "--ascii", "-f", "json", "ab$"]).unwrap();
        assert_eq!(cli.input.as_deref(), Some("ab$"));
        assert!(cli.ascii);
        assert_eq!(cli.format, Some(TraceFormat::Json));
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_subcommand() {
        let cli = Cli::try_parse_from(["pushdown", "describe", "--machine", "m.yaml"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Describe)));
        assert_eq!(cli.machine, Some(PathBuf::from("m.yaml")));
    }

    #[test]
    fn test_describe_builtin() {
        colored::control::set_override(false);
        let text = describe(&builtin::anbn().unwrap()).unwrap();

        assert!(text.starts_with("Machine anbn (checksum "));
        assert!(text.contains("States:      p, q, q$, qa, qb"));
        assert!(text.contains("Grammar rules: S -> aSb, S -> e"));
        assert!(text.contains("Transitions (8):"));
        assert!(text.contains("    7  qa     (-, S) -> qa     push aSb  [S -> aSb]"));
        assert!(!text.contains("Overlapping"));
    }

    #[test]
    fn test_failure_reports_core_error_code() {
        let err = machine::LoadError::Definition(CoreError::MissingRequiredState {
            role: pushdown_core::StateRole::End,
        });
        let (message, status) = failure(&err);

        assert_eq!(message, "[MISSING_REQUIRED_STATE] missing required end state");
        assert_eq!(status, 2);
    }

    #[test]
    fn test_failure_on_trace_output() {
        let err = CoreError::Trace(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        let (message, status) = failure(&err);

        assert_eq!(message, "[TRACE_IO_ERROR] trace output error: closed");
        assert_eq!(status, 3);
    }

    #[test]
    fn test_failure_without_code() {
        let err = io::Error::new(io::ErrorKind::NotFound, "no such file");
        assert_eq!(failure(&err), ("no such file".to_string(), 2));
    }
}
