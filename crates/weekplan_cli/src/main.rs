//! Command-line driver for the weekly scheduling engine.
//!
//! # Responsibility
//! - Feed JSON change requests from stdin through one revision controller.
//! - Optionally load/save the week from a SQLite snapshot database.
//!
//! # Invariants
//! - One JSON outcome line is printed per non-empty input line.
//! - The snapshot database is written only after accepted changes.

use clap::{Parser, Subcommand};
use log::warn;
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use weekplan_core::db::open_db;
use weekplan_core::{
    core_version, init_logging_from, CalendarRepository, ChangeRequest, EngineConfig,
    RevisionController, SqliteCalendarRepository, Task, Weekday, DEFAULT_TITLE_SIMILARITY,
};

#[derive(Debug, Parser)]
#[command(name = "weekplan", version, about = "Conflict-free weekly calendar engine")]
struct Cli {
    /// SQLite snapshot database to load from and save to.
    #[arg(long)]
    db: Option<PathBuf>,
    /// JSON engine config file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Absolute directory for rolling log files.
    #[arg(long)]
    log_dir: Option<String>,
    #[arg(long)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply one JSON change request per stdin line (default).
    Apply,
    /// Print the current calendar as JSON.
    Snapshot,
    /// Print one day's tasks as JSON (`tue`, `Tuesday`, ...).
    Day { day: String },
    /// Print tasks whose title resembles `title`, best match first.
    Find {
        title: String,
        /// Minimum similarity in `[0, 1]`.
        #[arg(long, default_value_t = DEFAULT_TITLE_SIMILARITY)]
        threshold: f32,
    },
    /// Print the engine version.
    Version,
}

/// One `find` hit.
#[derive(Serialize)]
struct TitleMatch<'a> {
    score: f32,
    task: &'a Task,
}

/// Printed for input lines that are not valid change requests.
#[derive(Serialize)]
struct ParseFailure {
    accepted: bool,
    parse_error: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("weekplan: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    if matches!(cli.command, Some(Command::Version)) {
        println!("weekplan_core version={}", core_version());
        return Ok(());
    }

    let config = load_config(&cli)?;
    init_logging_from(&config.logging)?;

    let mut conn = match &cli.db {
        Some(path) => Some(open_db(path).map_err(|err| err.to_string())?),
        None => None,
    };

    let mut controller = RevisionController::new(&config);
    if let Some(conn) = conn.as_mut() {
        let calendar = SqliteCalendarRepository::new(conn)
            .load_calendar()
            .map_err(|err| err.to_string())?;
        controller.load(calendar).map_err(|err| err.to_string())?;
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Some(Command::Snapshot) => {
            print_json(&mut out, &controller.snapshot())?;
        }
        Some(Command::Day { day }) => {
            let day = Weekday::parse(&day).ok_or_else(|| format!("unknown day `{day}`"))?;
            let calendar = controller.snapshot();
            print_json(&mut out, &calendar.tasks_on(day))?;
        }
        Some(Command::Find { title, threshold }) => {
            let calendar = controller.snapshot();
            let matches: Vec<TitleMatch<'_>> = calendar
                .find_similar(&title, threshold)
                .into_iter()
                .map(|(task, score)| TitleMatch { score, task })
                .collect();
            print_json(&mut out, &matches)?;
        }
        _ => {
            for line in io::stdin().lock().lines() {
                let line = line.map_err(|err| format!("cannot read stdin: {err}"))?;
                if line.trim().is_empty() {
                    continue;
                }
                let request = match serde_json::from_str::<ChangeRequest>(&line) {
                    Ok(request) => request,
                    Err(err) => {
                        print_json(
                            &mut out,
                            &ParseFailure {
                                accepted: false,
                                parse_error: err.to_string(),
                            },
                        )?;
                        continue;
                    }
                };

                let outcome = controller.submit(request);
                if let (true, Some(conn)) = (outcome.accepted, conn.as_mut()) {
                    if let Err(err) =
                        SqliteCalendarRepository::new(conn).save_calendar(&controller.snapshot())
                    {
                        warn!("event=calendar_save module=cli status=error error={err}");
                        return Err(format!("cannot save calendar: {err}"));
                    }
                }
                print_json(&mut out, &outcome)?;
            }
        }
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<EngineConfig, String> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = &cli.log_dir {
        config.logging.log_dir = Some(dir.clone());
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    config.validate().map_err(|err| err.to_string())?;
    Ok(config)
}

fn read_config(path: &Path) -> Result<EngineConfig, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| format!("cannot read config `{}`: {err}", path.display()))?;
    serde_json::from_str(&text)
        .map_err(|err| format!("invalid config `{}`: {err}", path.display()))
}

fn print_json<T: Serialize>(out: &mut impl Write, value: &T) -> Result<(), String> {
    let line = serde_json::to_string(value).map_err(|err| err.to_string())?;
    writeln!(out, "{line}").map_err(|err| format!("cannot write stdout: {err}"))
}

#[cfg(test)]
mod tests {
    use super::{load_config, Cli, Command, DEFAULT_TITLE_SIMILARITY};
    use clap::Parser;

    #[test]
    fn defaults_to_apply_mode_without_subcommand() {
        let cli = Cli::try_parse_from(["weekplan"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.db.is_none());
    }

    #[test]
    fn flag_overrides_replace_config_logging() {
        let cli = Cli::try_parse_from([
            "weekplan",
            "--log-level",
            "warn",
            "--log-dir",
            "/tmp/weekplan-logs",
            "snapshot",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Command::Snapshot)));

        let config = load_config(&cli).unwrap();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.log_dir.as_deref(), Some("/tmp/weekplan-logs"));
        assert!(config.displacement_enabled);
    }

    #[test]
    fn find_uses_default_similarity_threshold() {
        let cli = Cli::try_parse_from(["weekplan", "find", "dentist"]).unwrap();
        match cli.command {
            Some(Command::Find { title, threshold }) => {
                assert_eq!(title, "dentist");
                assert_eq!(threshold, DEFAULT_TITLE_SIMILARITY);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn missing_config_file_is_reported() {
        let cli = Cli::try_parse_from(["weekplan", "--config", "/nonexistent/weekplan.json"])
            .unwrap();
        assert!(load_config(&cli).unwrap_err().contains("cannot read config"));
    }
}
