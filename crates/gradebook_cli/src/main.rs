//! Gradebook administrative CLI.
//!
//! # Responsibility
//! - Provide a small executable over `gradebook_core` for maintenance tasks.
//! - Keep output deterministic line-oriented `key=value` text.

use clap::{Parser, Subcommand};
use gradebook_core::{
    init_logging, open_db, AcademicRecord, CoreConfig, GradebookService, RecordService,
    StudentRef,
};
use log::{error, info};
use std::error::Error;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "gradebook_cli")]
#[command(about = "Maintenance commands for the gradebook database", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print core ping and version
    Ping,
    /// Re-grade every enrollment and recompute every record
    Rebuild,
    /// Print one academic record
    Record {
        /// Student id or matriculation number
        student: String,
    },
    /// Print every student's academic record
    Records,
    /// Print the grade scale in effect
    Scale,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), Box<dyn Error>> {
    if let Command::Ping = command {
        println!("gradebook_core ping={}", gradebook_core::ping());
        println!("gradebook_core version={}", gradebook_core::core_version());
        return Ok(());
    }

    let config = CoreConfig::from_env()?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(config.log_level, log_dir)?;
    }
    let conn = open_db(&config.db_path)?;
    info!(
        "event=cli_command module=cli status=start db_path={}",
        config.db_path.display()
    );

    match command {
        Command::Ping => {}
        Command::Rebuild => {
            let summary = RecordService::try_new(&conn)?.recompute_all()?;
            println!("enrollments_checked={}", summary.enrollments_checked);
            println!("enrollments_updated={}", summary.enrollments_updated);
            println!("enrollments_skipped={}", summary.enrollments_skipped);
            println!("records_recomputed={}", summary.records_recomputed);
        }
        Command::Record { student } => {
            let record = RecordService::try_new(&conn)?.get_record(&StudentRef::parse(&student))?;
            print_record(&record);
        }
        Command::Records => {
            for record in RecordService::try_new(&conn)?.list_records()? {
                print_record(&record);
                println!();
            }
        }
        Command::Scale => {
            let scale = GradebookService::try_new(&conn)?.current_grade_scale()?;
            for band in scale.bands() {
                println!(
                    "{} point={} range={}-{}",
                    band.letter, band.point, band.min_score, band.max_score
                );
            }
        }
    }
    Ok(())
}

fn print_record(record: &AcademicRecord) {
    println!("student_id={}", record.student_id);
    println!("course_count={}", record.course_count);
    println!("total_credits={}", record.total_credits);
    println!("total_points={}", record.total_points);
    match record.gpa {
        Some(gpa) => println!("gpa={gpa}"),
        None => println!("gpa=-"),
    }
    match &record.honours {
        Some(honours) => println!("honours={honours}"),
        None => println!("honours=-"),
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;

    #[test]
    fn parses_known_commands() {
        let cli = Cli::try_parse_from(["gradebook_cli", "ping"]).unwrap();
        assert!(matches!(cli.command, Command::Ping));

        let cli = Cli::try_parse_from(["gradebook_cli", "rebuild"]).unwrap();
        assert!(matches!(cli.command, Command::Rebuild));

        let cli = Cli::try_parse_from(["gradebook_cli", "records"]).unwrap();
        assert!(matches!(cli.command, Command::Records));

        let cli = Cli::try_parse_from(["gradebook_cli", "record", "STU/026/0001"]).unwrap();
        assert!(matches!(cli.command, Command::Record { ref student } if student == "STU/026/0001"));
    }

    #[test]
    fn rejects_unknown_or_incomplete_commands() {
        assert!(Cli::try_parse_from(["gradebook_cli"]).is_err());
        assert!(Cli::try_parse_from(["gradebook_cli", "record"]).is_err());
        assert!(Cli::try_parse_from(["gradebook_cli", "drop", "all"]).is_err());
    }

    #[test]
    fn command_definitions_are_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
