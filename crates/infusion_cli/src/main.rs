//! Infusion site tracker command line shell.
//!
//! # Responsibility
//! - Resolve file locations and start core logging.
//! - Load the store once, run one command, and save when it mutated.

mod cli;
mod shell;

use anyhow::Context;
use clap::Parser;
use cli::{CliArgs, Command};
use infusion_core::{
    default_log_level, init_logging, Clock, CsvPointRepository, LoadReport, PointRepository,
    PointStore, Position, StoreConfig,
};
use log::warn;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = CliArgs::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> anyhow::Result<()> {
    let data_dir = std::path::absolute(&args.data_dir)
        .with_context(|| format!("cannot resolve data directory `{}`", args.data_dir.display()))?;
    start_logging(&data_dir, args.log_dir.as_deref(), args.log_level.as_deref());

    let config = StoreConfig::in_dir(&data_dir);
    let repo = CsvPointRepository::from_config(&config);
    let mut store = PointStore::new();
    let report = store
        .load(&repo)
        .with_context(|| format!("cannot load `{}`", repo.data_path().display()))?;
    print_load_report(&report);

    run_command(
        args.command,
        &mut store,
        &repo,
        &report,
        io::stdin().lock(),
        io::stdout().lock(),
    )
}

/// Runs one command against an already loaded store, saving after mutations.
fn run_command<C, R, I, O>(
    command: Command,
    store: &mut PointStore<C>,
    repo: &R,
    load_report: &LoadReport,
    input: I,
    mut out: O,
) -> anyhow::Result<()>
where
    C: Clock,
    R: PointRepository,
    I: BufRead,
    O: Write,
{
    match command {
        Command::List => shell::write_points(&mut out, store.points())?,
        Command::Add { x, y, weeks } => {
            let point = store.add(Position::new(x, y), &weeks)?;
            store.save(repo)?;
            writeln!(out, "added {}", shell::describe(&point))?;
        }
        Command::Remove { number, at, radius } => {
            let number = match (number, at.as_deref()) {
                (Some(number), _) => number,
                (None, Some([x, y])) => store
                    .nearest(Position::new(*x, *y), radius)
                    .map(|point| point.number)
                    .with_context(|| format!("no site within {radius}px of ({x}, {y})"))?,
                (None, _) => anyhow::bail!("remove needs a site number or `--at X Y`"),
            };
            if !store.remove_nearest(number) {
                anyhow::bail!("no site #{number}");
            }
            store.save(repo)?;
            writeln!(out, "removed #{number}")?;
        }
        Command::Sweep => {
            // Load already swept once; report both passes.
            let removed = store.sweep_now().len() + load_report.expired.len();
            store.save(repo)?;
            writeln!(out, "{removed} expired site(s) removed")?;
        }
        Command::Shell => {
            shell::run_session(store, repo, input, out)?;
        }
    }
    Ok(())
}

fn start_logging(data_dir: &Path, log_dir: Option<&Path>, level: Option<&str>) {
    let log_dir = log_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| data_dir.join("logs"));
    let log_dir = std::path::absolute(&log_dir).unwrap_or(log_dir);
    let level = level.unwrap_or_else(|| default_log_level());

    // Non-fatal.
    if let Err(err) = init_logging(level, &log_dir) {
        eprintln!("warning: file logging disabled: {err}");
    }
}

fn print_load_report(report: &LoadReport) {
    if report.created {
        eprintln!("created a new data file");
    }
    if report.skipped_rows > 0 {
        warn!(
            "event=cli_load module=cli status=partial skipped={}",
            report.skipped_rows
        );
        eprintln!("skipped {} unreadable row(s)", report.skipped_rows);
    }
    if !report.expired.is_empty() {
        eprintln!("{} site(s) expired since last save", report.expired.len());
    }
}

#[cfg(test)]
mod tests {
    use super::run_command;
    use crate::cli::{Command, DEFAULT_PICK_RADIUS};
    use chrono::{NaiveDate, NaiveDateTime};
    use infusion_core::{CsvPointRepository, LoadReport, ManualClock, PointStore, StoreConfig};
    use std::fs;

    fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn execute(
        command: Command,
        store: &mut PointStore<&ManualClock>,
        repo: &CsvPointRepository,
        load_report: &LoadReport,
    ) -> anyhow::Result<String> {
        let mut out = Vec::new();
        run_command(command, store, repo, load_report, "".as_bytes(), &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn add_and_remove_at_save_after_each_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::in_dir(dir.path());
        let repo = CsvPointRepository::from_config(&config);
        let clock = ManualClock::new(at(2026, 6, 1));
        let mut store = PointStore::with_clock(&clock);
        let report = store.load(&repo).unwrap();

        let output = execute(
            Command::Add {
                x: 10,
                y: 20,
                weeks: "2".to_string(),
            },
            &mut store,
            &repo,
            &report,
        )
        .unwrap();
        assert!(output.contains("added #1 at (10, 20) expires 06/15/2026"));
        assert!(fs::read_to_string(config.data_path())
            .unwrap()
            .contains("1,10,20,06/15/2026"));

        let output = execute(
            Command::Remove {
                number: None,
                at: Some(vec![12, 18]),
                radius: DEFAULT_PICK_RADIUS,
            },
            &mut store,
            &repo,
            &report,
        )
        .unwrap();
        assert!(output.contains("removed #1"));
        assert_eq!(
            fs::read_to_string(config.data_path()).unwrap().trim_end(),
            "Point Number,X,Y,Expiration Date"
        );
        assert!(fs::read_to_string(config.backup_path())
            .unwrap()
            .contains("1,10,20,06/15/2026"));
    }

    #[test]
    fn rejected_add_and_missing_remove_leave_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::in_dir(dir.path());
        let repo = CsvPointRepository::from_config(&config);
        let clock = ManualClock::new(at(2026, 6, 1));
        let mut store = PointStore::with_clock(&clock);
        let report = store.load(&repo).unwrap();
        let before = fs::read_to_string(config.data_path()).unwrap();

        let add = Command::Add {
            x: 1,
            y: 1,
            weeks: "soon".to_string(),
        };
        assert!(execute(add, &mut store, &repo, &report).is_err());
        let remove = Command::Remove {
            number: Some(3),
            at: None,
            radius: DEFAULT_PICK_RADIUS,
        };
        assert!(execute(remove, &mut store, &repo, &report).is_err());

        assert_eq!(fs::read_to_string(config.data_path()).unwrap(), before);
        assert!(!config.backup_path().exists());
    }

    #[test]
    fn sweep_reports_load_and_sweep_removals_together() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::in_dir(dir.path());
        let repo = CsvPointRepository::from_config(&config);
        fs::write(
            config.data_path(),
            "Point Number,X,Y,Expiration Date\n\
             1,1,1,01/01/2020\n\
             2,2,2,06/02/2026\n\
             3,3,3,01/01/2030\n",
        )
        .unwrap();

        let clock = ManualClock::new(at(2026, 6, 1));
        let mut store = PointStore::with_clock(&clock);
        let report = store.load(&repo).unwrap();
        assert_eq!(report.expired.len(), 1);

        clock.set(at(2026, 6, 3));
        let output = execute(Command::Sweep, &mut store, &repo, &report).unwrap();

        assert!(output.contains("2 expired site(s) removed"));
        let lines: Vec<String> = fs::read_to_string(config.data_path())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();
        assert_eq!(
            lines,
            vec!["Point Number,X,Y,Expiration Date", "1,3,3,01/01/2030"]
        );
    }

    #[test]
    fn shell_command_reads_session_from_input() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::in_dir(dir.path());
        let repo = CsvPointRepository::from_config(&config);
        let clock = ManualClock::new(at(2026, 6, 1));
        let mut store = PointStore::with_clock(&clock);
        let report = store.load(&repo).unwrap();

        let mut out = Vec::new();
        run_command(
            Command::Shell,
            &mut store,
            &repo,
            &report,
            "add 4 5 1\nexit\n".as_bytes(),
            &mut out,
        )
        .unwrap();

        assert!(fs::read_to_string(config.data_path())
            .unwrap()
            .contains("1,4,5,06/08/2026"));
    }
}
