//! Line-oriented session over one loaded point store.
//!
//! # Responsibility
//! - Translate operator lines into point store operations.
//! - Report bad input and keep the session alive.
//!
//! # Invariants
//! - The store is saved only on `save` or `exit`; `quit` and end of input
//!   discard unsaved changes.

use crate::cli::DEFAULT_PICK_RADIUS;
use infusion_core::{Clock, Point, PointRepository, PointStore, Position};
use log::info;
use std::io::{BufRead, Write};

const HELP: &str = "\
commands:
  add X Y WEEKS    mark a site expiring in WEEKS weeks
  remove N         delete site number N
  remove-at X Y    delete the site nearest to X,Y
  list             show sites
  sweep            drop expired sites
  save             write sites to disk
  exit             save and leave
  quit             leave without saving";

#[derive(Debug, Clone, PartialEq, Eq)]
enum ShellCommand {
    Add { position: Position, weeks: String },
    Remove(u32),
    RemoveAt(Position),
    List,
    Sweep,
    Save,
    Help,
    Exit,
    Quit,
    Blank,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Saved,
    Discarded,
}

/// Runs commands from `input` until `exit`, `quit` or end of input.
pub fn run_session<C, R, I, O>(
    store: &mut PointStore<C>,
    repo: &R,
    input: I,
    mut out: O,
) -> anyhow::Result<SessionEnd>
where
    C: Clock,
    R: PointRepository,
    I: BufRead,
    O: Write,
{
    info!("event=shell_start module=cli status=ok count={}", store.len());
    writeln!(out, "{} site(s) loaded; type `help` for commands", store.len())?;

    for line in input.lines() {
        let line = line?;
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                writeln!(out, "error: {message}")?;
                continue;
            }
        };

        match command {
            ShellCommand::Blank => {}
            ShellCommand::Help => writeln!(out, "{HELP}")?,
            ShellCommand::List => write_points(&mut out, store.points())?,
            ShellCommand::Add { position, weeks } => match store.add(position, &weeks) {
                Ok(point) => writeln!(out, "added {}", describe(&point))?,
                Err(err) => writeln!(out, "error: {err}")?,
            },
            ShellCommand::Remove(number) => {
                if store.remove_nearest(number) {
                    writeln!(out, "removed #{number}")?;
                } else {
                    writeln!(out, "error: no site #{number}")?;
                }
            }
            ShellCommand::RemoveAt(position) => {
                match store
                    .nearest(position, DEFAULT_PICK_RADIUS)
                    .map(|point| point.number)
                {
                    Some(number) => {
                        store.remove_nearest(number);
                        writeln!(out, "removed #{number}")?;
                    }
                    None => writeln!(out, "error: no site near {position}")?,
                }
            }
            ShellCommand::Sweep => {
                let removed = store.sweep_now();
                writeln!(out, "{} expired site(s) removed", removed.len())?;
            }
            ShellCommand::Save => match store.save(repo) {
                Ok(report) => writeln!(out, "saved {} site(s)", report.written)?,
                Err(err) => writeln!(out, "error: {err}")?,
            },
            ShellCommand::Exit => match store.save(repo) {
                Ok(report) => {
                    writeln!(out, "saved {} site(s)", report.written)?;
                    return Ok(SessionEnd::Saved);
                }
                Err(err) => writeln!(out, "error: {err}; use `quit` to leave without saving")?,
            },
            ShellCommand::Quit => return Ok(SessionEnd::Discarded),
        }
    }

    Ok(SessionEnd::Discarded)
}

/// Prints one line per point, or a placeholder for an empty store.
pub fn write_points(out: &mut impl Write, points: &[Point]) -> std::io::Result<()> {
    if points.is_empty() {
        return writeln!(out, "no sites");
    }
    for point in points {
        writeln!(out, "{}", describe(point))?;
    }
    Ok(())
}

pub fn describe(point: &Point) -> String {
    format!(
        "#{} at {} expires {}",
        point.number,
        point.position,
        point.expires_at.format("%m/%d/%Y")
    )
}

fn parse_command(line: &str) -> Result<ShellCommand, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(ShellCommand::Blank);
    };
    let args: Vec<&str> = words.collect();

    let command = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("add", [x, y, weeks]) => ShellCommand::Add {
            position: parse_position(x, y)?,
            weeks: (*weeks).to_string(),
        },
        ("remove", [number]) => ShellCommand::Remove(
            number
                .parse::<u32>()
                .map_err(|_| format!("`{number}` is not a site number"))?,
        ),
        ("remove-at", [x, y]) => ShellCommand::RemoveAt(parse_position(x, y)?),
        ("list", []) => ShellCommand::List,
        ("sweep", []) => ShellCommand::Sweep,
        ("save", []) => ShellCommand::Save,
        ("help", _) => ShellCommand::Help,
        ("exit", []) => ShellCommand::Exit,
        ("quit", []) => ShellCommand::Quit,
        (other, _) => return Err(format!("unrecognized `{other}`; type `help`")),
    };
    Ok(command)
}

fn parse_position(x: &str, y: &str) -> Result<Position, String> {
    let x = x
        .parse::<i32>()
        .map_err(|_| format!("`{x}` is not a pixel coordinate"))?;
    let y = y
        .parse::<i32>()
        .map_err(|_| format!("`{y}` is not a pixel coordinate"))?;
    Ok(Position::new(x, y))
}
