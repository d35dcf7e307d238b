//! Command line arguments for the infusion site tracker.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Pixel radius used to resolve `remove --at` to a point.
pub const DEFAULT_PICK_RADIUS: u32 = 10;

/// Track infusion sites on a body diagram and drop them once they expire.
#[derive(Parser, Debug)]
#[command(name = "infusion", author, version, about, long_about = None)]
pub struct CliArgs {
    /// directory holding the data file and its backup
    #[arg(long, global = true, default_value = ".")]
    pub data_dir: PathBuf,

    /// directory for rolling log files, defaults to `<data-dir>/logs`
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error, defaults by build mode
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// print current points
    List,
    /// mark a site and save
    Add {
        #[arg(long, allow_negative_numbers = true)]
        x: i32,
        #[arg(long, allow_negative_numbers = true)]
        y: i32,
        /// weeks until the site expires
        #[arg(long)]
        weeks: String,
    },
    /// delete a site by number, or the one nearest to `--at X Y`, and save
    Remove {
        #[arg(required_unless_present = "at")]
        number: Option<u32>,
        #[arg(
            long,
            num_args = 2,
            value_names = ["X", "Y"],
            allow_negative_numbers = true,
            conflicts_with = "number"
        )]
        at: Option<Vec<i32>>,
        #[arg(long, default_value_t = DEFAULT_PICK_RADIUS)]
        radius: u32,
    },
    /// drop expired sites and save
    Sweep,
    /// interactive session over one loaded store
    Shell,
}

#[cfg(test)]
mod tests {
    use super::{CliArgs, Command, DEFAULT_PICK_RADIUS};
    use clap::Parser;

    #[test]
    fn parses_add_with_negative_coordinates() {
        let args =
            CliArgs::try_parse_from(["infusion", "add", "--x", "-4", "--y", "12", "--weeks", "2"])
                .unwrap();
        assert_eq!(
            args.command,
            Command::Add {
                x: -4,
                y: 12,
                weeks: "2".to_string()
            }
        );
    }

    #[test]
    fn parses_remove_at_with_default_radius() {
        let args = CliArgs::try_parse_from(["infusion", "remove", "--at", "5", "6"]).unwrap();
        assert_eq!(
            args.command,
            Command::Remove {
                number: None,
                at: Some(vec![5, 6]),
                radius: DEFAULT_PICK_RADIUS
            }
        );
    }

    #[test]
    fn remove_requires_a_target() {
        assert!(CliArgs::try_parse_from(["infusion", "remove"]).is_err());
    }
}
