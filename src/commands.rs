use std::path::PathBuf;

use clap::Parser;

use crate::calendar::Preset;

/// Submit daily timelogs to Zoho People
///
/// Walks a date range one day at a time and posts a timelog for every day
/// that is not a weekend, a configured holiday or a configured leave day.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Arguments {
    /// increase the verbosity
    ///
    /// This flag can be used multiple times to increase the amount of information
    /// produced by timelogtool
    #[arg(global = true, short, long, action = clap::ArgAction::Count, help_heading = "Logging")]
    pub verbose: u8,

    /// output no logging
    ///
    /// Setting quiet disables all logging to stderr, including the per-day
    /// report of submitted and skipped dates.
    #[arg(global = true, long, action = clap::ArgAction::SetTrue, help_heading = "Logging")]
    pub quiet: bool,

    /// path to the config file
    ///
    /// Defaults to timelogtool/config.toml in the OS-specific local config
    /// directory.  A refresh token obtained from an auth code is written back
    /// to this file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// derive the date range from today instead of the config file
    ///
    /// Without a preset, the from_date and to_date in the [timelog] section
    /// are used.
    #[arg(short, long)]
    pub preset: Option<Preset>,
}
