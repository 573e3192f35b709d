use anyhow::Result;
use clap::Parser;
use dotenvy::dotenv;
use timelogtool::commands::Arguments;

mod commands;

fn main() -> Result<()> {
    let dotenv_path = dotenv().ok();
    let args = Arguments::parse();

    stderrlog::new()
        .quiet(args.quiet)
        .verbosity(args.verbose as usize + 2)
        .init()?;

    if let Some(path) = &dotenv_path {
        log::debug!("Loaded environment from {path:?}");
    }
    commands::submit(args, dotenv_path)
}
