//! boundck - generic bound checker
//!
//! CLI driver for checking declaration manifests.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

/// Generic bound checker
#[derive(Parser, Debug)]
#[command(name = "boundck")]
#[command(author, version, about = "Check generic bounds in declaration manifests")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    /// One line per diagnostic
    Short,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check manifest file(s) for bound and call-site errors
    Check(commands::check::CheckArgs),

    /// Explain a diagnostic code
    Explain(commands::explain::ExplainArgs),
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let use_color = !cli.no_color && !cli.quiet && atty::is(atty::Stream::Stdout);

    let Some(command) = cli.command else {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        cmd.print_help()?;
        println!();
        return Ok(());
    };

    match command {
        Commands::Check(args) => {
            commands::check::run(args, cli.format, use_color, cli.verbose, cli.quiet)
        }
        Commands::Explain(args) => commands::explain::run(args, cli.format, use_color),
    }
}
