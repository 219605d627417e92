pub mod commands;
pub mod logging;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use quickquote_core::config::LoadOptions;

#[derive(Debug, Parser)]
#[command(
    name = "quickquote",
    about = "Instant quote wizard host and operator CLI",
    long_about = concat!(
        "Walk through the instant quote wizard in the terminal, inspect the catalog, ",
        "price drafts, and check configuration readiness."
    ),
    after_help = concat!(
        "Examples:\n",
        "  quickquote wizard\n",
        "  quickquote estimate --service cloud --tech aws --tech terraform --infra mid\n",
        "  quickquote doctor --json"
    )
)]
pub struct Cli {
    #[arg(long, global = true, help = "Config file to load instead of quickquote.toml")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run the instant quote wizard interactively on stdin/stdout")]
    Wizard,
    #[command(about = "List services, technologies, infrastructure tiers and scope buckets")]
    Catalog {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Price a draft without running the wizard and show the pricing trace")]
    Estimate(commands::estimate::EstimateArgs),
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, catalog loading, and submission sink readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = LoadOptions { config_path: cli.config, ..LoadOptions::default() };
    logging::init_from(&options);

    let mut envelope_on_stderr = false;
    let result = match cli.command {
        Command::Wizard => {
            let stdin = io::stdin();
            if commands::wizard::payload_on_stdout(&options) {
                envelope_on_stderr = true;
                commands::wizard::run(&options, stdin.lock(), &mut io::stderr())
            } else {
                commands::wizard::run(&options, stdin.lock(), &mut io::stdout())
            }
        }
        Command::Catalog { json } => commands::catalog::run(&options, json),
        Command::Estimate(args) => commands::estimate::run(&options, &args),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(&options) }
        }
        Command::Doctor { json } => commands::doctor::run(&options, json),
    };

    if envelope_on_stderr {
        eprintln!("{}", result.output);
    } else {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}
