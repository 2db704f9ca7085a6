use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use env_logger::{Builder, Env};

mod build;
mod commands;
mod config;
mod util;

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// The command to execute (defaults to `build`)
    #[command(subcommand)]
    command: Option<KilnCommand>,
}

#[derive(Parser)]
struct InitArgs {
    /// The path to initialize the project in
    path: PathBuf,

    /// Whether to create the directory if it doesn't exist
    #[arg(short, long, default_value = "false")]
    create: bool,
}

#[derive(Parser, Default)]
struct BuildArgs {
    /// The path to the configuration file
    #[arg(short, long)]
    config_file: Option<PathBuf>,
}

#[derive(Parser)]
struct CleanArgs {
    /// The path to the configuration file
    #[arg(short, long)]
    config_file: Option<PathBuf>,

    /// Only print what would be deleted
    #[arg(long, default_value = "false")]
    dry_run: bool,
}

#[derive(Subcommand)]
enum KilnCommand {
    /// Initialize a new kiln project
    Init(InitArgs),

    /// Build the site
    Build(BuildArgs),

    /// Delete the generated site
    Clean(CleanArgs),
}

fn init_logging() {
    let logging_env = Env::default().filter_or("RUST_LOG", "info");
    Builder::from_env(logging_env).format_target(false).init();
}

fn main() -> ExitCode {
    init_logging();

    let args = Args::parse();

    let result = match args.command.unwrap_or(KilnCommand::Build(BuildArgs::default())) {
        KilnCommand::Init(args) => commands::init::run(&args),
        KilnCommand::Build(args) => commands::build::run(&args),
        KilnCommand::Clean(args) => commands::clean::run(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            if let Some(path) = err.downcast_ref::<build::BuildError>().and_then(|e| e.path()) {
                log::error!("file: {path}");
            }
            ExitCode::FAILURE
        }
    }
}
