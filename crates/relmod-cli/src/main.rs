use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use relmod_core::{LoadedMod, Loader, ModuleMap};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "relmod")]
#[command(about = "Offline validator and inspector for relmod stage configs")]
struct Args {
    /// Path to the mod config
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate the config and print a summary
    Validate,
    /// Compile the challenge courses and hexdump the bytecode
    Compile {
        /// Only this course (config key, e.g. "beginner_extra")
        #[arg(long)]
        course: Option<String>,
        /// Print decoded commands instead of a hexdump
        #[arg(long)]
        disasm: bool,
    },
    /// Dump the installed runtime tables
    Tables {
        /// Emit the tables as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("relmod=info".parse().expect("static directive"))
                .add_directive("relmod_core=info".parse().expect("static directive")),
        )
        .init();

    let args = Args::parse();

    // A config failure is unrecoverable; report it and abort.
    if let Err(err) = run(args) {
        error!("{err:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let loaded = load(&args.config)?;

    match args.command {
        Command::Validate => commands::validate::run(&loaded),
        Command::Compile { course, disasm } => commands::compile::run(&loaded, course.as_deref(), disasm),
        Command::Tables { json } => commands::tables::run(&loaded, json),
    }
}

fn load(config: &Path) -> Result<LoadedMod> {
    // Offline tooling relocates against the vanilla layout, so every fixed
    // address maps to itself.
    let modules = ModuleMap::vanilla();
    let mut loader = Loader::new();
    let loaded = loader.load_from_path(config, &modules)?;
    info!("loaded {}", config.display());
    Ok(loaded)
}
