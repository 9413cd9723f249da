use anyhow::Result;
use clap::Parser;

use puzzle_pgn::config::{parse_config, ConfigFile};
use puzzle_pgn::logging::init_logger;

mod commands;

use commands::{
    cmd_export, cmd_log, cmd_reset, cmd_status, cmd_sync, cmd_themes, AppContext, Cli, Commands,
};

fn main() -> Result<()> {
    let args = Cli::parse();
    init_logger(args.verbose);

    if let Commands::Themes = args.command {
        return cmd_themes();
    }

    let mut config = match &args.config {
        Some(path) => parse_config(path)?,
        None => ConfigFile::default(),
    };
    if let Some(dir) = args.data_dir {
        config.storage.dir = dir;
    }
    if let Some(mirror) = args.mirror {
        config.dataset.mirror = Some(mirror);
    }

    let ctx = AppContext::open(config)?;

    match args.command {
        Commands::Sync { force } => cmd_sync(&ctx, force)?,
        Commands::Status => cmd_status(&ctx)?,
        Commands::Export(export) => cmd_export(&ctx, &export)?,
        Commands::Themes => cmd_themes()?,
        Commands::Log { clear } => cmd_log(&ctx, clear)?,
        Commands::Reset => cmd_reset(&ctx)?,
    }

    Ok(())
}
