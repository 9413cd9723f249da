//! Command implementations.

use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::sync::Arc;

use puzzle_pgn::config::ConfigFile;
use puzzle_pgn::themes::{self, ThemeCategory};
use puzzle_pgn::{
    DatasetSync, DatasetTransport, Db, FilterSortOptions, HubTransport, MirrorTransport,
    PermaLog, PgnExport, Pipeline, SendWork, Staging, WorkerHandle,
};

use super::args::ExportArgs;

/// Everything a command needs, built once from the config.
pub struct AppContext {
    pub db: Db,
    pub sync: Arc<DatasetSync>,
    pub permalog: PermaLog,
    pub config: ConfigFile,
}

impl AppContext {
    pub fn open(config: ConfigFile) -> Result<Self> {
        let db = Db::open(&config.storage.dir).with_context(|| {
            format!("Failed to open store at {}", config.storage.dir.display())
        })?;

        let transport: Arc<dyn DatasetTransport> = match &config.dataset.mirror {
            Some(dir) => {
                log::info!("Using dataset mirror {}", dir.display());
                Arc::new(MirrorTransport::new(dir))
            }
            None => Arc::new(HubTransport::new(
                config.dataset.list_url.clone(),
                config.dataset.download_url.clone(),
            )),
        };
        let sync = Arc::new(DatasetSync::new(db.clone(), transport)?);
        let permalog = PermaLog::new(db.log.clone(), config.logging.window);

        Ok(Self {
            db,
            sync,
            permalog,
            config,
        })
    }

    fn remember(&self, level: log::Level, msg: &str) {
        if let Err(e) = self.permalog.record(level, msg) {
            log::warn!("Failed to write permanent log: {}", e);
        }
    }
}

pub fn cmd_sync(ctx: &AppContext, force: bool) -> Result<()> {
    if !force && !ctx.sync.needs_refresh(false)? {
        eprintln!("Dataset is fresh, nothing to do (use --force to download again)");
        return Ok(());
    }
    eprintln!("Downloading puzzle dataset...");
    let outcome = ctx.sync.refresh().and_then(|_| ctx.sync.wait_until_idle());
    match &outcome {
        Ok(()) => ctx.remember(log::Level::Info, "Dataset synced"),
        Err(e) => ctx.remember(log::Level::Error, &format!("Sync failed: {}", e)),
    }
    outcome.context("Dataset sync failed")?;
    eprintln!("Dataset synced");
    Ok(())
}

pub fn cmd_status(ctx: &AppContext) -> Result<()> {
    match ctx.sync.last_synced_at()? {
        Some(ts) => println!("Last synced:   {}", ts.to_rfc3339()),
        None => println!("Last synced:   never"),
    }
    println!(
        "Needs refresh: {}",
        if ctx.sync.needs_refresh(false)? { "yes" } else { "no" }
    );
    if let Some(root) = ctx.db.root() {
        println!("Store:         {}", root.display());
    }
    match ctx.sync.file_list() {
        Ok(files) => {
            println!("Cached files:  {}", files.len());
            for file in files {
                let state = if ctx.db.parquet.contains(&file)? {
                    "ok"
                } else {
                    "missing"
                };
                println!("  {} ({})", file, state);
            }
        }
        Err(_) => println!("Cached files:  none"),
    }
    Ok(())
}

fn options_from_args(args: &ExportArgs) -> FilterSortOptions {
    FilterSortOptions {
        theme_groups: args.theme.clone(),
        min_rating: args.min_rating,
        max_rating: args.max_rating,
        max_records: args.max_puzzles,
        order_by: args.sort_by.map(Into::into).unwrap_or_default(),
        include_metadata_tags: !args.no_tags,
        include_metadata_comment: args.comments,
    }
}

pub fn cmd_export(ctx: &AppContext, args: &ExportArgs) -> Result<()> {
    let work = SendWork {
        opts: options_from_args(args),
        row_read_chunk_size: args
            .row_chunk_size
            .unwrap_or(ctx.config.pipeline.row_read_chunk_size),
        record_to_pgn_chunk_size: args
            .pgn_chunk_size
            .unwrap_or(ctx.config.pipeline.record_to_pgn_chunk_size),
    };
    work.validate()?;

    let staging = Staging::new(ctx.db.tmp.clone());
    let mut worker = WorkerHandle::spawn(Pipeline::new(Arc::clone(&ctx.sync), staging.clone()))?;

    ctx.remember(log::Level::Info, &format!("Export started: {:?}", work.opts));
    let outcome = worker.run(
        work,
        |status| eprintln!("{}", status),
        |line| {
            log::debug!("{}", line);
            ctx.remember(log::Level::Debug, line);
        },
    );
    worker.shutdown()?;

    if let Err(e) = outcome {
        ctx.remember(log::Level::Error, &format!("Export failed: {}", e));
        return Err(anyhow!(e).context("Export failed"));
    }

    let export = PgnExport::new(staging);
    let chunks = export
        .write_to(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    ctx.remember(
        log::Level::Info,
        &format!("Export written to {} ({} chunks)", args.output.display(), chunks),
    );
    if args.output != Path::new("-") {
        eprintln!("Wrote {}", args.output.display());
    }
    Ok(())
}

pub fn cmd_themes() -> Result<()> {
    for (category, entries) in themes::by_category() {
        println!("{}:", ThemeCategory::label(category));
        for theme in entries {
            println!("  {:<22} {}", theme.key, theme.name);
            println!("  {:<22} {}", "", theme.description);
        }
    }
    Ok(())
}

pub fn cmd_log(ctx: &AppContext, clear: bool) -> Result<()> {
    if clear {
        ctx.permalog.clear()?;
        eprintln!("Log cleared");
    } else {
        let dump = ctx.permalog.dump()?;
        if !dump.is_empty() {
            println!("{}", dump);
        }
    }
    Ok(())
}

pub fn cmd_reset(ctx: &AppContext) -> Result<()> {
    ctx.db.clear_all()?;
    eprintln!("Store cleared");
    Ok(())
}
