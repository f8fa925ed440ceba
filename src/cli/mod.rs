//! # CLI Module
//!
//! Command-line front end for a PhotoFlow library.
//!
//! ## Usage
//! ```bash
//! # See how a card splits into shooting sessions, then import it
//! photoflow sessions /Volumes/CARD/DCIM --gap 45
//! photoflow import ~/Photos/2024-05
//!
//! # Triage
//! photoflow flag 12 accepted
//! photoflow flag 13 rejected --toggle
//!
//! # Browse what is left, grouped by similarity
//! photoflow list --status unspecified --status accepted
//! photoflow groups --output json
//!
//! # Export a preview
//! photoflow fetch 12 --tier preview --out thumb.jpg
//! photoflow info 12 --histogram
//! ```

use chrono::Duration;
use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use photoflow::config::Config;
use photoflow::core::browsing::BrowsingView;
use photoflow::core::fetch::FetchPipeline;
use photoflow::core::filter::StatusFilter;
use photoflow::core::import::{
    group_sessions, import_edited, scan_candidates, FileImportJob, ImportQueue,
};
use photoflow::core::library::{MediaId, MediaItem, MediaStatus, MediaStore, SqliteStore, Tier};
use photoflow::core::scanner::discover_images;
use photoflow::core::similar::{ListEntry, SimilarityGrouper};
use photoflow::core::status::{StatusEventBus, StatusManager};
use photoflow::error::{ImportError, PhotoFlowError, Result};
use photoflow::events::{Event, EventChannel, ImportEvent};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

/// PhotoFlow - Triage a photo library
#[derive(Parser, Debug)]
#[command(name = "photoflow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Library database path
    #[arg(long, global = true)]
    library: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import image files and directories
    Import {
        /// Files or directories to import
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Include hidden files
        #[arg(long)]
        include_hidden: bool,
    },

    /// Import an edited version of an item
    Edit {
        /// Edited image file
        file: PathBuf,

        /// Item the edit was made from
        #[arg(long)]
        source: Option<MediaId>,

        /// Replace an existing edited version
        #[arg(long)]
        overwrite: bool,
    },

    /// List items passing the status filter
    List {
        /// Statuses to show (defaults to the configured filter)
        #[arg(short, long)]
        status: Vec<Status>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Set the triage status of an item
    Flag {
        id: MediaId,

        status: Status,

        /// Reset to unspecified if the item already has this status
        #[arg(long)]
        toggle: bool,
    },

    /// Show visible items grouped by similarity
    Groups {
        /// Similarity threshold (strictly below counts as similar)
        #[arg(short, long)]
        threshold: Option<u32>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Write a payload to disk
    Fetch {
        id: MediaId,

        /// Payload quality
        #[arg(short, long, default_value = "original")]
        tier: TierArg,

        /// Destination file
        #[arg(long)]
        out: PathBuf,
    },

    /// Group files into capture sessions without importing them
    Sessions {
        /// Files or directories to inspect
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Include hidden files
        #[arg(long)]
        include_hidden: bool,

        /// Longest gap inside a session, in minutes
        #[arg(short, long)]
        gap: Option<u32>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Show EXIF metadata of an item
    Info {
        id: MediaId,

        /// Also show per-channel colour statistics
        #[arg(long)]
        histogram: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Status {
    Unspecified,
    Accepted,
    Rejected,
}

impl From<Status> for MediaStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Unspecified => MediaStatus::Unspecified,
            Status::Accepted => MediaStatus::Accepted,
            Status::Rejected => MediaStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TierArg {
    /// Fast, downscaled JPEG
    Preview,
    /// Full-quality original
    Original,
}

impl From<TierArg> for Tier {
    fn from(tier: TierArg) -> Self {
        match tier {
            TierArg::Preview => Tier::Preview,
            TierArg::Original => Tier::Original,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let library = cli.library.unwrap_or_else(Config::default_library_path);
    let store = Arc::new(SqliteStore::open(&library)?);

    match cli.command {
        Commands::Import {
            paths,
            include_hidden,
        } => run_import(store, &config, paths, include_hidden || config.include_hidden),
        Commands::Edit {
            file,
            source,
            overwrite,
        } => run_edit(store.as_ref(), &config, &file, source, overwrite),
        Commands::List { status, output } => run_list(store, &config, status, output),
        Commands::Flag { id, status, toggle } => run_flag(store, id, status.into(), toggle),
        Commands::Groups { threshold, output } => run_groups(store, &config, threshold, output),
        Commands::Fetch { id, tier, out } => run_fetch(store, &config, id, tier.into(), &out),
        Commands::Sessions {
            paths,
            include_hidden,
            gap,
            output,
        } => run_sessions(
            &paths,
            include_hidden || config.include_hidden,
            gap.unwrap_or(config.session_gap_minutes),
            output,
        ),
        Commands::Info { id, histogram } => run_info(store, &config, id, histogram),
    }
}

fn run_import(
    store: Arc<SqliteStore>,
    config: &Config,
    paths: Vec<PathBuf>,
    include_hidden: bool,
) -> Result<()> {
    let term = Term::stderr();
    let files = discover_images(&paths, include_hidden)?;

    if files.is_empty() {
        term.write_line(&format!("{} No images found", style("!").yellow())).ok();
        return Ok(());
    }

    let mut queue = ImportQueue::new();
    for file in &files {
        queue.push(FileImportJob::new(file, config));
    }

    let (sender, receiver) = EventChannel::new();
    let pb = ProgressBar::new(1000);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {percent}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    let pb_events = pb.clone();

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            match event {
                Event::Import(ImportEvent::Progress(p)) => {
                    pb_events.set_position((p.fraction * 1000.0).round() as u64);
                }
                Event::Import(ImportEvent::ItemImported { label, .. }) => {
                    pb_events.set_message(label);
                }
                Event::Import(ImportEvent::Failed { label, message }) => {
                    pb_events.println(format!("{} {}: {}", style("✗").red(), label, message));
                }
                _ => {}
            }
        }
    });

    let session = queue.start(store, sender)?;
    let result = session.wait();
    event_thread.join().ok();
    pb.finish_and_clear();

    let summary = result?;
    term.write_line(&format!(
        "{} Imported {} of {} images",
        style("✓").green().bold(),
        style(summary.imported.len()).cyan(),
        files.len()
    ))
    .ok();

    Ok(())
}

fn run_edit(
    store: &dyn MediaStore,
    config: &Config,
    file: &Path,
    source: Option<MediaId>,
    overwrite: bool,
) -> Result<()> {
    let bytes = fs::read(file).map_err(|source| ImportError::Io {
        path: file.to_path_buf(),
        source,
    })?;
    let id = import_edited(store, bytes, source, overwrite, config)?;

    println!("{} Stored edited image as item {}", style("✓").green().bold(), style(id).cyan());
    Ok(())
}

fn open_view(
    store: Arc<SqliteStore>,
    config: &Config,
    statuses: Vec<Status>,
) -> Result<BrowsingView> {
    let mut view = BrowsingView::from_store(store, StatusEventBus::new(), config)?;
    if !statuses.is_empty() {
        let filter: StatusFilter = statuses.into_iter().map(MediaStatus::from).collect();
        view.set_filters(filter);
    }
    Ok(view)
}

fn run_list(
    store: Arc<SqliteStore>,
    config: &Config,
    statuses: Vec<Status>,
    output: OutputFormat,
) -> Result<()> {
    let view = open_view(store.clone(), config, statuses)?;
    let items = resolve(store.as_ref(), view.ids())?;

    match output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&items).unwrap_or_default();
            println!("{}", json);
        }
        OutputFormat::Pretty => {
            let term = Term::stdout();
            for (index, item) in items.iter().enumerate() {
                term.write_line(&format!(
                    "{:>4}  {}  {}  {}",
                    style(index).dim(),
                    style(format!("#{}", item.id)).cyan(),
                    format_status(item),
                    describe(item)
                ))
                .ok();
            }
            term.write_line(&format!(
                "{} of {} items shown",
                style(view.count()).bold(),
                view.source_ids().len()
            ))
            .ok();
        }
    }

    Ok(())
}

fn run_flag(store: Arc<SqliteStore>, id: MediaId, status: MediaStatus, toggle: bool) -> Result<()> {
    let manager = StatusManager::new(store.clone(), StatusEventBus::new());

    match manager.flag(id, status, toggle)? {
        Some(applied) => {
            store.save()?;
            println!("{} Item {} is now {}", style("✓").green().bold(), id, style(applied).cyan());
        }
        None => {
            println!(
                "{} Item {} cannot be flagged (unknown or edited)",
                style("!").yellow(),
                id
            );
        }
    }

    Ok(())
}

fn run_groups(
    store: Arc<SqliteStore>,
    config: &Config,
    threshold: Option<u32>,
    output: OutputFormat,
) -> Result<()> {
    let view = open_view(store.clone(), config, Vec::new())?;
    let grouper = match threshold {
        Some(threshold) => SimilarityGrouper::new(threshold),
        None => SimilarityGrouper::from_config(config),
    };
    let entries = grouper.group(view.ids(), store.as_ref());

    match output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&entries).unwrap_or_default();
            println!("{}", json);
        }
        OutputFormat::Pretty => {
            let term = Term::stdout();
            let mut group_number = 0;
            for entry in &entries {
                match entry {
                    ListEntry::Single(id) => {
                        term.write_line(&format!("  {} #{}", style("○").dim(), id)).ok();
                    }
                    ListEntry::Group(ids) => {
                        group_number += 1;
                        let members: Vec<String> =
                            ids.iter().map(|id| format!("#{}", id)).collect();
                        term.write_line(&format!(
                            "  {} {}",
                            style(format!("Group {} ({} items):", group_number, ids.len())).bold(),
                            style(members.join(" ")).cyan()
                        ))
                        .ok();
                    }
                }
            }
            term.write_line(&format!(
                "{} groups, threshold {}",
                style(group_number).bold(),
                grouper.threshold()
            ))
            .ok();
        }
    }

    Ok(())
}

fn run_fetch(
    store: Arc<SqliteStore>,
    config: &Config,
    id: MediaId,
    tier: Tier,
    out: &Path,
) -> Result<()> {
    let pipeline = FetchPipeline::new(store, config)?;
    let bytes = pipeline.fetch_payload(id, tier).wait()?;

    fs::write(out, &bytes).map_err(|source| PhotoFlowError::Output {
        path: out.to_path_buf(),
        source,
    })?;
    println!(
        "{} Wrote {} of item {} to {}",
        style("✓").green().bold(),
        tier,
        id,
        out.display()
    );
    Ok(())
}

fn run_sessions(
    paths: &[PathBuf],
    include_hidden: bool,
    gap_minutes: u32,
    output: OutputFormat,
) -> Result<()> {
    let files = discover_images(paths, include_hidden)?;
    let candidates = scan_candidates(&files)?;
    let sessions = group_sessions(candidates, Duration::minutes(i64::from(gap_minutes)));

    match output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&sessions).unwrap_or_default();
            println!("{}", json);
        }
        OutputFormat::Pretty => {
            let term = Term::stdout();
            for (number, session) in sessions.iter().enumerate() {
                let newest = session.first().and_then(|c| c.captured_at);
                let oldest = session.iter().rev().find_map(|c| c.captured_at);
                let span = match (oldest, newest) {
                    (Some(oldest), Some(newest)) => format!(
                        "{} to {}",
                        oldest.format("%Y-%m-%d %H:%M"),
                        newest.format("%Y-%m-%d %H:%M")
                    ),
                    _ => "undated".to_string(),
                };
                term.write_line(&format!(
                    "  {} {}",
                    style(format!("Session {} ({} files):", number + 1, session.len())).bold(),
                    style(span).cyan()
                ))
                .ok();
            }
            term.write_line(&format!(
                "{} sessions, gap {} min",
                style(sessions.len()).bold(),
                gap_minutes
            ))
            .ok();
        }
    }

    Ok(())
}

fn run_info(store: Arc<SqliteStore>, config: &Config, id: MediaId, histogram: bool) -> Result<()> {
    let pipeline = FetchPipeline::new(store, config)?;
    let metadata = pipeline.fetch_metadata(id).wait()?;
    let term = Term::stdout();

    let rows = [
        ("Taken", metadata.date_taken.map(|d| d.to_rfc3339())),
        ("Size", metadata.dimensions_display()),
        ("Camera", metadata.camera_display()),
        ("Exposure", metadata.exposure_display()),
        ("Orientation", metadata.orientation.map(|o| o.to_string())),
    ];
    for (label, value) in rows {
        term.write_line(&format!(
            "  {:<12} {}",
            style(label).bold(),
            value.unwrap_or_else(|| style("-").dim().to_string())
        ))
        .ok();
    }

    if histogram {
        let counts = pipeline.fetch_histogram(id, Tier::Original).wait()?;
        for summary in counts.summary() {
            term.write_line(&format!(
                "  {:<12} mean {:>6.1}  peak {:>3}",
                style(summary.channel).bold(),
                summary.mean,
                summary.peak
            ))
            .ok();
        }
    }
    Ok(())
}

fn resolve(store: &dyn MediaStore, ids: &[MediaId]) -> Result<Vec<MediaItem>> {
    let mut items = Vec::with_capacity(ids.len());
    for &id in ids {
        if let Some(item) = store.by_id(id)? {
            items.push(item);
        }
    }
    Ok(items)
}

fn format_status(item: &MediaItem) -> String {
    match item.status() {
        Some(MediaStatus::Accepted) => style("accepted   ").green().to_string(),
        Some(MediaStatus::Rejected) => style("rejected   ").red().to_string(),
        Some(MediaStatus::Unspecified) => style("unspecified").dim().to_string(),
        None => style("edited     ").magenta().to_string(),
    }
}

fn describe(item: &MediaItem) -> String {
    format!(
        "{}  {}  {}",
        item.created_at.format("%Y-%m-%d %H:%M"),
        item.dimensions,
        item.original_filename.as_deref().unwrap_or("-")
    )
}
