//! Clip Lineage CLI - scan folders, query lineage, join chains

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use lineage_core::concat::default_archival_output;
use lineage_core::config::ConfigManager;
use lineage_core::lineage::ForwardTree;
use lineage_core::logging::{self, WorkerGuard};
use lineage_core::models::FidelityMode;
use lineage_core::LineageSession;

#[derive(Parser)]
#[command(name = "clip-lineage")]
#[command(author, version, about = "Reconstruct and join generated clip lineages", long_about = None)]
struct Cli {
    /// Path to the config file
    #[arg(short, long, default_value = "timeline_config.json", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage working folders
    Folders {
        #[command(subcommand)]
        action: FolderAction,
    },

    /// Scan working folders and update the cache
    Scan,

    /// List root clips (no known predecessor)
    Roots,

    /// Print the ancestors of a clip, root first
    Chain {
        /// Clip file
        clip: PathBuf,
    },

    /// Print all descendants of a clip
    Tree {
        /// Clip file
        clip: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the prompt text embedded in a clip
    Prompt {
        /// Clip file
        clip: PathBuf,
    },

    /// Print the frame image a clip produced
    OutputFrame {
        /// Clip file
        clip: PathBuf,
    },

    /// Join a clip's backward chain into one video
    Concat {
        /// Last clip of the chain
        clip: PathBuf,

        /// Fidelity mode (preview, archival)
        #[arg(short, long, default_value = "preview")]
        mode: FidelityMode,

        /// Output file (archival default: combined_<timestamp>.mp4 next to the clip)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum FolderAction {
    /// Add a working folder
    Add { folder: PathBuf },
    /// Remove a working folder
    Remove { folder: PathBuf },
    /// List working folders
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigManager::new(&cli.config);
    config.load_or_default();
    let _guard = init_logging(&config)?;
    tracing::debug!("Using config {}", config.path().display());

    let mut session = LineageSession::from_config(config)?;

    match cli.command {
        Commands::Folders { action } => folders(&mut session, action),
        Commands::Scan => scan(&mut session),
        Commands::Roots => {
            for root in session.graph().roots(session.catalog()) {
                println!("{}", root.display());
            }
            Ok(())
        }
        Commands::Chain { clip } => {
            for id in session.chain(&clip)? {
                println!("{}", id.display());
            }
            Ok(())
        }
        Commands::Tree { clip, json } => {
            let tree = session.tree(&clip)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tree)?);
            } else {
                let root = session.resolve_clip(&clip)?;
                print_tree(&tree, &root, 0, &mut BTreeSet::new());
            }
            Ok(())
        }
        Commands::Prompt { clip } => {
            match session.prompt(&clip)? {
                Some(text) => println!("{}", text),
                None => bail!("No prompt found in {}", clip.display()),
            }
            Ok(())
        }
        Commands::OutputFrame { clip } => {
            match session.output_frame(&clip)? {
                Some(frame) => println!("{}", frame.path.display()),
                None => bail!("No output frame found for {}", clip.display()),
            }
            Ok(())
        }
        Commands::Concat { clip, mode, output } => concat(&session, &clip, mode, output),
    }
}

fn init_logging(config: &ConfigManager) -> Result<Option<WorkerGuard>> {
    let log_settings = &config.settings().logging;
    if !log_settings.to_file {
        logging::init_tracing(log_settings.level);
        return Ok(None);
    }

    let logs = &config.settings().paths.logs_folder;
    let logs_dir = match config.path().parent() {
        Some(dir) if logs.is_relative() => dir.join(logs),
        _ => logs.clone(),
    };
    let guard = logging::init_tracing_with_file(log_settings.level, &logs_dir)
        .with_context(|| format!("Failed to open log folder {}", logs_dir.display()))?;
    Ok(Some(guard))
}

fn folders(session: &mut LineageSession, action: FolderAction) -> Result<()> {
    match action {
        FolderAction::Add { folder } => {
            if session.config_mut().add_folder(&folder)? {
                session.save_config()?;
                println!("Added {}", folder.display());
            } else {
                println!("Already configured: {}", folder.display());
            }
        }
        FolderAction::Remove { folder } => {
            if !session.config_mut().remove_folder(&folder) {
                bail!("Not a configured folder: {}", folder.display());
            }
            session.save_config()?;
            println!("Removed {}", folder.display());
        }
        FolderAction::List => {
            for folder in &session.settings().folders {
                println!("{}", folder.display());
            }
        }
    }
    Ok(())
}

fn scan(session: &mut LineageSession) -> Result<()> {
    if session.settings().folders.is_empty() {
        bail!("No working folders configured; add one with `clip-lineage folders add <dir>`");
    }

    let report = session.scan().context("Scan failed")?;
    for skipped in &report.skipped {
        eprintln!("Skipped {}: {}", skipped.path.display(), skipped.reason);
    }
    if let Some(err) = &report.cache_error {
        eprintln!("Cache not saved: {}", err);
    }
    println!(
        "{} clips, {} frame images ({} extracted, {} removed), {} links",
        report.clips,
        report.frames,
        report.extracted,
        report.removed,
        session.graph().edge_count()
    );
    Ok(())
}

fn concat(
    session: &LineageSession,
    clip: &Path,
    mode: FidelityMode,
    output: Option<PathBuf>,
) -> Result<()> {
    let chain = session.chain(clip)?;
    let output = match (output, mode) {
        (Some(path), _) => Some(path),
        (None, FidelityMode::Archival) => chain.last().map(|last| default_archival_output(last)),
        (None, FidelityMode::Preview) => None,
    };

    println!("Joining {} clips ({})", chain.len(), mode);
    let result = session
        .concat(&chain, mode, output.as_deref())
        .with_context(|| format!("Failed to join chain ending at {}", clip.display()))?;
    println!("{}", result.display());
    Ok(())
}

fn print_tree<'a>(
    tree: &'a ForwardTree,
    node: &'a Path,
    depth: usize,
    seen: &mut BTreeSet<&'a Path>,
) {
    println!("{}{}", "  ".repeat(depth), node.display());
    if !seen.insert(node) {
        return;
    }
    for child in tree.get(node).into_iter().flatten() {
        print_tree(tree, child, depth + 1, seen);
    }
}
