use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lexicon::HostRecord;
use termwatch_core::commands::{Commands, InitReport, ensure_initialized_at, ensure_initialized_once};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(
    name = "termwatch",
    about = "Watchlist matching for documents in a forensic ingest pipeline"
)]
struct Cli {
    /// Working directory holding config.toml, lists/ and logbook/.
    /// Defaults to $TERMWATCH_ROOT, then .termwatch
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Create the root with default config and keyword lists
    Init,
    /// Analyze one file and print its host record
    Scan {
        file: PathBuf,
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Analyze every file under a directory, one JSON line per file
    ScanDir {
        dir: PathBuf,
        #[arg(long, default_value_t = 1)]
        jobs: usize,
    },
    /// Show the keyword catalog
    Catalog {
        /// Print a JSON summary instead of the entries
        #[arg(long)]
        json: bool,
    },
    /// Print the canonical tokens of some text
    Normalize { text: String },
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let root = cli.root.as_deref();
    match cli.cmd {
        Cmd::Init => init(root),
        Cmd::Scan { file, timeout_secs } => scan(root, &file, timeout_secs),
        Cmd::ScanDir { dir, jobs } => scan_dir(root, &dir, jobs),
        Cmd::Catalog { json } => catalog(root, json),
        Cmd::Normalize { text } => normalize(root, &text),
    }
}

/// An explicit `--root` gets its own catalog; otherwise the process-wide
/// root and catalog are used.
fn open(root: Option<&Path>) -> Result<Commands> {
    match root {
        Some(root) => Commands::open(root),
        None => Commands::new(),
    }
}

fn init(root: Option<&Path>) -> Result<()> {
    let owned;
    let report: &InitReport = match root {
        Some(root) => {
            owned = ensure_initialized_at(root)?;
            &owned
        }
        None => ensure_initialized_once()?,
    };
    for item in &report.created {
        println!("created  {item}");
    }
    for item in &report.existed {
        println!("exists   {item}");
    }
    println!("initialized termwatch root at {}", report.root.display());
    Ok(())
}

/// Exit status stays 0 for error records; the host reads `status`.
fn scan(root: Option<&Path>, file: &Path, timeout_secs: Option<u64>) -> Result<()> {
    let record = match open(root) {
        Ok(cmds) => match timeout_secs {
            Some(secs) => cmds
                .analyzer()
                .analyze_path_with_budget(file, Duration::from_secs(secs))
                .to_record(),
            None => cmds.scan_file(file),
        },
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "could not prepare analysis");
            HostRecord::error(format!("{e:#}"))
        }
    };
    println!("{}", record.to_json()?);
    Ok(())
}

fn scan_dir(root: Option<&Path>, dir: &Path, jobs: usize) -> Result<()> {
    let files: Vec<PathBuf> = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();

    let cmds = match open(root) {
        Ok(cmds) => cmds,
        Err(e) => {
            let record = HostRecord::error(format!("{e:#}"));
            for path in &files {
                print_line(path, &record)?;
            }
            return Ok(());
        }
    };

    let chunk = files.len().div_ceil(jobs.max(1)).max(1);
    let results: Vec<HostRecord> = thread::scope(|s| {
        let handles: Vec<_> = files
            .chunks(chunk)
            .map(|part| {
                let cmds = &cmds;
                let handle = s.spawn(move || part.iter().map(|p| cmds.scan_file(p)).collect::<Vec<_>>());
                (part.len(), handle)
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|(len, h)| {
                h.join().unwrap_or_else(|_| {
                    tracing::error!("scan worker panicked");
                    vec![HostRecord::error("analysis worker panicked"); len]
                })
            })
            .collect()
    });

    for (path, record) in files.iter().zip(&results) {
        print_line(path, record)?;
    }
    Ok(())
}

fn print_line(path: &Path, record: &HostRecord) -> Result<()> {
    let line = serde_json::json!({ "path": path.to_string_lossy(), "record": record });
    println!("{}", serde_json::to_string(&line).context("serializing scan-dir line")?);
    Ok(())
}

fn catalog(root: Option<&Path>, json: bool) -> Result<()> {
    let cmds = open(root)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&cmds.catalog_report())?);
        return Ok(());
    }
    for entry in cmds.catalog().entries().iter() {
        println!("{entry}");
    }
    Ok(())
}

fn normalize(root: Option<&Path>, text: &str) -> Result<()> {
    let cmds = open(root)?;
    println!("{}", cmds.normalize_text(text).join(" "));
    Ok(())
}
