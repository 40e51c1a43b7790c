use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use crossbeam_channel::bounded;
use indicatif::{ProgressBar, ProgressStyle};

use reclaim::{load_projects, CancelToken, MatchInfo, Scanner};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Find build artifacts and dependency caches next to their project manifests, and reclaim the disk space they hold",
    long_about = None
)]
struct Args {
    /// Directory to scan (defaults to the current directory)
    path: Option<PathBuf>,

    /// Report what would be deleted without removing anything
    #[arg(long)]
    dry_run: bool,

    /// Delete every discovered batch without prompting
    #[arg(long, short)]
    yes: bool,
}

/// What the consumer decided about one emitted batch.
enum BatchOutcome {
    /// Deletion proceeded; this much was reclaimed (MiB).
    Reclaimed(f64),
    /// The user skipped this batch.
    Skipped,
    /// The user aborted the whole scan.
    Aborted,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let root = resolve_root(args.path.as_deref())?;
    let projects = load_projects()?;
    let scanner = Scanner::new(&root, projects)?;

    let (sender, receiver) = bounded::<MatchInfo>(1);
    let cancel = CancelToken::new();
    let scan_cancel = cancel.clone();
    let producer = thread::spawn(move || scanner.run(sender, &scan_cancel));

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("spinner template is valid"),
    );
    spinner.set_message("Scanning...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let mut total_reclaimed = 0.0;
    for info in receiver {
        match spinner.suspend(|| review_batch(&info, args.dry_run, args.yes)) {
            BatchOutcome::Reclaimed(mib) => total_reclaimed += mib,
            BatchOutcome::Skipped => {}
            BatchOutcome::Aborted => {
                cancel.cancel();
                break;
            }
        }
    }
    spinner.finish_and_clear();

    if producer.join().is_err() {
        bail!("scanner thread panicked");
    }

    println!(
        "Total size reclaimed: {}",
        format!("{total_reclaimed:.3} MiB").green().bold()
    );
    if args.dry_run {
        println!("Dry run mode: nothing was deleted.");
    }

    Ok(())
}

/// Resolve the user-supplied path (possibly absent or empty) into the
/// absolute root the scanner requires.
fn resolve_root(path: Option<&Path>) -> Result<PathBuf> {
    let requested = match path {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => env::current_dir().context("cannot determine the current directory")?,
    };
    requested
        .canonicalize()
        .with_context(|| format!("cannot resolve path {}", requested.display()))
}

/// Show one batch, ask for confirmation, and delete on approval.
/// Deletion failures are reported per directory and do not abort the
/// rest of the batch; a failed removal does not count as reclaimed.
fn review_batch(info: &MatchInfo, dry_run: bool, assume_yes: bool) -> BatchOutcome {
    println!(
        "Found a {} project with the following directories:",
        info.project.cyan().bold()
    );
    for (dir, size) in &info.targets {
        println!("{}", format!("- {}, {size:.3} MiB", dir.display()).dimmed());
    }

    let confirmed = if assume_yes {
        true
    } else {
        match prompt_confirmation() {
            Some(answer) => answer,
            None => return BatchOutcome::Aborted,
        }
    };
    if !confirmed {
        return BatchOutcome::Skipped;
    }

    let mut reclaimed = 0.0;
    for (dir, size) in &info.targets {
        if dry_run {
            println!("Would remove: {}", dir.display());
            reclaimed += size;
            continue;
        }
        println!("{}", format!("Deleting {}", dir.display()).red());
        match fs::remove_dir_all(dir) {
            Ok(()) => reclaimed += size,
            Err(err) => eprintln!("Error removing {}: {}. Skipping.", dir.display(), err),
        }
    }
    BatchOutcome::Reclaimed(reclaimed)
}

/// Ask the y/N question. `None` means abort the scan: end of input, an
/// unreadable stdin, or an explicit `q`.
fn prompt_confirmation() -> Option<bool> {
    print!(
        "{} ",
        "Do you want to delete these directories? [y/N]".red().bold()
    );
    let _ = io::stdout().flush();

    let mut line = String::new();
    match io::stdin().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => {
            let answer = line.trim();
            if answer.eq_ignore_ascii_case("q") {
                None
            } else {
                Some(answer.eq_ignore_ascii_case("y"))
            }
        }
    }
}
