//! minigit CLI — the human interface to the snapshot engine.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use minigit_core::merge::MergeOutcome;
use minigit_core::repo::CheckoutOutcome;
use minigit_core::Repository;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "minigit", about = "minigit — a minimal content-addressed VCS", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new minigit repository.
    Init,

    /// Stage files for the next commit.
    Add {
        /// Paths to stage.
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Record the staged changes as a new commit.
    Commit {
        /// Single-line commit message.
        #[arg(long, short)]
        message: String,
    },

    /// Show the first-parent history from HEAD.
    Log {
        /// Output format: "human" (default) or "json".
        #[arg(long, default_value = "human")]
        format: String,
    },

    /// Show the current branch, staged entries, and branch list.
    Status {
        /// Output format: "human" (default) or "json".
        #[arg(long, default_value = "human")]
        format: String,
    },

    /// Create a branch, or list branches when no name is given.
    Branch {
        /// Name of the branch to create.
        name: Option<String>,
    },

    /// Switch the working tree to a branch or commit.
    Checkout {
        /// Branch name or commit hash. Branches take precedence.
        target: String,
    },

    /// Merge a branch into the current one.
    Merge {
        /// Branch to merge from.
        branch: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cwd = std::env::current_dir().unwrap_or_else(|e| {
        eprintln!("error: cannot determine current directory: {e}");
        process::exit(1);
    });

    let result = match cli.command {
        Commands::Init => cmd_init(&cwd),
        Commands::Add { paths } => cmd_add(&cwd, &paths),
        Commands::Commit { message } => cmd_commit(&cwd, &message),
        Commands::Log { format } => cmd_log(&cwd, &format),
        Commands::Status { format } => cmd_status(&cwd, &format),
        Commands::Branch { name } => cmd_branch(&cwd, name.as_deref()),
        Commands::Checkout { target } => cmd_checkout(&cwd, &target),
        Commands::Merge { branch } => cmd_merge(&cwd, &branch),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

type CmdResult = Result<(), Box<dyn std::error::Error>>;

fn cmd_init(cwd: &PathBuf) -> CmdResult {
    Repository::init(cwd)?;
    println!("initialized minigit repository in .minigit/");
    Ok(())
}

fn cmd_add(cwd: &PathBuf, paths: &[String]) -> CmdResult {
    let repo = Repository::open(cwd)?;
    let report = repo.add(paths)?;

    for path in &report.staged {
        println!("added {path}");
    }
    for skip in &report.skipped {
        eprintln!("error: {}", skip.reason);
    }

    if report.skipped.is_empty() {
        Ok(())
    } else {
        // Diagnostics were already printed per path.
        process::exit(1)
    }
}

fn cmd_commit(cwd: &PathBuf, message: &str) -> CmdResult {
    let repo = Repository::open(cwd)?;
    let hash = repo.commit(message)?;

    let status = repo.status()?;
    let branch = status.branch.as_deref().unwrap_or("HEAD");
    println!("[{branch} {}] {message}", &hash[..7]);
    Ok(())
}

fn cmd_log(cwd: &PathBuf, format: &str) -> CmdResult {
    let repo = Repository::open(cwd)?;
    let entries = repo.log()?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&entries)?),
        _ => {
            for entry in &entries {
                println!("commit {}", entry.hash);
                if entry.parents.len() > 1 {
                    println!("Merge:  {}", entry.parents.join(" "));
                }
                println!("Date:   {}", entry.timestamp);
                println!("\n    {}\n", entry.message);
            }
        }
    }
    Ok(())
}

fn cmd_status(cwd: &PathBuf, format: &str) -> CmdResult {
    let repo = Repository::open(cwd)?;
    let status = repo.status()?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&status)?),
        _ => {
            match &status.branch {
                Some(branch) => println!("On branch {branch}"),
                None => println!("DETACHED HEAD"),
            }
            if let Some(target) = &status.merge_in_progress {
                println!("Merging branch '{target}' (commit to conclude)");
            }

            println!("\nStaged changes:");
            if status.staged.is_empty() {
                println!("  (no files staged)");
            } else {
                for entry in &status.staged {
                    println!("  {} {}", entry.status.code(), entry.path);
                }
            }

            println!("\nBranches:");
            for branch in &status.branches {
                let marker = if branch.current { "*" } else { " " };
                println!("{marker} {}", branch.name);
            }
        }
    }
    Ok(())
}

fn cmd_branch(cwd: &PathBuf, name: Option<&str>) -> CmdResult {
    let repo = Repository::open(cwd)?;

    match name {
        Some(name) => {
            repo.branch(name)?;
            println!("created branch {name}");
        }
        None => {
            let status = repo.status()?;
            for branch in &status.branches {
                let marker = if branch.current { "*" } else { " " };
                println!("{marker} {}", branch.name);
            }
        }
    }
    Ok(())
}

fn cmd_checkout(cwd: &PathBuf, target: &str) -> CmdResult {
    let repo = Repository::open(cwd)?;

    match repo.checkout(target)? {
        CheckoutOutcome::Branch { name, .. } => println!("switched to branch '{name}'"),
        CheckoutOutcome::Detached { hash } => println!("detached HEAD at {hash}"),
    }
    Ok(())
}

fn cmd_merge(cwd: &PathBuf, branch: &str) -> CmdResult {
    let repo = Repository::open(cwd)?;

    match repo.merge(branch)? {
        MergeOutcome::UpToDate => println!("Already up-to-date"),
        MergeOutcome::FastForward { target } => {
            println!("Fast-forward to {target}");
        }
        MergeOutcome::Merged { staged, conflicts } => {
            for path in &conflicts {
                println!("CONFLICT: {path} - manual resolution required");
            }
            if conflicts.is_empty() {
                println!(
                    "merged '{branch}': {} file(s) staged; commit to conclude",
                    staged.len()
                );
            } else {
                println!(
                    "merge of '{branch}' has {} conflict(s); resolve, add, and commit",
                    conflicts.len()
                );
            }
        }
    }
    Ok(())
}
