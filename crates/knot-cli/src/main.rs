//! Knot CLI - plumbing commands over a local object store and remote negotiation.

use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// Knot - content-addressed snapshots and smart HTTP fetch
#[derive(Parser, Debug)]
#[command(name = "knot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Run as if started in <path>
    #[arg(short = 'C', value_name = "path", default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an empty repository
    Init,

    /// Compute a file's object id, optionally storing it
    HashObject {
        /// Write the blob into the object store
        #[arg(short)]
        write: bool,
        /// File to hash
        file: PathBuf,
    },

    /// Print a stored object's type, size, or content
    #[command(group(ArgGroup::new("mode").required(true)))]
    CatFile {
        /// Print the object's type
        #[arg(short = 't', group = "mode")]
        kind: bool,
        /// Print the object's size
        #[arg(short = 's', group = "mode")]
        size: bool,
        /// Pretty-print the object's content
        #[arg(short = 'p', group = "mode")]
        pretty: bool,
        /// Object id
        object: String,
    },

    /// List a tree (or a commit's tree)
    LsTree {
        /// Print entry names only
        #[arg(long)]
        name_only: bool,
        /// Tree or commit id
        object: String,
    },

    /// Snapshot the working directory as a tree
    WriteTree,

    /// Create a commit from a tree
    CommitTree {
        /// Tree id
        tree: String,
        /// Parent commit
        #[arg(short)]
        parent: Option<String>,
        /// Commit message
        #[arg(short)]
        message: String,
    },

    /// Snapshot the working directory and commit it on the current branch
    Commit {
        /// Commit message
        #[arg(short)]
        message: String,
    },

    /// Show first-parent history
    Log {
        /// Starting commit (default: HEAD)
        commit: Option<String>,
    },

    /// List the refs a remote advertises
    LsRemote {
        /// Remote repository URL
        url: String,
        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Negotiate with a remote and fetch a bundle for its default branch
    FetchPack {
        /// Remote repository URL
        url: String,
        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Save the bundle to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("knot={log_level}").into()),
        )
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let root = cli.root.as_path();
    let mut out = std::io::stdout().lock();

    let result = match cli.command {
        Commands::Init => commands::init(root, &mut out),
        Commands::HashObject { write, file } => {
            commands::hash_object(root, &file, write, &mut out)
        }
        Commands::CatFile {
            kind,
            size,
            pretty,
            object,
        } => {
            let mode = if kind {
                commands::CatMode::Type
            } else if size {
                commands::CatMode::Size
            } else {
                debug_assert!(pretty);
                commands::CatMode::Pretty
            };
            commands::cat_file(root, &object, mode, &mut out)
        }
        Commands::LsTree { name_only, object } => {
            commands::ls_tree(root, &object, name_only, &mut out)
        }
        Commands::WriteTree => commands::write_tree(root, &mut out),
        Commands::CommitTree {
            tree,
            parent,
            message,
        } => commands::commit_tree(root, &tree, parent.as_deref(), &message, &mut out),
        Commands::Commit { message } => commands::commit(root, &message, &mut out),
        Commands::Log { commit } => commands::log(root, commit.as_deref(), &mut out),
        Commands::LsRemote { url, timeout } => commands::ls_remote(&url, timeout, &mut out),
        Commands::FetchPack {
            url,
            timeout,
            output,
        } => commands::fetch_pack(&url, timeout, output.as_deref(), &mut out),
        Commands::Version => commands::version(&mut out),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
