//! CLI command implementations.

use chrono::{DateTime, FixedOffset};
use knot_git::{ClientConfig, GitError, Negotiation, RefAdvertisement, RemoteClient};
use knot_storage::{
    Commit, ObjectId, ObjectStore, ObjectType, Repository, Signature, StorageError, Tree,
    META_DIR,
};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// CLI errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, CliError>;

fn parse_id(hex: &str) -> Result<ObjectId> {
    ObjectId::from_hex(hex)
        .map_err(|_| CliError::InvalidArgument(format!("not a valid object id: {hex}")))
}

fn no_commits() -> CliError {
    CliError::InvalidArgument("current branch has no commits yet".to_string())
}

fn client_config(timeout: Option<u64>) -> ClientConfig {
    ClientConfig {
        timeout_secs: timeout,
        ..ClientConfig::default()
    }
}

/// Create an empty repository.
pub fn init(root: &Path, out: &mut impl Write) -> Result<()> {
    let repo = Repository::init(root)?;
    writeln!(
        out,
        "Initialized empty Knot repository in {}",
        repo.meta_dir().display()
    )?;
    Ok(())
}

/// Hash a file as a blob, storing it when `write` is set.
pub fn hash_object(root: &Path, file: &Path, write: bool, out: &mut impl Write) -> Result<()> {
    let id = match Repository::open(root) {
        Ok(repo) => repo.objects().hash_file(file, write)?,
        Err(StorageError::NotARepository(_)) if !write => {
            let store = ObjectStore::new(root.join(META_DIR).join("objects"));
            store.hash_file(file, false)?
        }
        Err(e) => return Err(e.into()),
    };
    writeln!(out, "{id}")?;
    Ok(())
}

/// What `cat-file` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatMode {
    Type,
    Size,
    Pretty,
}

/// Print a stored object's type, size, or content.
pub fn cat_file(root: &Path, object: &str, mode: CatMode, out: &mut impl Write) -> Result<()> {
    let repo = Repository::open(root)?;
    let id = parse_id(object)?;
    let object = repo.objects().read_object(&id)?;

    match mode {
        CatMode::Type => {
            writeln!(out, "{}", object.object_type)?;
            return Ok(());
        }
        CatMode::Size => {
            writeln!(out, "{}", object.size())?;
            return Ok(());
        }
        CatMode::Pretty => {}
    }

    match object.object_type {
        ObjectType::Tree => {
            for entry in Tree::from_object(&object)?.entries() {
                writeln!(out, "{entry}")?;
            }
        }
        ObjectType::Blob | ObjectType::Commit => out.write_all(&object.data)?,
    }
    Ok(())
}

/// List a tree, or the tree of a commit.
pub fn ls_tree(root: &Path, object: &str, name_only: bool, out: &mut impl Write) -> Result<()> {
    let repo = Repository::open(root)?;
    let id = parse_id(object)?;
    let object = repo.objects().read_object(&id)?;

    let tree = match object.object_type {
        ObjectType::Tree => Tree::from_object(&object)?,
        ObjectType::Commit => {
            let commit = Commit::from_object(&object)?;
            repo.objects().read_tree(&commit.tree)?
        }
        ObjectType::Blob => {
            return Err(CliError::InvalidArgument(format!("{id} is not a tree")));
        }
    };

    for entry in tree.entries() {
        if name_only {
            writeln!(out, "{}", entry.name)?;
        } else {
            writeln!(out, "{entry}")?;
        }
    }
    Ok(())
}

/// Snapshot the working directory.
pub fn write_tree(root: &Path, out: &mut impl Write) -> Result<()> {
    let repo = Repository::open(root)?;
    writeln!(out, "{}", repo.write_tree()?)?;
    Ok(())
}

/// Create a commit object without moving any ref.
pub fn commit_tree(
    root: &Path,
    tree: &str,
    parent: Option<&str>,
    message: &str,
    out: &mut impl Write,
) -> Result<()> {
    let repo = Repository::open(root)?;
    let tree = parse_id(tree)?;
    let parent = parent.map(parse_id).transpose()?;
    let id = repo.commit_tree(&tree, parent.as_ref(), message)?;
    writeln!(out, "{id}")?;
    Ok(())
}

/// Snapshot and commit on the current branch.
pub fn commit(root: &Path, message: &str, out: &mut impl Write) -> Result<()> {
    let repo = Repository::open(root)?;
    let id = repo.commit(message)?;
    let branch = repo
        .refs()
        .current_branch()?
        .unwrap_or_else(|| "detached HEAD".to_string());
    let summary = message.lines().next().unwrap_or_default();
    writeln!(out, "[{branch} {}] {summary}", &id.to_hex()[..7])?;
    Ok(())
}

fn format_date(sig: &Signature) -> String {
    let offset = FixedOffset::east_opt(sig.offset_minutes * 60);
    match (DateTime::from_timestamp(sig.timestamp, 0), offset) {
        (Some(utc), Some(offset)) => utc
            .with_timezone(&offset)
            .format("%a %b %-d %H:%M:%S %Y %z")
            .to_string(),
        _ => format!("{} {}", sig.timestamp, sig.offset_string()),
    }
}

/// Show first-parent history from `start`, or from `HEAD`.
pub fn log(root: &Path, start: Option<&str>, out: &mut impl Write) -> Result<()> {
    let repo = Repository::open(root)?;
    let start = match start {
        Some(hex) => parse_id(hex)?,
        None => repo.refs().resolve_head()?.ok_or_else(no_commits)?,
    };

    for (i, item) in repo.log(start).enumerate() {
        let (id, commit) = item?;
        if i > 0 {
            writeln!(out)?;
        }
        let author = &commit.author;
        writeln!(out, "commit {id}")?;
        writeln!(out, "Author: {} <{}>", author.name, author.email)?;
        writeln!(out, "Date:   {}", format_date(author))?;
        writeln!(out)?;
        for line in commit.message.lines() {
            writeln!(out, "    {line}")?;
        }
    }
    Ok(())
}

fn print_refs(adv: &RefAdvertisement, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{}\tHEAD", adv.advertised_head)?;
    for (name, id) in &adv.refs {
        writeln!(out, "{id}\t{name}")?;
    }
    Ok(())
}

fn print_negotiation(negotiation: &Negotiation, out: &mut impl Write) -> Result<()> {
    let adv = &negotiation.advertisement;
    let bundle = &negotiation.bundle;
    writeln!(out, "head:    {}", adv.head)?;
    writeln!(
        out,
        "branch:  {}",
        adv.default_branch.as_deref().unwrap_or("(none)")
    )?;
    writeln!(out, "objects: {}", bundle.object_count())?;
    writeln!(out, "bytes:   {}", bundle.len())?;
    Ok(())
}

/// List a remote's refs.
pub fn ls_remote(url: &str, timeout: Option<u64>, out: &mut impl Write) -> Result<()> {
    let mut client = RemoteClient::connect(url, client_config(timeout))?;
    let adv = client.discover_refs()?;
    print_refs(&adv, out)
}

/// Negotiate a full fetch of the remote's default branch.
pub fn fetch_pack(
    url: &str,
    timeout: Option<u64>,
    output: Option<&Path>,
    out: &mut impl Write,
) -> Result<()> {
    let mut client = RemoteClient::connect(url, client_config(timeout))?;
    let negotiation = client.negotiate()?;
    print_negotiation(&negotiation, out)?;

    if let Some(path) = output {
        std::fs::write(path, negotiation.bundle.as_bytes())?;
        tracing::info!(path = %path.display(), "saved bundle");
    }
    Ok(())
}

/// Print version information.
pub fn version(out: &mut impl Write) -> Result<()> {
    writeln!(out, "knot {}", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
