use std::path::PathBuf;

use anyhow::{bail, Context};
use inquire::error::InquireResult;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{output, Command};
use crate::{
    bookmarks::{self, parse_tags, Bookmark, BookmarkCreate, Status},
    editor::{self, EditorValue},
    errors::SigilError,
    project::{self, Project},
    reconcile::{self, Mode, Summary},
    search_query,
    snapshot,
    storage::Loaded,
};

static PRIMER: &str = include_str!("../../PRIMER.md");

/// `path/to/file:42`
static LOCATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<file>.+):(?P<line>\d+)$").expect("valid regex"));
/// `+3`, `-12`
static RELATIVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<delta>[+-]\d+)$").expect("valid regex"));

pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        #[cfg(feature = "markdown-docs")]
        Command::MarkdownDocs {} => {
            println!("{}", clap_markdown::help_markdown::<super::Args>());
            Ok(())
        }
        Command::Primer {} => {
            print!("{PRIMER}");
            Ok(())
        }
        Command::Init {} => cmd_init(),
        Command::Add {
            location,
            tags,
            desc,
        } => cmd_add(&location, tags.as_deref(), desc),
        Command::List {
            tags,
            file,
            stale,
            json,
        } => cmd_list(tags.as_deref(), file.as_deref(), stale, json),
        Command::Show { id } => cmd_show(&id),
        Command::Delete { id, tags, yes } => cmd_delete(id.as_deref(), tags.as_deref(), yes),
        Command::Validate { fix } => cmd_validate(fix),
        Command::Search { terms, limit, json } => cmd_search(&terms, limit, json),
        Command::Move { id, target } => cmd_move(&id, &target),
        Command::Edit { id } => cmd_edit(&id),
    }
}

/// Open the project and load its bookmarks, reporting skipped records.
fn load() -> anyhow::Result<(Project, Vec<Bookmark>)> {
    let mut project = Project::discover()?;
    let Loaded {
        bookmarks,
        warnings,
    } = project.load()?;

    for warning in &warnings {
        eprintln!("warning: {warning}");
    }

    Ok((project, bookmarks))
}

fn confirm(message: String) -> anyhow::Result<bool> {
    match inquire::prompt_confirmation(message) {
        InquireResult::Ok(answer) => Ok(answer),
        InquireResult::Err(err) => bail!("An error occurred: {}", err),
    }
}

/// Split `file:line` into its parts.
fn parse_location(location: &str) -> Result<(PathBuf, usize), SigilError> {
    let caps = LOCATION_RE.captures(location).ok_or_else(|| {
        SigilError::InvalidLocation(format!(
            "'{location}', expected file:line (e.g. src/main.rs:42)"
        ))
    })?;

    let line = caps["line"]
        .parse::<usize>()
        .map_err(|_| SigilError::InvalidLocation(format!("invalid line number in '{location}'")))?;

    Ok((PathBuf::from(&caps["file"]), line))
}

fn cmd_init() -> anyhow::Result<()> {
    let root = std::env::current_dir()?;
    let project = Project::open(&root)?;
    println!(
        "Initialized sigil in {}",
        project.root.join(project::SIGIL_DIR).display()
    );
    Ok(())
}

fn cmd_add(location: &str, tags: Option<&str>, desc: String) -> anyhow::Result<()> {
    let (project, mut bmarks) = load()?;
    let (path, line) = parse_location(location)?;

    let file = project.relativize(&path)?;
    let snapshot = snapshot::capture_file(&project.resolve(&file), line, project.config.context_lines)
        .with_context(|| format!("cannot bookmark {file}:{line}"))?;

    let bmark = Bookmark::create(
        BookmarkCreate {
            file,
            line,
            tags: tags.map(parse_tags).unwrap_or_default(),
            desc,
            snapshot,
        },
        bookmarks::now(),
    );

    log::info!("adding {} at {}:{}", bmark.id, bmark.file, bmark.line);
    bmarks.push(bmark.clone());
    project.save(&bmarks)?;

    println!("Added bookmark {} → {}:{}", bmark.short_id(), bmark.file, bmark.line);
    if !bmark.tags.is_empty() {
        println!("  Tags: {}", bmark.tags.join(", "));
    }
    if !bmark.desc.is_empty() {
        println!("  Desc: {}", bmark.desc);
    }
    println!("  Context: {}", bmark.snapshot.target.trim());
    Ok(())
}

fn cmd_list(tags: Option<&str>, file: Option<&str>, stale: bool, json: bool) -> anyhow::Result<()> {
    let (_, bmarks) = load()?;

    let filter_tags = tags.map(parse_tags);
    let found = bmarks
        .iter()
        .filter(|b| filter_tags.as_ref().map_or(true, |tags| b.has_any_tag(tags)))
        .filter(|b| file.map_or(true, |pattern| b.file.contains(pattern)))
        .filter(|b| !stale || b.status.is_broken())
        .collect::<Vec<_>>();

    if found.is_empty() {
        println!("No bookmarks found.");
        return Ok(());
    }

    if json {
        let views = found
            .iter()
            .map(|b| output::BookmarkView::from(*b))
            .collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    output::print_table(&found);
    Ok(())
}

fn cmd_show(id: &str) -> anyhow::Result<()> {
    let (project, mut bmarks) = load()?;
    let idx = bookmarks::find_index(&bmarks, id)?;

    bmarks[idx].accessed = Some(bookmarks::now());
    project.save(&bmarks)?;

    output::print_details(&bmarks[idx]);
    Ok(())
}

fn cmd_delete(id: Option<&str>, tags: Option<&str>, yes: bool) -> anyhow::Result<()> {
    let (project, mut bmarks) = load()?;

    if let Some(id) = id {
        let idx = bookmarks::find_index(&bmarks, id)?;
        let bmark = bmarks.remove(idx);
        project.save(&bmarks)?;
        println!(
            "Deleted bookmark {} ({}:{})",
            bmark.short_id(),
            bmark.file,
            bmark.line
        );
        return Ok(());
    }

    let Some(tags) = tags else {
        bail!("specify a bookmark id or --tags to delete");
    };

    let filter_tags = parse_tags(tags);
    let (to_delete, keep): (Vec<_>, Vec<_>) =
        bmarks.into_iter().partition(|b| b.has_any_tag(&filter_tags));

    if to_delete.is_empty() {
        println!("No bookmarks match those tags.");
        return Ok(());
    }

    println!("Deleting {} bookmark(s):", to_delete.len());
    for bmark in &to_delete {
        println!("  {} → {}:{}", bmark.short_id(), bmark.file, bmark.line);
    }

    if !yes && !confirm(format!("Delete {} bookmark(s)?", to_delete.len()))? {
        return Ok(());
    }

    project.save(&keep)?;
    println!("Deleted {} bookmark(s).", to_delete.len());
    Ok(())
}

fn cmd_validate(fix: bool) -> anyhow::Result<()> {
    let (project, mut bmarks) = load()?;

    if bmarks.is_empty() {
        println!("No bookmarks to validate.");
        return Ok(());
    }

    let mode = if fix { Mode::Fix } else { Mode::Report };
    let results = reconcile::reconcile_all(&project.root, &bmarks, &project.config.reconcile_options());

    let now = bookmarks::now();
    let mut fixed = 0;
    for (bmark, result) in bmarks.iter_mut().zip(&results) {
        if reconcile::apply(bmark, &result.outcome, mode, now) {
            fixed += 1;
        }
    }

    project.save(&bmarks)?;

    let summary = Summary::from_results(&results);
    log::info!(
        "validated {}: {} valid, {} moved, {} stale, {} missing",
        summary.total(),
        summary.valid,
        summary.moved,
        summary.stale,
        summary.missing_file
    );
    output::print_validation(&results, &summary);

    if fix && fixed > 0 {
        println!("\n  Fixed {fixed} bookmark line number(s).");
    }
    Ok(())
}

fn cmd_search(terms: &[String], limit: Option<usize>, json: bool) -> anyhow::Result<()> {
    let (project, bmarks) = load()?;
    let limit = limit.or(project.config.search_limit);

    let results = search_query::search(&bmarks, terms, limit);

    if json {
        let views = results
            .iter()
            .map(output::BookmarkView::from)
            .collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No bookmarks matching '{}'.", terms.join(" "));
        return Ok(());
    }

    output::print_ranked(&results);
    Ok(())
}

/// Where `move` should put the bookmark.
#[derive(Debug, PartialEq)]
enum MoveTarget {
    Relative(i64),
    Absolute(usize),
    Location(PathBuf, usize),
}

fn parse_move_target(target: &str) -> Result<MoveTarget, SigilError> {
    if let Some(caps) = RELATIVE_RE.captures(target) {
        let delta = caps["delta"]
            .parse::<i64>()
            .map_err(|_| SigilError::InvalidLocation(format!("invalid offset '{target}'")))?;
        return Ok(MoveTarget::Relative(delta));
    }

    if let Ok(line) = target.parse::<usize>() {
        return Ok(MoveTarget::Absolute(line));
    }

    let (path, line) = parse_location(target)?;
    Ok(MoveTarget::Location(path, line))
}

/// `line + delta`, or `None` if the result is below 1 or overflows.
fn offset_line(line: usize, delta: i64) -> Option<usize> {
    let line = i64::try_from(line).ok()?.checked_add(delta)?;
    usize::try_from(line).ok().filter(|line| *line >= 1)
}

fn cmd_move(id: &str, target: &str) -> anyhow::Result<()> {
    let (project, mut bmarks) = load()?;
    let idx = bookmarks::find_index(&bmarks, id)?;
    let bmark = &bmarks[idx];

    let (file, line) = match parse_move_target(target)? {
        MoveTarget::Relative(delta) => {
            let Some(line) = offset_line(bmark.line, delta) else {
                bail!("offset {delta} moves line {} out of range", bmark.line);
            };
            (bmark.file.clone(), line)
        }
        MoveTarget::Absolute(line) => (bmark.file.clone(), line),
        MoveTarget::Location(path, line) => (project.relativize(&path)?, line),
    };

    if line < 1 {
        bail!("line number must be >= 1 (got {line})");
    }

    let snapshot = snapshot::capture_file(&project.resolve(&file), line, project.config.context_lines)
        .with_context(|| format!("cannot move to {file}:{line}"))?;

    let bmark = &mut bmarks[idx];
    let old_location = format!("{}:{}", bmark.file, bmark.line);
    bmark.file = file;
    bmark.line = line;
    bmark.snapshot = snapshot;
    bmark.status = Status::Valid;
    bmark.checked = Some(bookmarks::now());

    let bmark = bmark.clone();
    project.save(&bmarks)?;

    println!(
        "Moved {}: {old_location} → {}:{}",
        bmark.short_id(),
        bmark.file,
        bmark.line
    );
    println!("  Context: {}", bmark.snapshot.target.trim());
    Ok(())
}

fn cmd_edit(id: &str) -> anyhow::Result<()> {
    let (project, mut bmarks) = load()?;
    let idx = bookmarks::find_index(&bmarks, id)?;

    let edited = editor::edit(&bmarks[idx])?;
    let bmark = &mut bmarks[idx];

    let tags = match edited.tags {
        EditorValue::Set(tags) => tags,
        EditorValue::Ignore => bmark.tags.clone(),
    };
    let desc = match edited.desc {
        EditorValue::Set(desc) => desc,
        EditorValue::Ignore => bmark.desc.clone(),
    };

    if tags == bmark.tags && desc == bmark.desc {
        println!("No changes.");
        return Ok(());
    }

    bmark.tags = tags;
    bmark.desc = desc;
    bmark.accessed = Some(bookmarks::now());
    let short_id = bmark.short_id().to_string();

    project.save(&bmarks)?;
    println!("Updated bookmark {short_id}");
    Ok(())
}
