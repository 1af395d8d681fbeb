use std::io::Write;

use crate::{
    bookmarks::{parse_tags, Bookmark},
    errors::{SigilError, SigilResult},
};

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum EditorValue<T> {
    Set(T),
    Ignore,
}

impl<T> Default for EditorValue<T> {
    fn default() -> Self {
        EditorValue::Ignore
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct EditorBookmark {
    pub tags: EditorValue<Vec<String>>,
    pub desc: EditorValue<String>,
}

/// Render the editable part of a bookmark.
pub fn render(bmark: &Bookmark) -> String {
    format!(
        "# Sigil bookmark: {}\n\
         # {}:{}\n\
         # Lines starting with # above desc: are ignored.\n\
         \n\
         tags: {}\n\
         \n\
         desc:\n\
         {}\n",
        bmark.id,
        bmark.file,
        bmark.line,
        bmark.tags.join(", "),
        bmark.desc
    )
}

/// A missing `tags:` line or `desc:` header leaves that field alone.
/// `#` comments are only recognised above the `desc:` header, everything
/// below it is description text.
pub fn parse_editor_bookmark(input: &str) -> EditorBookmark {
    let mut editor_bookmark = EditorBookmark::default();

    let mut in_desc = false;
    let mut desc_lines: Vec<&str> = vec![];

    for line in input.lines() {
        let line = line.trim_end_matches('\r');

        if in_desc {
            desc_lines.push(line);
        } else if line.trim_start().starts_with('#') {
            continue;
        } else if let Some(raw) = line.strip_prefix("tags:") {
            editor_bookmark.tags = EditorValue::Set(parse_tags(raw));
        } else if line.trim_end() == "desc:" {
            in_desc = true;
        }
    }

    if in_desc {
        editor_bookmark.desc = EditorValue::Set(desc_lines.join("\n").trim().to_string());
    }

    editor_bookmark
}

fn editor_command() -> String {
    std::env::var("VISUAL")
        .or_else(|_| std::env::var("EDITOR"))
        .ok()
        .filter(|editor| !editor.trim().is_empty())
        .unwrap_or_else(|| "vi".into())
}

/// Open the bookmark in `$VISUAL`/`$EDITOR` and parse what comes back.
pub fn edit(bmark: &Bookmark) -> SigilResult<EditorBookmark> {
    let editor = editor_command();

    let mut temp_file = tempfile::Builder::new()
        .prefix("sigil-")
        .suffix(".sigil")
        .tempfile()?;
    temp_file.write_all(render(bmark).as_bytes())?;
    temp_file.flush()?;

    let path = temp_file.path().display().to_string();
    let shell = std::env::var("SHELL").unwrap_or("/bin/sh".into());
    log::debug!("running {editor} {path}");

    let status = std::process::Command::new(shell)
        .arg("-c")
        .arg(format!("{editor} \"{path}\""))
        .status()
        .map_err(|err| SigilError::Editor(format!("failed to run {editor}: {err}")))?;

    if !status.success() {
        return Err(SigilError::Editor(format!("{editor} exited with {status}")));
    }

    let content = std::fs::read_to_string(temp_file.path())?;

    Ok(parse_editor_bookmark(&content))
}
