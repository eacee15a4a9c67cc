//! Terminal interaction for bookmark edits
//!
//! Notes are edited in `$VISUAL`/`$EDITOR` through a scratch file that shows
//! the bookmark below a cut line; everything under the cut line is dropped
//! on save. Also the y/N and keep-or-replace prompts.

use std::env;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::process::Command;

use anyhow::{bail, Context, Result};

use bookmarkd_core::models::MAX_NOTES_LEN;
use bookmarkd_core::Bookmark;

/// Lines from this one down are not part of the notes
const CUT_LINE: &str = "# ------------------------ >8 ------------------------";

/// Used when neither `$VISUAL` nor `$EDITOR` is set
const FALLBACK_EDITOR: &str = "vi";

/// Edit a bookmark's notes in the user's editor
///
/// Returns `None` when the notes come back unchanged.
pub fn edit_notes(bookmark: &Bookmark) -> Result<Option<String>> {
    let command = editor_command(env::var("VISUAL").ok(), env::var("EDITOR").ok());
    let (program, args) = command
        .split_first()
        .context("Editor command is empty")?;

    let mut scratch = tempfile::Builder::new()
        .prefix("bookmarkd-notes-")
        .suffix(".md")
        .tempfile()
        .context("Failed to create notes file")?;
    scratch
        .write_all(notes_template(bookmark).as_bytes())
        .context("Failed to write notes file")?;
    scratch.flush().context("Failed to write notes file")?;

    let status = Command::new(program)
        .args(args)
        .arg(scratch.path())
        .status()
        .with_context(|| format!("Failed to run editor '{}'", program))?;
    if !status.success() {
        bail!("Editor '{}' exited with {}; notes left unchanged", program, status);
    }

    let edited = fs::read_to_string(scratch.path()).context("Failed to read notes file")?;
    let notes = parse_notes(&edited);

    let length = notes.chars().count();
    if length > MAX_NOTES_LEN {
        eprintln!(
            "Notes are {} characters; only the first {} are kept.",
            length, MAX_NOTES_LEN
        );
    }

    Ok((notes != bookmark.notes).then_some(notes))
}

/// Editor program and its arguments, e.g. `code --wait`
fn editor_command(visual: Option<String>, editor: Option<String>) -> Vec<String> {
    [visual, editor]
        .into_iter()
        .flatten()
        .map(|value| {
            value
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .find(|parts| !parts.is_empty())
        .unwrap_or_else(|| vec![FALLBACK_EDITOR.to_string()])
}

/// Scratch file contents: current notes, then the bookmark for reference
fn notes_template(bookmark: &Bookmark) -> String {
    let mut text = String::new();
    if !bookmark.notes.is_empty() {
        text.push_str(&bookmark.notes);
        text.push('\n');
    }
    text.push('\n');
    text.push_str(CUT_LINE);
    text.push('\n');
    text.push_str(&format!("# {}\n# {}\n", bookmark.title, bookmark.url));
    text.push_str(&format!(
        "# Write notes above the cut line. Up to {} characters are kept.\n",
        MAX_NOTES_LEN
    ));
    text
}

/// Notes as written in the scratch file, without the cut section
fn parse_notes(text: &str) -> String {
    let above_cut = match text.lines().position(|line| line.trim_end() == CUT_LINE) {
        Some(index) => text.lines().take(index).collect::<Vec<_>>().join("\n"),
        None => text.to_string(),
    };
    above_cut.trim().to_string()
}

/// Ask a yes/no question; anything but yes is no, as is a missing terminal
pub fn confirm(question: &str) -> Result<bool> {
    if !io::stdin().is_terminal() {
        return Ok(false);
    }
    let answer = ask(&format!("{} [y/N] ", question))?;
    Ok(is_yes(&answer))
}

/// Ask for a new value, showing the current one; `None` keeps it
pub fn prompt_with_default(label: &str, current: &str) -> Result<Option<String>> {
    let prompt = if current.is_empty() {
        format!("{}: ", label)
    } else {
        format!("{} [{}]: ", label, current)
    };
    let answer = ask(&prompt)?;
    Ok((!answer.is_empty()).then_some(answer))
}

fn ask(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.to_lowercase().as_str(), "y" | "yes")
}
