//! Git-style unified diff of one edit result.
//!
//! An empty string means "no effective change": same path, same mode and
//! identical content.

use std::fmt::Write as _;
use std::path::Path;

use rule_engine::EditResult;
use similar::TextDiff;
use source_ingest::model::{Payload, SourceUnit};

const CONTEXT_LINES: usize = 3;
const DEV_NULL: &str = "/dev/null";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Content<'a> {
    Text(&'a str),
    Bytes(&'a [u8]),
    /// Opaque or remote: not known before it is written.
    Unknown,
}

fn content(unit: &SourceUnit) -> Content<'_> {
    match unit.payload() {
        Payload::Text { text } => Content::Text(text),
        Payload::Bytes { bytes } => Content::Bytes(bytes),
        Payload::Remote { .. } | Payload::Opaque { .. } => Content::Unknown,
    }
}

fn mode(unit: &SourceUnit) -> &'static str {
    match unit.attributes() {
        Some(a) if a.executable => "100755",
        _ => "100644",
    }
}

fn unix(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

pub fn render(result: &EditResult) -> String {
    let before = result.before.as_ref();
    let after = result.after.as_ref();
    let (old_path, new_path) = match (before, after) {
        (None, None) => return String::new(),
        (Some(b), None) => (unix(b.path()), unix(b.path())),
        (None, Some(a)) => (unix(a.path()), unix(a.path())),
        (Some(b), Some(a)) => (unix(b.path()), unix(a.path())),
    };

    let mut header = format!("diff --git a/{old_path} b/{new_path}\n");
    match (before, after) {
        (None, Some(a)) => {
            let _ = writeln!(header, "new file mode {}", mode(a));
        }
        (Some(b), None) => {
            let _ = writeln!(header, "deleted file mode {}", mode(b));
        }
        (Some(b), Some(a)) => {
            if mode(b) != mode(a) {
                let _ = writeln!(header, "old mode {}\nnew mode {}", mode(b), mode(a));
            }
            if old_path != new_path {
                let _ = writeln!(header, "rename from {old_path}\nrename to {new_path}");
            }
        }
        (None, None) => {}
    }
    let header_only = header.lines().count() > 1;

    let old_content = before.map_or(Content::Text(""), content);
    let new_content = after.map_or(Content::Text(""), content);
    let old_label = if before.is_some() {
        format!("a/{old_path}")
    } else {
        DEV_NULL.to_string()
    };
    let new_label = if after.is_some() {
        format!("b/{new_path}")
    } else {
        DEV_NULL.to_string()
    };

    let body = match (old_content, new_content) {
        (Content::Text(old), Content::Text(new)) => {
            text_hunks(old, new, &old_label, &new_label, &result.rules)
        }
        (Content::Unknown, Content::Unknown) if before.is_some() && after.is_some() => {
            String::new()
        }
        (old, new) if old == new => String::new(),
        _ => format!("Binary files {old_label} and {new_label} differ\n"),
    };

    if body.is_empty() && !header_only {
        return String::new();
    }
    header + &body
}

fn text_hunks(
    old: &str,
    new: &str,
    old_label: &str,
    new_label: &str,
    rules: &[String],
) -> String {
    if old == new {
        return String::new();
    }
    let diff = TextDiff::from_lines(old, new);
    let mut out = format!("--- {old_label}\n+++ {new_label}\n");
    let mut unified = diff.unified_diff();
    unified.context_radius(CONTEXT_LINES);
    for (i, hunk) in unified.iter_hunks().enumerate() {
        let rendered = hunk.to_string();
        match rendered.split_once('\n') {
            // rule ids go on the first hunk header only
            Some((first, rest)) if i == 0 && !rules.is_empty() => {
                let _ = write!(out, "{first} {}\n{rest}", rules.join(", "));
            }
            _ => out.push_str(&rendered),
        }
    }
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}
