//! Interactive chat line parsing.
//!
//! Grammar (one command per line):
//! - `disconnect` (any case)
//! - `img:dest:path`, `audio:dest:path`, `video:dest:path`
//! - `file:dest:path` (media tag picked from the file extension)
//! - `dest:message`
//! - `message` (addressed to `SERVER`)

use std::path::PathBuf;

use chatrelay_core::media::MediaTag;

/// Recipient used when a line names none.
pub const DEFAULT_DEST: &str = "SERVER";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Disconnect,
    Text { dest: String, body: String },
    Media { tag: MediaTag, dest: String, path: PathBuf },
    File { dest: String, path: PathBuf },
    /// Media command without both a destination and a path.
    Usage(&'static str),
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<Command> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }

    let lower = line.to_ascii_lowercase();
    if lower == "disconnect" {
        return Some(Command::Disconnect);
    }

    if lower.starts_with("file:") {
        return Some(match split_dest_path(&line["file:".len()..]) {
            Some((dest, path)) => Command::File { dest, path },
            None => Command::Usage("file:dest:path"),
        });
    }

    for (prefix, tag, usage) in [
        ("img:", MediaTag::Image, "img:dest:path"),
        ("audio:", MediaTag::Audio, "audio:dest:path"),
        ("video:", MediaTag::Video, "video:dest:path"),
    ] {
        if lower.starts_with(prefix) {
            return Some(match split_dest_path(&line[prefix.len()..]) {
                Some((dest, path)) => Command::Media { tag, dest, path },
                None => Command::Usage(usage),
            });
        }
    }

    Some(match line.split_once(':') {
        Some((dest, body)) => Command::Text {
            dest: dest.trim().to_string(),
            body: body.trim().to_string(),
        },
        None => Command::Text {
            dest: DEFAULT_DEST.to_string(),
            body: line.to_string(),
        },
    })
}

fn split_dest_path(rest: &str) -> Option<(String, PathBuf)> {
    let (dest, path) = rest.split_once(':')?;
    Some((dest.trim().to_string(), PathBuf::from(path.trim())))
}
