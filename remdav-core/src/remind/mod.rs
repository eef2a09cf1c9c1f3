//! The Remind-file-backed event store.
//!
//! Expansion of the Remind syntax is delegated to the `remind` program
//! itself (`remind -l -s<months>`), the same way the calendar providers
//! are external binaries elsewhere in this workspace: we only parse its
//! simple-calendar output. Mutation is line-based: every appended event is
//! written as a `# UID:` comment followed by one `REM` line, and removal
//! rewrites the file without the matching pair.

mod output;

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::constants::UID_COMMENT_PREFIX;
use crate::error::{RemDavError, RemDavResult};
use crate::event::RemindEvent;
use crate::uid::line_digest;
use crate::window::SyncWindow;

/// Where the Remind text comes from.
#[derive(Debug, Clone)]
pub enum RemindSource {
    File(PathBuf),
    /// Content already read from standard input. Snapshots work, mutation
    /// is refused.
    Stdin(String),
}

/// One Remind file (or a stdin capture of one).
#[derive(Debug, Clone)]
pub struct RemindStore {
    source: RemindSource,
}

impl RemindStore {
    pub fn new(source: RemindSource) -> Self {
        RemindStore { source }
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        RemindStore::new(RemindSource::File(path.into()))
    }

    /// Create the backing file (and its directory) if it does not exist.
    /// A stdin source is left alone.
    pub fn ensure_exists(&self) -> RemDavResult<()> {
        if let RemindSource::File(path) = &self.source {
            if !path.exists() {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                std::fs::write(path, "")?;
            }
        }
        Ok(())
    }

    /// Expand the source over `window` into a UID-keyed snapshot.
    ///
    /// A missing file is an empty store. A `remind` run that fails on the
    /// input degrades to an empty snapshot as well; only a missing
    /// `remind` binary is an error.
    pub async fn snapshot(
        &self,
        window: &SyncWindow,
    ) -> RemDavResult<HashMap<String, RemindEvent>> {
        let text = match &self.source {
            RemindSource::File(path) => {
                if !path.exists() {
                    return Ok(HashMap::new());
                }
                std::fs::read_to_string(path)?
            }
            RemindSource::Stdin(content) => content.clone(),
        };

        let Some(stdout) = self.run_remind(&text, window).await? else {
            return Ok(HashMap::new());
        };

        let source_lines: Vec<&str> = text.lines().collect();
        let events = output::parse(&stdout, &source_lines, &local_host());
        debug!(count = events.len(), "expanded remind snapshot");
        Ok(events)
    }

    /// Append an event as a UID comment plus a generated `REM` line.
    pub fn append(&self, event: &RemindEvent) -> RemDavResult<()> {
        let RemindSource::File(path) = &self.source else {
            return Err(RemDavError::StdinImmutable);
        };

        let mut entry = String::new();
        // Keep the new entry on its own lines even if the file does not
        // end with a newline.
        let needs_newline = std::fs::read(path)
            .map(|bytes| !bytes.is_empty() && bytes.last() != Some(&b'\n'))
            .unwrap_or(false);
        if needs_newline {
            entry.push('\n');
        }
        entry.push_str(&format!("{} {}\n", UID_COMMENT_PREFIX, event.uid));
        entry.push_str(&to_rem_line(event));
        entry.push('\n');

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        file.write_all(entry.as_bytes())?;
        Ok(())
    }

    /// Remove the event with this UID, rewriting the file.
    ///
    /// Lines tagged with a `# UID:` comment match on the recorded UID;
    /// untagged lines match on the digest half alone, so a file moved to
    /// another host still matches.
    pub fn remove(&self, uid: &str) -> RemDavResult<()> {
        let RemindSource::File(path) = &self.source else {
            return Err(RemDavError::StdinImmutable);
        };

        let content = std::fs::read_to_string(path)?;
        let target_digest = uid.split('@').next().unwrap_or(uid);
        let lines: Vec<&str> = content.lines().collect();
        let mut keep = vec![true; lines.len()];

        for (i, line) in lines.iter().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let tag = if i > 0 { uid_comment(lines[i - 1]) } else { None };
            let matched = match tag {
                Some(tagged) => tagged == uid,
                None => line_digest(line) == target_digest,
            };
            if matched {
                keep[i] = false;
                if tag.is_some() {
                    keep[i - 1] = false;
                }
            }
        }

        if keep.iter().all(|k| *k) {
            debug!(uid, "no matching line to remove");
            return Ok(());
        }

        let mut rewritten = lines
            .iter()
            .zip(&keep)
            .filter(|(_, keep)| **keep)
            .map(|(line, _)| *line)
            .collect::<Vec<_>>()
            .join("\n");
        if !rewritten.is_empty() {
            rewritten.push('\n');
        }
        std::fs::write(path, rewritten)?;
        Ok(())
    }

    async fn run_remind(&self, text: &str, window: &SyncWindow) -> RemDavResult<Option<String>> {
        let remind =
            which::which("remind").map_err(|_| RemDavError::RemindNotInstalled)?;

        let mut cmd = Command::new(remind);
        cmd.arg("-l")
            .arg(format!("-s{}", window.months))
            .arg("-b1")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        match &self.source {
            RemindSource::File(path) => {
                cmd.arg(path).stdin(Stdio::null());
            }
            RemindSource::Stdin(_) => {
                cmd.arg("-").stdin(Stdio::piped());
            }
        }
        cmd.arg(window.start.format("%Y-%m-%d").to_string());

        let mut child = cmd
            .spawn()
            .map_err(|e| RemDavError::RemindInvocation(e.to_string()))?;

        if matches!(self.source, RemindSource::Stdin(_)) {
            if let Some(mut stdin) = child.stdin.take() {
                stdin
                    .write_all(text.as_bytes())
                    .await
                    .map_err(|e| RemDavError::RemindInvocation(e.to_string()))?;
            }
        }

        let out = child
            .wait_with_output()
            .await
            .map_err(|e| RemDavError::RemindInvocation(e.to_string()))?;

        if !out.status.success() {
            warn!(
                status = %out.status,
                stderr = %String::from_utf8_lossy(&out.stderr).trim(),
                "remind failed, treating window as empty"
            );
            return Ok(None);
        }

        Ok(Some(String::from_utf8_lossy(&out.stdout).into_owned()))
    }
}

/// The UID recorded by a `# UID:` comment line, if this is one.
pub(crate) fn uid_comment(line: &str) -> Option<&str> {
    line.trim()
        .strip_prefix(UID_COMMENT_PREFIX)
        .map(str::trim)
        .filter(|uid| !uid.is_empty())
}

fn local_host() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

/// Render an event as one `REM` line.
fn to_rem_line(event: &RemindEvent) -> String {
    let mut line = format!("REM {}", event.date.format("%Y-%m-%d"));
    if let Some(time) = event.time {
        line.push_str(&format!(" AT {}", time.format("%H:%M")));
        if let Some(minutes) = event.duration_minutes.filter(|m| *m > 0) {
            line.push_str(&format!(" DURATION {}:{:02}", minutes / 60, minutes % 60));
        }
    }
    line.push_str(" MSG ");
    line.push_str(&sanitize_msg(&event.summary));
    line
}

/// Make an arbitrary summary safe inside a MSG body: newlines would split
/// the entry, `%` starts a substitution, `[` starts an expression
/// (`["["]` evaluates back to a literal bracket).
fn sanitize_msg(summary: &str) -> String {
    summary
        .replace(['\r', '\n'], " ")
        .replace('%', "%%")
        .replace('[', "[\"[\"]")
}
