//! Line endings and crash-safe file replacement

use std::io::Write;
use std::path::Path;

use crate::types::{GitDocError, Result};

pub const CRLF: &str = "\r\n";
pub const LF: &str = "\n";

/// CRLF when any CRLF is present, otherwise LF
pub fn detect_line_ending(content: &str) -> &'static str {
    if content.contains(CRLF) { CRLF } else { LF }
}

/// Rewrite every CRLF/CR/LF in `content` as `line_ending`.
pub fn normalize_line_endings(content: &str, line_ending: &str) -> String {
    let normalized = content.replace(CRLF, LF).replace('\r', LF);
    if line_ending == CRLF {
        normalized.replace(LF, CRLF)
    } else {
        normalized
    }
}

/// Replace `path` atomically: write a sibling temp file, fsync, then rename.
///
/// The temp file is removed on any failure, leaving `path` untouched.
pub fn atomic_write_file(path: &Path, content: &[u8], mode: u32) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".git-doc-tmp-")
        .tempfile_in(dir)
        .map_err(|e| io_context("create temp file", e))?;

    tmp.write_all(content)
        .map_err(|e| io_context("write temp file", e))?;
    set_mode(tmp.as_file(), mode)?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| io_context("sync temp file", e))?;
    tmp.persist(path)
        .map_err(|e| io_context("atomic rename", e.error))?;
    Ok(())
}

#[cfg(unix)]
fn set_mode(file: &std::fs::File, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(mode))
        .map_err(|e| io_context("chmod temp file", e))
}

#[cfg(not(unix))]
fn set_mode(_file: &std::fs::File, _mode: u32) -> Result<()> {
    Ok(())
}

fn io_context(action: &str, err: std::io::Error) -> GitDocError {
    GitDocError::Io(std::io::Error::new(err.kind(), format!("{}: {}", action, err)))
}
