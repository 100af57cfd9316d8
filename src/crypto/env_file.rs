//! Per-user `KEY=value` environment file.
//!
//! Backs the user scope of `EnvironmentSource`: values written here
//! survive the process and are visible to every later session of the
//! same user.  The format is the usual `.env` shape, one assignment per
//! line, `#` comments and an optional `export` prefix.

use std::fs;
use std::path::Path;

use zeroize::Zeroizing;

use crate::errors::Result;

/// Parse a single line into a (key, value) pair.
///
/// Returns `None` for blank lines, comments, and lines without `=`.
/// Handles: `export` prefix, double/single quotes, values with `=`.
pub fn parse_env_line(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim();

    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);

    // Base64 values carry `=` padding, so only the first `=` splits.
    let (key, value) = trimmed.split_once('=')?;
    let key = key.trim();
    let value = value.trim();

    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);

    if key.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Look up `key` in the file at `path`.
///
/// A missing file is treated as empty.
pub fn lookup(path: &Path, key: &str) -> Result<Option<Zeroizing<String>>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = Zeroizing::new(fs::read_to_string(path)?);

    Ok(content
        .lines()
        .filter_map(parse_env_line)
        .find(|(k, _)| *k == key)
        .map(|(_, v)| Zeroizing::new(v.to_string())))
}

/// Set (`Some`) or remove (`None`) `key` in the file at `path`.
///
/// Other lines, comments included, are kept in their original order.
/// The file is replaced via temp file + rename and restricted to the
/// owner on Unix.
pub fn upsert(path: &Path, key: &str, value: Option<&str>) -> Result<()> {
    let existing = if path.exists() {
        Zeroizing::new(fs::read_to_string(path)?)
    } else {
        Zeroizing::new(String::new())
    };

    let mut out = Zeroizing::new(String::with_capacity(existing.len() + 64));
    let mut replaced = false;

    for line in existing.lines() {
        match parse_env_line(line) {
            Some((k, _)) if k == key => {
                if let Some(v) = value {
                    if !replaced {
                        out.push_str(&format!("{key}={v}\n"));
                    }
                }
                replaced = true;
            }
            _ => {
                out.push_str(line);
                out.push('\n');
            }
        }
    }

    if !replaced {
        if let Some(v) = value {
            out.push_str(&format!("{key}={v}\n"));
        }
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let parent = path.parent().unwrap_or(Path::new("."));
    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    fs::write(&tmp_path, out.as_bytes())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;
    }

    fs::rename(&tmp_path, path)?;

    Ok(())
}
