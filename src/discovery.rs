//! Folder discovery of candidate workbook files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};

use crate::error::{ExtractionError, ExtractionResult};
use crate::source::is_workbook_path;

/// List the regular files directly inside `folder` whose names match `pattern`.
///
/// - `pattern` is a glob over the file name (e.g. `"*.xlsx"`, `"FUNNEL*"`); it may not contain
///   path separators, so there is no recursion.
/// - With `pattern = None`, every file with a workbook extension (`xlsx`, `xlsm`, `xlsb`, `xls`,
///   `ods`) matches.
/// - Hidden files (leading `.`) only match patterns that start with a literal `.`.
///
/// Results are sorted by path.
///
/// Errors: [`ExtractionError::NotFound`] if `folder` does not exist,
/// [`ExtractionError::InvalidInput`] if it is not a directory or the pattern contains a
/// separator, [`ExtractionError::PermissionDenied`] if it cannot be listed.
pub fn scan_folder(folder: impl AsRef<Path>, pattern: Option<&str>) -> ExtractionResult<Vec<PathBuf>> {
    let folder = folder.as_ref();

    let meta = fs::metadata(folder).map_err(|e| io_error(folder, e))?;
    if !meta.is_dir() {
        return Err(ExtractionError::InvalidInput {
            message: format!("not a directory: {}", folder.display()),
        });
    }

    let matcher = match pattern {
        Some(p) if p.contains('/') || p.contains('\\') => {
            return Err(ExtractionError::InvalidInput {
                message: format!("pattern must match file names only, got '{p}'"),
            });
        }
        Some(p) => Some(Pattern::new(p)?),
        None => None,
    };
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };

    let mut found = Vec::new();
    for entry in fs::read_dir(folder).map_err(|e| io_error(folder, e))? {
        let entry = entry.map_err(|e| io_error(folder, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        let matched = match &matcher {
            Some(m) => m.matches_with(&name, options),
            None => !name.starts_with('.') && is_workbook_path(&path),
        };
        if matched {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

fn io_error(path: &Path, err: io::Error) -> ExtractionError {
    match err.kind() {
        io::ErrorKind::NotFound => ExtractionError::NotFound {
            path: path.to_path_buf(),
        },
        io::ErrorKind::PermissionDenied => ExtractionError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ExtractionError::Io(err),
    }
}
