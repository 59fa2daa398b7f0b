//! Argument checks that run before the model backend is touched.

use crate::error::ConsultError;
use std::path::{Path, PathBuf};

pub const MANIFEST_EXTENSION: &str = "swift";
pub const REPORT_EXTENSION: &str = ".txt";

/// Ensure a package manifest was given, exists, and is a `.swift` file.
pub fn validate_package(package: Option<&Path>) -> Result<PathBuf, ConsultError> {
    let package = package.ok_or(ConsultError::MissingPackage)?;

    if !package.exists() {
        return Err(ConsultError::PackageNotFound(package.to_path_buf()));
    }

    let is_swift = package
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == MANIFEST_EXTENSION);
    if !is_swift {
        return Err(ConsultError::WrongExtension(package.to_path_buf()));
    }

    Ok(package.to_path_buf())
}

/// Append `.txt` to a report path that doesn't already end with it.
///
/// This is a plain suffix check, so `review.md` becomes `review.md.txt`.
pub fn normalize_output_path(output: &Path) -> PathBuf {
    if output.to_string_lossy().ends_with(REPORT_EXTENSION) {
        return output.to_path_buf();
    }

    let mut raw = output.as_os_str().to_os_string();
    raw.push(REPORT_EXTENSION);
    PathBuf::from(raw)
}
