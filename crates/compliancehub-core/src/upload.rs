//! Evidence file pre-flight checks.
//!
//! The server rejects oversized files and unknown extensions after the whole
//! body has been transferred. Checking locally first avoids uploading 100 MB
//! only to get a 400 back.

use crate::error::CoreError;

/// Upload size limit in megabytes.
pub const MAX_UPLOAD_MB: u64 = 100;

/// Upload size limit in bytes.
pub const MAX_UPLOAD_BYTES: u64 = MAX_UPLOAD_MB * 1024 * 1024;

/// Extensions the server accepts, lowercase, without the dot.
pub const ALLOWED_EXTENSIONS: [&str; 24] = [
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "csv", // documents
    "jpg", "jpeg", "png", "gif", "bmp", "svg", // images
    "zip", "7z", "tar", "gz", // archives
    "json", "xml", "yaml", "log", "md", // structured text
];

/// Lowercased extension of `file_name`, or an empty string if it has none.
///
/// Only the last suffix counts (`report.tar.gz` is `gz`), and a leading dot
/// does not start an extension (`.env` has none).
pub fn extension(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let stem_len = base.trim_start_matches('.').len();
    let base = &base[base.len() - stem_len..];
    match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        _ => String::new(),
    }
}

/// Check `file_name` and `size` against the upload rules.
pub fn validate(file_name: &str, size: u64) -> Result<(), CoreError> {
    if size > MAX_UPLOAD_BYTES {
        return Err(CoreError::FileTooLarge {
            size,
            limit_mb: MAX_UPLOAD_MB,
        });
    }

    let ext = extension(file_name);
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(CoreError::FileTypeNotAllowed { extension: ext });
    }

    Ok(())
}

/// MIME type sent with the multipart file part.
pub fn content_type(file_name: &str) -> &'static str {
    match extension(file_name).as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "txt" | "log" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "zip" => "application/zip",
        "7z" => "application/x-7z-compressed",
        "tar" => "application/x-tar",
        "gz" => "application/gzip",
        "json" => "application/json",
        "xml" => "application/xml",
        "yaml" => "application/yaml",
        _ => "application/octet-stream",
    }
}

/// Human-readable file size: `512 B`, `1.5 KB`, `12.0 MB`.
pub fn display_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut size = bytes as f64 / 1024.0;
    for unit in &UNITS[..UNITS.len() - 1] {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1} {}", size, UNITS[UNITS.len() - 1])
}

/// Version label for a new evidence revision.
///
/// `"M.m"` becomes `"M.(m+1)"`, or `"(M+1).0"` for a major revision. Anything
/// that is not two dot-separated integers restarts at `"1.1"`.
pub fn next_version(current: &str, major: bool) -> String {
    let parsed = current.split_once('.').and_then(|(maj, min)| {
        let maj = maj.trim().parse::<u64>().ok()?;
        let min = min.trim().parse::<u64>().ok()?;
        Some((maj, min))
    });

    match parsed {
        Some((maj, _)) if major => format!("{}.0", maj + 1),
        Some((maj, min)) => format!("{}.{}", maj, min + 1),
        None => "1.1".to_string(),
    }
}
