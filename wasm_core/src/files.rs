// File name, size and type helpers used by the upload widgets.

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

const MIME_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
    ("avif", "image/avif"),
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("txt", "text/plain"),
    ("csv", "text/csv"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("html", "text/html"),
    ("css", "text/css"),
    ("js", "text/javascript"),
    ("md", "text/markdown"),
    ("yaml", "text/yaml"),
    ("yml", "text/yaml"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("aac", "audio/aac"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("avi", "video/x-msvideo"),
];

/// Human readable size with base 1024 and at most two decimals.
///
/// # Example
/// ```
/// use wcag_core::files::format_file_size;
/// assert_eq!(format_file_size(0), "0 Bytes");
/// assert_eq!(format_file_size(1536), "1.5 KB");
/// assert_eq!(format_file_size(1048576), "1 MB");
/// ```
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".into();
    }
    let mut value = bytes as f64;
    let mut exponent = 0;
    while value >= 1024.0 && exponent < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        exponent += 1;
    }
    let fixed = format!("{value:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", SIZE_UNITS[exponent])
}

/// Lowercased text after the last dot. Names without a dot, or whose only
/// dot is the first character, have no extension.
pub fn file_extension(name: &str) -> String {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name[idx + 1..].to_ascii_lowercase(),
        _ => String::new(),
    }
}

/// Mime type for a file name or bare extension; unknown types are
/// `application/octet-stream`.
pub fn mime_type(name: &str) -> &'static str {
    let ext = if name.contains('.') {
        file_extension(name)
    } else {
        name.to_ascii_lowercase()
    };
    MIME_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or("application/octet-stream")
}

pub fn validate_file_type(name: &str, accepted_extensions: &[String]) -> bool {
    let ext = file_extension(name);
    accepted_extensions
        .iter()
        .any(|accepted| accepted.trim_start_matches('.').eq_ignore_ascii_case(&ext))
}

pub fn validate_file_size(size_bytes: u64, max_size_mb: f64) -> bool {
    size_bytes as f64 <= max_size_mb * 1024.0 * 1024.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_trim_trailing_zeros() {
        assert_eq!(format_file_size(1), "1 Bytes");
        assert_eq!(format_file_size(1023), "1023 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1234567), "1.18 MB");
        assert_eq!(format_file_size(5 * 1024 * 1024 * 1024), "5 GB");
        assert_eq!(format_file_size(3 * 1024u64.pow(4)), "3072 GB");
    }

    #[test]
    fn extensions_and_mime_types() {
        assert_eq!(file_extension("Report.Final.PDF"), "pdf");
        assert_eq!(file_extension("Makefile"), "");
        assert_eq!(file_extension(".bashrc"), "");
        assert_eq!(mime_type("photo.JPG"), "image/jpeg");
        assert_eq!(mime_type("webp"), "image/webp");
        assert_eq!(mime_type("archive.tar"), "application/octet-stream");
    }

    #[test]
    fn validations() {
        let accepted = vec!["png".to_string(), ".JPG".to_string()];
        assert!(validate_file_type("a.jpg", &accepted));
        assert!(!validate_file_type("a.gif", &accepted));
        assert!(validate_file_size(5 * 1024 * 1024, 5.0));
        assert!(!validate_file_size(5 * 1024 * 1024 + 1, 5.0));
    }
}
