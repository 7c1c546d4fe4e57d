//! Formatting helpers for labels.

/// Format an integer with comma separators for readability.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_number(12345678), "12,345,678");
/// assert_eq!(format_number(-4200), "-4,200");
/// assert_eq!(format_number(42), "42");
/// ```
#[must_use]
pub fn format_number(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    if n < 0 {
        result.push('-');
    }
    result.chars().rev().collect()
}

/// File name of `path` for compact labels, falling back to the full path.
#[must_use]
pub fn short_name(path: &std::path::Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(12_345_678), "12,345,678");
        assert_eq!(format_number(-4200), "-4,200");
    }

    #[test]
    fn test_short_name() {
        assert_eq!(short_name(Path::new("/data/scan_master.h5")), "scan_master.h5");
        assert_eq!(short_name(Path::new("/")), "/");
    }
}
