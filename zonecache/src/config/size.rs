//! Human-readable size parsing (e.g., "16MB", "15KB").

use thiserror::Error;

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;

/// Error parsing a size string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid size '{input}' - expected format like '16MB', '15KB', or '2048'")]
pub struct SizeParseError {
    input: String,
}

/// Parses a size string into bytes.
///
/// Bare numbers are bytes; `K`/`KB`, `M`/`MB` and `G`/`GB` suffixes are
/// binary multiples. Case and surrounding whitespace are ignored.
///
/// ```
/// use zonecache::config::parse_size;
///
/// assert_eq!(parse_size("15KB").unwrap(), 15 * 1024);
/// assert_eq!(parse_size("16 mb").unwrap(), 16 * 1024 * 1024);
/// ```
pub fn parse_size(s: &str) -> Result<u64, SizeParseError> {
    let trimmed = s.trim();
    let upper = trimmed.to_ascii_uppercase();

    let (digits, multiplier) = [("GB", GB), ("G", GB), ("MB", MB), ("M", MB), ("KB", KB), ("K", KB)]
        .iter()
        .find_map(|(suffix, mult)| upper.strip_suffix(suffix).map(|rest| (rest.trim(), *mult)))
        .unwrap_or((upper.as_str(), 1));

    let error = || SizeParseError {
        input: s.to_string(),
    };
    let value: u64 = digits.parse().map_err(|_| error())?;
    value.checked_mul(multiplier).ok_or_else(error)
}

/// Formats a byte count using the largest exact unit.
pub fn format_size(bytes: u64) -> String {
    if bytes >= GB && bytes % GB == 0 {
        format!("{}GB", bytes / GB)
    } else if bytes >= MB && bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else if bytes >= KB && bytes % KB == 0 {
        format!("{}KB", bytes / KB)
    } else {
        bytes.to_string()
    }
}

/// Formats a byte count for display, rounding to one decimal.
pub fn format_size_approx(bytes: u64) -> String {
    let b = bytes as f64;
    if bytes >= GB {
        format!("{:.1} GB", b / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", b / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", b / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_number() {
        assert_eq!(parse_size("2048").unwrap(), 2048);
        assert_eq!(parse_size("0").unwrap(), 0);
    }

    #[test]
    fn test_parse_suffixes() {
        assert_eq!(parse_size("15KB").unwrap(), 15 * 1024);
        assert_eq!(parse_size("15k").unwrap(), 15 * 1024);
        assert_eq!(parse_size("16MB").unwrap(), 16 * 1024 * 1024);
        assert_eq!(parse_size(" 16 mb ").unwrap(), 16 * 1024 * 1024);
        assert_eq!(parse_size("2G").unwrap(), 2 * 1024 * 1024 * 1024);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_size("").is_err());
        assert!(parse_size("MB").is_err());
        assert!(parse_size("1.5MB").is_err());
        assert!(parse_size("-1").is_err());
        assert!(parse_size("99999999999999999999GB").is_err());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(15 * 1024), "15KB");
        assert_eq!(format_size(16 * 1024 * 1024), "16MB");
        assert_eq!(format_size(1500), "1500");
    }

    #[test]
    fn test_format_roundtrip() {
        for bytes in [1, 1024, 15 * 1024, 16 * 1024 * 1024, 3 * 1024 * 1024 * 1024] {
            assert_eq!(parse_size(&format_size(bytes)).unwrap(), bytes);
        }
    }

    #[test]
    fn test_format_size_approx() {
        assert_eq!(format_size_approx(300 * 1024), "300.0 KB");
        assert_eq!(format_size_approx(1536 * 1024), "1.5 MB");
        assert_eq!(format_size_approx(12), "12 B");
    }
}
