//! Keyword list parsing.
//!
//! Turns the text of an uploaded keyword file into ordered [`SeedRecord`]s.
//! Each non-blank row is `main keyword,secondary one|secondary two|...`.

use std::path::Path;

use serde::Serialize;

/// One parsed keyword row, the seed of a future job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedRecord {
    pub main_keyword: String,
    pub secondary_keywords: Vec<String>,
}

/// Parses newline-separated keyword rows, preserving row and token order.
pub fn parse_seeds(text: &str) -> Vec<SeedRecord> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    text.lines()
        .filter(|row| !row.trim().is_empty())
        .map(parse_row)
        .collect()
}

fn parse_row(row: &str) -> SeedRecord {
    let (main, secondary) = row.split_once(',').unwrap_or((row, ""));
    let secondary_keywords = if secondary.trim().is_empty() {
        Vec::new()
    } else {
        secondary
            .split('|')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(String::from)
            .collect()
    };

    SeedRecord {
        main_keyword: main.trim().to_string(),
        secondary_keywords,
    }
}

/// Name, size and type of an uploaded keyword file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDetails {
    pub name: String,
    pub size: String,
    pub mime_type: String,
}

impl FileDetails {
    pub fn describe(path: &Path, byte_len: u64) -> Self {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("—")
            .to_string();
        let mime_type = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => "text/csv",
            Some(ext) if ext.eq_ignore_ascii_case("txt") => "text/plain",
            _ => "—",
        }
        .to_string();

        Self {
            name,
            size: format_file_size(byte_len),
            mime_type,
        }
    }
}

/// Human-readable size with at most two decimals, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_secondary_keywords_in_order() {
        let seeds = parse_seeds("seo tools,best seo|top seo\nkeyword research,");
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].main_keyword, "seo tools");
        assert_eq!(seeds[0].secondary_keywords, vec!["best seo", "top seo"]);
        assert_eq!(seeds[1].main_keyword, "keyword research");
        assert!(seeds[1].secondary_keywords.is_empty());
    }

    #[test]
    fn strips_bom_and_blank_rows() {
        let seeds = parse_seeds("\u{feff}alpha,a|b\r\n\r\n   \nbeta\r\n");
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].main_keyword, "alpha");
        assert_eq!(seeds[1].main_keyword, "beta");
        assert!(seeds[1].secondary_keywords.is_empty());
    }

    #[test]
    fn trims_every_token() {
        let seeds = parse_seeds("  rust crates ,  serde |  tokio  ");
        assert_eq!(seeds[0].main_keyword, "rust crates");
        assert_eq!(seeds[0].secondary_keywords, vec!["serde", "tokio"]);
    }

    #[test]
    fn only_first_comma_splits() {
        let seeds = parse_seeds("a,b,c|d");
        assert_eq!(seeds[0].main_keyword, "a");
        assert_eq!(seeds[0].secondary_keywords, vec!["b,c", "d"]);
    }

    #[test]
    fn file_size_formatting() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
    }

    #[test]
    fn file_details_from_path() {
        let details = FileDetails::describe(Path::new("/tmp/keywords.CSV"), 2048);
        assert_eq!(details.name, "keywords.CSV");
        assert_eq!(details.size, "2 KB");
        assert_eq!(details.mime_type, "text/csv");
    }
}
