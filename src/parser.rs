use chrono::NaiveDateTime;
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

static PATH_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[,;]\s*").expect("separator pattern"));

const DEADLINE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Trims the ends; inner spacing is kept as typed.
pub fn parse_title(input: &str) -> String {
    input.trim().to_string()
}

pub fn parse_deadline(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    DEADLINE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
}

/// The datetime-local representation the form shows when editing.
pub fn format_deadline_input(deadline: &NaiveDateTime) -> String {
    deadline.format("%Y-%m-%dT%H:%M").to_string()
}

pub fn parse_attachment_paths(input: &str) -> Vec<PathBuf> {
    PATH_SEPARATOR_RE
        .split(input.trim())
        .filter(|part| !part.is_empty())
        .map(expand_home)
        .collect()
}

/// Expands a leading `~` to the home directory.
fn expand_home(part: &str) -> PathBuf {
    let rest = match part.strip_prefix('~') {
        Some("") => "",
        Some(rest) if rest.starts_with('/') => &rest[1..],
        _ => return PathBuf::from(part),
    };
    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => PathBuf::from(part),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_title_keeps_inner_spacing() {
        assert_eq!(parse_title("  Write   the   lab report "), "Write   the   lab report");
    }

    #[test]
    fn test_parse_title_blank() {
        assert_eq!(parse_title(" \t "), "");
    }

    #[test]
    fn test_parse_deadline_datetime_local() {
        let expected = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();
        assert_eq!(parse_deadline("2026-10-19T23:59"), Some(expected));
        assert_eq!(parse_deadline(" 2026-10-19 23:59 "), Some(expected));
        assert_eq!(parse_deadline("2026-10-19T23:59:00"), Some(expected));
    }

    #[test]
    fn test_parse_deadline_rejects_garbage() {
        assert_eq!(parse_deadline(""), None);
        assert_eq!(parse_deadline("tomorrow"), None);
        assert_eq!(parse_deadline("2026-13-01T10:00"), None);
    }

    #[test]
    fn test_deadline_input_round_trip() {
        let deadline = NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(7, 45, 0)
            .unwrap();
        let text = format_deadline_input(&deadline);
        assert_eq!(text, "2026-01-05T07:45");
        assert_eq!(parse_deadline(&text), Some(deadline));
    }

    #[test]
    fn test_parse_attachment_paths_with_mixed_separators() {
        let paths = parse_attachment_paths(" ~/a.pdf , /tmp/b c.png;notes.txt ,, ");
        let home = dirs::home_dir().unwrap();
        assert_eq!(
            paths,
            vec![
                home.join("a.pdf"),
                PathBuf::from("/tmp/b c.png"),
                PathBuf::from("notes.txt"),
            ]
        );
    }

    #[test]
    fn test_parse_attachment_paths_expands_home_only_at_start() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(
            parse_attachment_paths("~/docs/essay.docx; ~; ~user/x.txt; a/~/b.txt"),
            vec![
                home.join("docs/essay.docx"),
                home.clone(),
                PathBuf::from("~user/x.txt"),
                PathBuf::from("a/~/b.txt"),
            ]
        );
    }

    #[test]
    fn test_parse_attachment_paths_empty() {
        assert!(parse_attachment_paths("   ").is_empty());
    }
}
