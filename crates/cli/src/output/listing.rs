//! Listing row layout
//!
//! Rows are tagged `D` (directory), `F` (file) or `B` (bucket). File sizes
//! are right-aligned in a fixed column, and directory names are indented to
//! line up with file names whenever the listing contains files.

use s3c_core::ObjectInfo;

/// Width of the size column, fits `"1000.00 GiB"`
const SIZE_WIDTH: usize = 11;

/// Human readable size, right-aligned with multi-letter units
pub fn size_column(size: u64) -> String {
    let mut text = humansize::format_size(size, humansize::BINARY);
    if text.ends_with(" B") {
        text.push_str("  ");
    }
    format!("{text:>SIZE_WIDTH$}")
}

pub fn file_row(size: u64, name: &str) -> String {
    format!("  F  {}  {name}", size_column(size))
}

pub fn dir_row(name: &str, aligned: bool) -> String {
    let padding = if aligned { " ".repeat(SIZE_WIDTH + 2) } else { String::new() };
    format!("  D  {padding}{name}")
}

pub fn bucket_row(name: &str) -> String {
    format!("  B  {name}")
}

/// `"Found 1 <one>:"` or `"Found <n> <many>:"`
pub fn found_header(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("Found 1 {one}:")
    } else {
        format!("Found {count} {many}:")
    }
}

/// Rows for listed objects, names relative to `prefix`
///
/// `decorate` is applied to every displayed name.
pub fn object_rows(
    entries: &[ObjectInfo],
    prefix: &str,
    decorate: &dyn Fn(&str) -> String,
) -> Vec<String> {
    let has_files = entries.iter().any(|entry| !entry.is_dir());
    entries
        .iter()
        .map(|entry| {
            let relative = entry.relative_to(prefix);
            if entry.is_dir() {
                let name = relative.strip_suffix('/').unwrap_or(relative);
                dir_row(&decorate(name), has_files)
            } else {
                file_row(entry.size, &decorate(relative))
            }
        })
        .collect()
}

/// Wrap every ASCII case-insensitive occurrence of `needle` in `name`
pub fn highlight_matches(name: &str, needle: &str, mark: &dyn Fn(&str) -> String) -> String {
    if needle.is_empty() {
        return name.to_string();
    }
    let lower_name = name.to_ascii_lowercase();
    let lower_needle = needle.to_ascii_lowercase();

    let mut out = String::with_capacity(name.len());
    let mut pos = 0;
    while let Some(found) = lower_name[pos..].find(&lower_needle) {
        let start = pos + found;
        let end = start + needle.len();
        out.push_str(&name[pos..start]);
        out.push_str(&mark(&name[start..end]));
        pos = end;
    }
    out.push_str(&name[pos..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(name: &str) -> String {
        name.to_string()
    }

    #[test]
    fn test_size_column_alignment() {
        assert_eq!(size_column(7).len(), SIZE_WIDTH);
        assert!(size_column(7).ends_with("7 B  "));
    }

    #[test]
    fn test_mixed_listing() {
        let entries = vec![
            ObjectInfo::dir("docs/archive/"),
            ObjectInfo::file("docs/notes.txt", 42),
            ObjectInfo::file("docs/todo", 0),
        ];
        let mut lines = vec![found_header(entries.len(), "object", "objects")];
        lines.extend(object_rows(&entries, "docs/", &plain));
        insta::assert_snapshot!(lines.join("\n"), @r"
        Found 3 objects:
          D               archive
          F       42 B    notes.txt
          F        0 B    todo
        ");
    }

    #[test]
    fn test_directories_only_are_not_padded() {
        let entries = vec![ObjectInfo::dir("a/"), ObjectInfo::dir("b/")];
        let lines = object_rows(&entries, "", &plain);
        assert_eq!(lines, vec!["  D  a", "  D  b"]);
    }

    #[test]
    fn test_bucket_rows() {
        let mut lines = vec![found_header(1, "bucket", "buckets")];
        lines.push(bucket_row("data"));
        insta::assert_snapshot!(lines.join("\n"), @r"
        Found 1 bucket:
          B  data
        ");
    }

    #[test]
    fn test_highlight_is_case_insensitive() {
        let marked = highlight_matches("Report-report.CSV", "REPORT", &|m| format!("[{m}]"));
        assert_eq!(marked, "[Report]-[report].CSV");
        assert_eq!(highlight_matches("abc", "", &|m| format!("[{m}]")), "abc");
    }
}
