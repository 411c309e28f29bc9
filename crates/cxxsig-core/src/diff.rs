//! Unified diff generation utilities.
//!
//! Provides functions to generate unified diff format from edit information.

use std::collections::BTreeMap;

use crate::patch::OutputEdit;

/// Generate a unified diff from edit information.
///
/// Groups edits by file (files in path order) and shows each edit as a
/// change hunk at its line. Multi-line replacement text is split into
/// one `+` line per line.
pub fn generate_unified_diff(edits: &[OutputEdit]) -> String {
    let mut by_file: BTreeMap<&str, Vec<&OutputEdit>> = BTreeMap::new();
    for edit in edits {
        by_file.entry(&edit.file).or_default().push(edit);
    }

    let mut diff = String::new();
    for (file, file_edits) in by_file {
        diff.push_str(&format!("--- a/{}\n", file));
        diff.push_str(&format!("+++ b/{}\n", file));

        for edit in file_edits {
            let old_lines: Vec<&str> = edit.old_text.split('\n').collect();
            let new_lines: Vec<&str> = edit.new_text.split('\n').collect();
            diff.push_str(&format!(
                "@@ -{},{} +{},{} @@\n",
                edit.line,
                old_lines.len(),
                edit.line,
                new_lines.len()
            ));
            for line in old_lines {
                diff.push_str(&format!("-{}\n", line));
            }
            for line in new_lines {
                diff.push_str(&format!("+{}\n", line));
            }
        }
    }

    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::Span;

    fn edit(file: &str, start: usize, old: &str, new: &str, line: u32) -> OutputEdit {
        OutputEdit {
            file: file.to_string(),
            span: Span::new(start, start + old.len()),
            old_text: old.to_string(),
            new_text: new.to_string(),
            line,
            col: 1,
        }
    }

    #[test]
    fn generate_diff_single_file_single_edit() {
        let diff = generate_unified_diff(&[edit("main.cpp", 3, "(a, b)", "(b, a)", 1)]);

        assert!(diff.contains("--- a/main.cpp"));
        assert!(diff.contains("+++ b/main.cpp"));
        assert!(diff.contains("-(a, b)"));
        assert!(diff.contains("+(b, a)"));
    }

    #[test]
    fn generate_diff_files_sorted() {
        let diff = generate_unified_diff(&[
            edit("z.cpp", 0, "a", "b", 1),
            edit("a.cpp", 0, "c", "d", 1),
        ]);
        let a = diff.find("--- a/a.cpp").unwrap();
        let z = diff.find("--- a/z.cpp").unwrap();
        assert!(a < z);
    }

    #[test]
    fn generate_diff_multiline_replacement() {
        let diff = generate_unified_diff(&[edit("m.cpp", 0, "(a)", "(a,\n b)", 4)]);
        assert!(diff.contains("@@ -4,1 +4,2 @@"));
        assert!(diff.contains("+(a,\n+ b)\n"));
    }

    #[test]
    fn generate_diff_empty_edits() {
        assert!(generate_unified_diff(&[]).is_empty());
    }
}
