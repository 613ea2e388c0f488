//! Whitespace normalization for hand-edited pages.

use super::{Transform, TransformResult};

/// Collapses blank-line runs and trims trailing whitespace.
///
/// Output rules:
/// - trailing whitespace is stripped from every line
/// - any run of blank (whitespace-only) lines becomes a single blank line
/// - trailing blank lines are dropped and the text ends with exactly one `\n`
/// - `\r\n` line endings become `\n`
///
/// Empty input stays empty. Reports one substitution per changed file.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlankLineCollapse;

impl BlankLineCollapse {
    #[must_use]
    pub fn normalize(content: &str) -> String {
        if content.is_empty() {
            return String::new();
        }

        let mut out = String::with_capacity(content.len());
        let mut pending_blank = false;
        for line in content.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                pending_blank = true;
                continue;
            }
            if pending_blank {
                out.push('\n');
                pending_blank = false;
            }
            out.push_str(line);
            out.push('\n');
        }

        if out.is_empty() {
            out.push('\n');
        }
        out
    }
}

impl Transform for BlankLineCollapse {
    fn name(&self) -> &'static str {
        "collapse-blank-lines"
    }

    fn apply(&self, content: &str) -> TransformResult {
        TransformResult::from_content(content, Self::normalize(content), 1)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_three_blank_lines_become_one() {
        let input = "<p>first</p>\n\n\n\n<p>second</p>";
        let r = BlankLineCollapse.apply(input);
        assert!(r.changed);
        assert_eq!(r.content, "<p>first</p>\n\n<p>second</p>\n");
        assert!(r.content.ends_with("</p>\n"));
        assert!(!r.content.ends_with("\n\n"));
    }

    #[test]
    fn test_whitespace_only_lines_count_as_blank() {
        let input = "a   \n \t \n\t\nb\t\n";
        assert_eq!(BlankLineCollapse::normalize(input), "a\n\nb\n");
    }

    #[test]
    fn test_trailing_blank_lines_are_dropped() {
        assert_eq!(BlankLineCollapse::normalize("a\n\n\n   \n"), "a\n");
        assert_eq!(BlankLineCollapse::normalize("a"), "a\n");
    }

    #[test]
    fn test_crlf_is_normalized() {
        assert_eq!(BlankLineCollapse::normalize("a\r\n\r\n\r\nb\r\n"), "a\n\nb\n");
    }

    #[test]
    fn test_rerun_is_noop() {
        let inputs = [
            "<html>\n\n\n<body>  \n</body>\n\n",
            "\n\n\nleading",
            "   \n\n",
            "clean\n",
        ];
        for input in inputs {
            let once = BlankLineCollapse.apply(input);
            let twice = BlankLineCollapse.apply(&once.content);
            assert!(!twice.changed, "second pass changed {input:?}");
            assert_eq!(twice.content, once.content);
        }
    }

    #[test]
    fn test_clean_and_empty_input_unchanged() {
        let r = BlankLineCollapse.apply("<p>ok</p>\n\n<p>ok</p>\n");
        assert!(!r.changed);
        assert_eq!(r.substitutions, 0);

        let r = BlankLineCollapse.apply("");
        assert!(!r.changed);
        assert_eq!(r.content, "");
    }
}
