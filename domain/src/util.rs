//! Shared utility functions.

/// Truncate a string to at most `max_bytes` without splitting a UTF-8
/// character boundary.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Clip captured tool output for diagnostics, noting how much was cut.
pub fn clip_output(output: &str, max_bytes: usize) -> String {
    let kept = truncate_str(output, max_bytes);
    if kept.len() == output.len() {
        return output.to_string();
    }
    format!(
        "{}\n... [{} bytes truncated]",
        kept.trim_end(),
        output.len() - kept.len()
    )
}

/// Count non-empty lines.
pub fn count_lines(output: &str) -> usize {
    output.lines().filter(|l| !l.trim().is_empty()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_no_op_when_short() {
        assert_eq!(truncate_str("hi", 10), "hi");
    }

    #[test]
    fn truncate_multibyte_boundary() {
        let s = "あのね"; // 3 bytes per char
        assert_eq!(truncate_str(s, 4), "あ");
        assert_eq!(truncate_str(s, 6), "あの");
    }

    #[test]
    fn clip_output_marks_truncation() {
        assert_eq!(clip_output("short", 100), "short");
        assert_eq!(
            clip_output("line one\nline two", 9),
            "line one\n... [8 bytes truncated]"
        );
    }

    #[test]
    fn count_lines_skips_blank() {
        assert_eq!(count_lines("a\n\n  \nb\n"), 2);
        assert_eq!(count_lines(""), 0);
    }
}
