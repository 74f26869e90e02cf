//! Filesystem-safe path segments.

/// Replacement for a segment that would escape or alias its parent directory.
const RESERVED_REPLACEMENT: &str = "_";

/// Makes one decoded URL path segment safe to use as a single Linux path component.
///
/// - Replaces NUL, `/`, `\`, and control characters with `_`
/// - Maps the reserved names `.` and `..` to `_`
/// - Limits length to 255 bytes (Linux NAME_MAX)
///
/// Unlike a display-name sanitizer this keeps spaces and dots as-is, so the
/// mirrored tree matches the remote layout as closely as the filesystem allows.
pub fn sanitize_segment(segment: &str) -> String {
    const NAME_MAX: usize = 255;

    let replaced: String = segment
        .chars()
        .map(|c| {
            if c == '\0' || c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    if replaced == "." || replaced == ".." {
        return RESERVED_REPLACEMENT.to_string();
    }

    if replaced.len() > NAME_MAX {
        let mut take = NAME_MAX;
        while take > 0 && !replaced.is_char_boundary(take) {
            take -= 1;
        }
        replaced[..take].to_string()
    } else {
        replaced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_separators() {
        assert_eq!(sanitize_segment("a/b\\c.txt"), "a_b_c.txt");
    }

    #[test]
    fn keeps_spaces_and_dots() {
        assert_eq!(sanitize_segment("my file.tar.gz"), "my file.tar.gz");
    }

    #[test]
    fn reserved_names() {
        assert_eq!(sanitize_segment("."), "_");
        assert_eq!(sanitize_segment(".."), "_");
    }

    #[test]
    fn control_chars() {
        assert_eq!(sanitize_segment("file\x00name\n.txt"), "file_name_.txt");
    }

    #[test]
    fn truncates_on_char_boundary() {
        let long = "é".repeat(200);
        let out = sanitize_segment(&long);
        assert!(out.len() <= 255);
        assert!(out.chars().all(|c| c == 'é'));
    }
}
