//! Trimming of non-printing chars around response bodies.

use unicode_general_category::{get_general_category, GeneralCategory};

use crate::observability::Edge;

/// Returns true if `c` is a graphic char.
///
/// Graphic covers assigned letters, marks, numbers, punctuation, symbols
/// and space separators (so U+0020 is graphic). Control, format, line and
/// paragraph separator, private use, surrogate and unassigned code points
/// are not.
pub fn is_graphic(c: char) -> bool {
    use GeneralCategory::*;

    !matches!(
        get_general_category(c),
        Control
            | Format
            | Surrogate
            | PrivateUse
            | Unassigned
            | LineSeparator
            | ParagraphSeparator
    )
}

/// Strip non-graphic chars from both ends of `body`.
///
/// `on_strip` is called once per removed char, leading chars first in
/// order, then trailing chars in order. A body with no graphic char is
/// stripped entirely and reported as leading.
pub fn trim_non_graphic<F>(body: &str, mut on_strip: F) -> &str
where
    F: FnMut(char, Edge),
{
    let Some(start) = body.find(is_graphic) else {
        body.chars().for_each(|c| on_strip(c, Edge::Leading));
        return "";
    };
    body[..start]
        .chars()
        .for_each(|c| on_strip(c, Edge::Leading));

    let rest = &body[start..];
    let end = rest
        .char_indices()
        .rev()
        .find(|&(_, c)| is_graphic(c))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(rest.len());
    rest[end..]
        .chars()
        .for_each(|c| on_strip(c, Edge::Trailing));

    &rest[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trim_collect(body: &str) -> (&str, Vec<(char, Edge)>) {
        let mut stripped = Vec::new();
        let trimmed = trim_non_graphic(body, |c, edge| stripped.push((c, edge)));
        (trimmed, stripped)
    }

    #[test]
    fn test_graphic_classification() {
        for c in ['a', 'Z', '0', '-', ':', ' ', '\u{00A0}', 'é', '名', '€', '\u{FFFD}'] {
            assert!(is_graphic(c), "{:?} should be graphic", c);
        }
        for c in [
            '\0', '\n', '\r', '\t', '\u{7F}', '\u{85}', '\u{FEFF}', '\u{200B}', '\u{2028}',
            '\u{E000}', '\u{FFFF}', '\u{0378}', '\u{E0080}',
        ] {
            assert!(!is_graphic(c), "{:?} should not be graphic", c);
        }
    }

    #[test]
    fn test_trim_both_ends() {
        let (trimmed, stripped) = trim_collect("\0\0ns:\n  - name: g\0");

        assert_eq!(trimmed, "ns:\n  - name: g");
        assert_eq!(
            stripped,
            vec![
                ('\0', Edge::Leading),
                ('\0', Edge::Leading),
                ('\0', Edge::Trailing)
            ]
        );
    }

    #[test]
    fn test_trailing_newline_stripped() {
        let (trimmed, stripped) = trim_collect("ns: []\n");
        assert_eq!(trimmed, "ns: []");
        assert_eq!(stripped, vec![('\n', Edge::Trailing)]);
    }

    #[test]
    fn test_interior_preserved() {
        let (trimmed, stripped) = trim_collect("a:\n\t\0b");
        assert_eq!(trimmed, "a:\n\t\0b");
        assert!(stripped.is_empty());
    }

    #[test]
    fn test_unassigned_trailing_stripped() {
        let (trimmed, stripped) = trim_collect("a: 1\u{0378}\u{E0080}");
        assert_eq!(trimmed, "a: 1");
        assert_eq!(
            stripped,
            vec![('\u{0378}', Edge::Trailing), ('\u{E0080}', Edge::Trailing)]
        );
    }

    #[test]
    fn test_bom_stripped() {
        let (trimmed, stripped) = trim_collect("\u{FEFF}a: 1");
        assert_eq!(trimmed, "a: 1");
        assert_eq!(stripped, vec![('\u{FEFF}', Edge::Leading)]);
    }

    #[test]
    fn test_spaces_kept() {
        let (trimmed, stripped) = trim_collect("  a: 1  ");
        assert_eq!(trimmed, "  a: 1  ");
        assert!(stripped.is_empty());
    }

    #[test]
    fn test_all_non_graphic() {
        let (trimmed, stripped) = trim_collect("\r\n\0");
        assert_eq!(trimmed, "");
        assert_eq!(stripped.len(), 3);
        assert!(stripped.iter().all(|&(_, edge)| edge == Edge::Leading));
    }

    #[test]
    fn test_empty() {
        let (trimmed, stripped) = trim_collect("");
        assert_eq!(trimmed, "");
        assert!(stripped.is_empty());
    }
}
