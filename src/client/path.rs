//! Request path construction for the rules API.
//!
//! Namespace and group names are escaped as single path segments for
//! create/get/delete. The optional namespace filter of a list call is
//! appended verbatim, so a filter such as `a/b` addresses `base/a/b`.

use std::borrow::Cow;

/// Percent-escape a value for use as one path segment.
///
/// Everything outside the RFC 3986 unreserved set is encoded, so `/`,
/// `%`, spaces and non-ASCII chars can never split or corrupt the path.
pub fn escape_segment(segment: &str) -> Cow<'_, str> {
    urlencoding::encode(segment)
}

/// `<base>/<namespace>`, used when creating a group.
pub fn namespace_path(base: &str, namespace: &str) -> String {
    format!("{}/{}", base, escape_segment(namespace))
}

/// `<base>/<namespace>/<group>`, used to get or delete a group.
pub fn group_path(base: &str, namespace: &str, group: &str) -> String {
    format!(
        "{}/{}/{}",
        base,
        escape_segment(namespace),
        escape_segment(group)
    )
}

/// `<base>` or `<base>/<namespace>` with the namespace unescaped.
pub fn list_path(base: &str, namespace: &str) -> String {
    if namespace.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, namespace)
    }
}
