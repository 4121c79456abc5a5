use log::warn;
use std::path::Path;

/// Filename marker identifying route handler files.
pub const ROUTE_FILE_MARKER: &str = "+server.ts";

/// Substring marking the routing root inside a project tree.
pub const ROUTES_ROOT_MARKER: &str = "src/routes";

/// One segment of a canonical route path.
///
/// The routing convention encodes parameters in directory names:
/// `[name]` is a required dynamic segment and `[[name]]` an optional dynamic
/// segment; everything else is literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    /// Literal text, copied into every template unchanged
    Literal(&'a str),
    /// Required dynamic segment, present in every template as `{name}`
    Required(String),
    /// Optional dynamic segment, contributing a binary choice per template
    Optional(String),
}

fn classify_segment(segment: &str) -> Segment<'_> {
    if segment.len() >= 4 && segment.starts_with("[[") && segment.ends_with("]]") {
        Segment::Optional(parameter_name(segment))
    } else if segment.len() >= 2 && segment.starts_with('[') && segment.ends_with(']') {
        Segment::Required(parameter_name(segment))
    } else {
        Segment::Literal(segment)
    }
}

fn parameter_name(segment: &str) -> String {
    segment.chars().filter(|c| *c != '[' && *c != ']').collect()
}

/// Converts an absolute route file path into its canonical route path.
///
/// Path separators are normalized to `/` regardless of host syntax, then
/// everything up to and including the last occurrence of `routes_marker` is
/// removed, then the trailing `/<file_marker>` suffix is removed.
///
/// When the routing-root marker is absent from the path the function cannot
/// produce a meaningful route; it logs a warning and returns the normalized
/// path with only the filename marker stripped. This is a heuristic miss,
/// not an error: the scan continues and the malformed path surfaces as an
/// implausible URL in the generated artifacts.
pub fn canonical_route_path(file: &Path, routes_marker: &str, file_marker: &str) -> String {
    let normalized = file.to_string_lossy().replace('\\', "/");

    let stripped = match normalized.rfind(routes_marker) {
        Some(idx) => &normalized[idx + routes_marker.len()..],
        None => {
            warn!(
                "routing root marker {:?} not found in {}; route path will be malformed",
                routes_marker,
                file.display()
            );
            normalized.as_str()
        }
    };

    let suffix = format!("/{}", file_marker);
    stripped
        .strip_suffix(&suffix)
        .unwrap_or(stripped)
        .to_string()
}

/// Expands a canonical route path into every URL template it implies.
///
/// Literal and required segments contribute a single branch; each optional
/// segment contributes two, omission first, so a path with `k` optional
/// segments yields `2^k` templates. Enumeration is depth-first with the
/// outermost segment decided before inner ones, which makes the order
/// deterministic for a given path: for `/a/[[b]]/[[c]]` the result is
/// `/a`, `/a/{c}`, `/a/{b}`, `/a/{b}/{c}`.
///
/// The builder runs over an explicit work stack rather than host-call-stack
/// recursion, so arbitrarily deep paths cannot overflow.
pub fn expand_urls(path: &str) -> Vec<String> {
    struct Frame {
        index: usize,
        segments: Vec<String>,
    }

    let route_segments: Vec<&str> = path.split('/').collect();
    let mut urls = Vec::new();
    let mut stack = vec![Frame {
        index: 0,
        segments: Vec::new(),
    }];

    while let Some(Frame { index, segments }) = stack.pop() {
        if index >= route_segments.len() {
            urls.push(segments.join("/"));
            continue;
        }

        match classify_segment(route_segments[index]) {
            Segment::Literal(text) => {
                let mut next = segments;
                next.push(text.to_string());
                stack.push(Frame {
                    index: index + 1,
                    segments: next,
                });
            }
            Segment::Required(name) => {
                let mut next = segments;
                next.push(format!("{{{}}}", name));
                stack.push(Frame {
                    index: index + 1,
                    segments: next,
                });
            }
            Segment::Optional(name) => {
                // The stack is LIFO: push the inclusion branch first so the
                // omission branch is popped, and therefore enumerated, first.
                let mut included = segments.clone();
                included.push(format!("{{{}}}", name));
                stack.push(Frame {
                    index: index + 1,
                    segments: included,
                });
                stack.push(Frame {
                    index: index + 1,
                    segments,
                });
            }
        }
    }

    urls
}

/// Finds the last literal segment preceding the first parameter segment of a
/// URL template, used to derive operation tags. Falls back to the final
/// segment when the template has no parameters.
pub fn first_segment_before_param(url: &str) -> &str {
    let segments: Vec<&str> = url.split('/').collect();
    match segments.iter().position(|s| s.starts_with('{')) {
        Some(index) if index > 0 => segments[index - 1],
        Some(_) => segments[segments.len() - 1],
        None => segments[segments.len() - 1],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;
    use std::path::PathBuf;

    #[test]
    fn test_canonical_path_posix() {
        let file = PathBuf::from("/home/dev/app/src/routes/users/[id]/+server.ts");
        let path = canonical_route_path(&file, ROUTES_ROOT_MARKER, ROUTE_FILE_MARKER);
        assert_eq!(path, "/users/[id]");
    }

    #[test]
    fn test_canonical_path_windows_separators() {
        let posix = canonical_route_path(
            &PathBuf::from("/dev/app/src/routes/users/+server.ts"),
            ROUTES_ROOT_MARKER,
            ROUTE_FILE_MARKER,
        );
        let windows = canonical_route_path(
            &PathBuf::from(r"C:\dev\app\src\routes\users\+server.ts"),
            ROUTES_ROOT_MARKER,
            ROUTE_FILE_MARKER,
        );
        assert_eq!(posix, windows);
    }

    #[test]
    fn test_canonical_path_strips_to_last_marker_occurrence() {
        let file = PathBuf::from("/projects/src/routes/demo/src/routes/users/+server.ts");
        let path = canonical_route_path(&file, ROUTES_ROOT_MARKER, ROUTE_FILE_MARKER);
        assert_eq!(path, "/users");
    }

    #[test]
    fn test_canonical_path_of_routing_root_file() {
        let file = PathBuf::from("/app/src/routes/+server.ts");
        let path = canonical_route_path(&file, ROUTES_ROOT_MARKER, ROUTE_FILE_MARKER);
        assert_eq!(path, "");
    }

    #[test]
    fn test_canonical_path_without_marker_degrades() {
        let file = PathBuf::from("/somewhere/else/users/+server.ts");
        let path = canonical_route_path(&file, ROUTES_ROOT_MARKER, ROUTE_FILE_MARKER);
        // Known edge case: the marker is absent, so only the filename marker
        // is stripped and the result is not a plausible route path.
        assert_eq!(path, "/somewhere/else/users");
    }

    #[test]
    fn test_expand_static_path_yields_single_url() {
        assert_eq!(expand_urls("/users/list"), vec!["/users/list"]);
    }

    #[test]
    fn test_expand_required_segment() {
        assert_eq!(expand_urls("/users/[id]"), vec!["/users/{id}"]);
    }

    #[test]
    fn test_expand_optional_segment() {
        assert_eq!(expand_urls("/users/[[id]]"), vec!["/users", "/users/{id}"]);
    }

    #[test]
    fn test_expand_order_is_omit_first_outer_before_inner() {
        assert_eq!(
            expand_urls("/a/[[b]]/[[c]]"),
            vec!["/a", "/a/{c}", "/a/{b}", "/a/{b}/{c}"]
        );
    }

    #[test]
    fn test_required_segment_present_in_every_template() {
        let urls = expand_urls("/a/[b]/[[c]]");
        assert_eq!(urls, vec!["/a/{b}", "/a/{b}/{c}"]);
        assert!(urls.iter().all(|u| u.contains("{b}")));
    }

    #[test]
    fn test_expand_count_is_two_to_the_k() {
        let urls = expand_urls("/[[a]]/[[b]]/[[c]]");
        assert_eq!(urls.len(), 8);

        let distinct: HashSet<&String> = urls.iter().collect();
        assert_eq!(distinct.len(), 8, "expansion must not produce duplicates");
    }

    #[test]
    fn test_expand_mixed_nesting_has_no_duplicates() {
        let urls = expand_urls("/api/[[v]]/users/[id]/posts/[[page]]");
        assert_eq!(urls.len(), 4);

        let distinct: HashSet<&String> = urls.iter().collect();
        assert_eq!(distinct.len(), urls.len());
        assert!(urls.iter().all(|u| u.contains("{id}")));
    }

    #[test]
    fn test_expand_rest_segment_keeps_inner_name() {
        assert_eq!(expand_urls("/files/[...slug]"), vec!["/files/{...slug}"]);
    }

    #[test]
    fn test_first_segment_before_param() {
        assert_eq!(first_segment_before_param("/users/{id}"), "users");
        assert_eq!(first_segment_before_param("/users"), "users");
        assert_eq!(first_segment_before_param("/a/b/{c}/{d}"), "b");
    }
}
