use crate::analyzer::{self, ExportedDeclaration};
use crate::docs;
use crate::error::Result;
use crate::parser::SourceParser;
use crate::routing::{self, ROUTES_ROOT_MARKER, ROUTE_FILE_MARKER};
use crate::scanner::FileScanner;
use log::{debug, info};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// HTTP methods recognized as handler export names.
///
/// The set is closed: a route exists for a (file, method) pair iff the file
/// exports a function-like declaration named exactly one of these tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HttpMethod {
    /// HTTP GET method
    Get,
    /// HTTP POST method
    Post,
    /// HTTP PUT method
    Put,
    /// HTTP DELETE method
    Delete,
}

impl HttpMethod {
    /// Parses an export name into a method, accepting exactly the four
    /// uppercase tokens.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "DELETE" => Some(HttpMethod::Delete),
            _ => None,
        }
    }

    /// The uppercase method token.
    pub fn as_token(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// Aggregate route model: file path → method → route.
///
/// Ordered maps keep generated artifacts byte-identical across runs.
pub type RouteMap = BTreeMap<PathBuf, MethodTable>;

/// The routes a single file implements, at most one per method.
pub type MethodTable = BTreeMap<HttpMethod, Route>;

/// Complete extracted metadata for one route, immutable once built.
#[derive(Debug, Clone)]
pub struct Route {
    /// The HTTP method implemented by the handler
    pub method: HttpMethod,
    /// Textual rendering of the handler's type signature, opaque here
    pub declared_type: String,
    /// Inferred response payload type, or [`analyzer::UNKNOWN_RETURN_TYPE`]
    /// when no recognizable response-construction call was found
    pub return_type: String,
    /// Free-text documentation from adjacent JSDoc blocks
    pub documentation: Option<String>,
    /// Query-parameter names in call order, repetitions preserved
    pub query_parameters: Vec<String>,
    /// Request-body type override from the `@body` documentation tag
    pub body_type: Option<String>,
    /// Every URL template implied by the canonical path, omission-first
    pub urls: Vec<String>,
    /// Canonical route path before expansion
    pub path: String,
}

/// Builds the aggregate [`RouteMap`] for a project tree.
///
/// Each invocation performs a full re-scan and re-derivation; there is no
/// incremental update model. Per-file analysis is read-only and runs in
/// parallel; aggregation into the map happens sequentially afterwards, so
/// the map is never written concurrently.
///
/// # Example
///
/// ```no_run
/// use openapi_from_routes::route_map::RouteMapBuilder;
/// use std::path::PathBuf;
///
/// let routes = RouteMapBuilder::new(PathBuf::from("./my-app")).build().unwrap();
/// for (file, methods) in &routes {
///     println!("{}: {} methods", file.display(), methods.len());
/// }
/// ```
pub struct RouteMapBuilder {
    root: PathBuf,
    file_marker: String,
    routes_marker: String,
}

impl RouteMapBuilder {
    /// Creates a builder for `root` using the SvelteKit routing convention
    /// markers.
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            file_marker: ROUTE_FILE_MARKER.to_string(),
            routes_marker: ROUTES_ROOT_MARKER.to_string(),
        }
    }

    /// Runs one full generation pass.
    ///
    /// # Errors
    ///
    /// Any scan-fatal or file-fatal condition aborts the pass: no partial
    /// route map is ever returned. A file that fails to parse is a
    /// build-breaking error upstream, so file-fatal escalates rather than
    /// being skipped.
    pub fn build(&self) -> Result<RouteMap> {
        let files = FileScanner::new(self.root.clone()).scan(&self.file_marker)?;
        info!("Analyzing {} route files", files.len());

        let per_file: Vec<Result<Option<(PathBuf, MethodTable)>>> = files
            .par_iter()
            .map(|file| self.analyze_file(file))
            .collect();

        let mut routes = RouteMap::new();
        for result in per_file {
            if let Some((file, table)) = result? {
                routes.insert(file, table);
            }
        }

        info!("Route map holds {} files", routes.len());
        Ok(routes)
    }

    /// Analyzes one route file, returning `None` when it exports no
    /// qualifying handler declarations.
    fn analyze_file(&self, file: &Path) -> Result<Option<(PathBuf, MethodTable)>> {
        let parsed = SourceParser::parse_file(file)?;
        let doc_blocks = docs::collect_doc_blocks(parsed.root(), &parsed.source);

        // Path and URLs depend only on the file location; compute once and
        // share across methods.
        let path = routing::canonical_route_path(file, &self.routes_marker, &self.file_marker);
        let urls = routing::expand_urls(&path);

        let mut table = MethodTable::new();

        for declaration in analyzer::exported_method_declarations(parsed.root(), &parsed.source) {
            match declaration {
                ExportedDeclaration::FunctionLike(handler) => {
                    if table.contains_key(&handler.method) {
                        continue;
                    }

                    let selected = docs::blocks_for_declaration(&doc_blocks, handler.start_line);

                    let route = Route {
                        method: handler.method,
                        declared_type: handler.declared_signature(&parsed.source),
                        return_type: handler.inferred_return_type(&parsed.source),
                        documentation: docs::documentation_text(&selected),
                        query_parameters: handler.query_parameters(&parsed.source),
                        body_type: docs::body_type_from_blocks(&selected),
                        urls: urls.clone(),
                        path: path.clone(),
                    };

                    debug!("{} {} -> {:?}", route.method.as_token(), path, route.urls);
                    table.insert(handler.method, route);
                }
                ExportedDeclaration::Other { method, node } => {
                    debug!(
                        "Skipping non-function export {} ({}) in {}",
                        method.as_token(),
                        node.kind(),
                        file.display()
                    );
                }
            }
        }

        if table.is_empty() {
            Ok(None)
        } else {
            Ok(Some((file.to_path_buf(), table)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::UNKNOWN_RETURN_TYPE;
    use crate::error::Error;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn write_route(root: &Path, route_path: &str, code: &str) -> PathBuf {
        let file = root.join("src/routes").join(route_path).join("+server.ts");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, code).unwrap();
        file
    }

    #[test]
    fn test_optional_segment_route_end_to_end() {
        let temp_dir = TempDir::new().unwrap();
        let file = write_route(
            temp_dir.path(),
            "users/[[id]]",
            "export function GET() { return json({ ok: true }); }",
        );

        let routes = RouteMapBuilder::new(temp_dir.path().to_path_buf())
            .build()
            .unwrap();

        assert_eq!(routes.len(), 1);
        let route = &routes[&file][&HttpMethod::Get];

        assert_eq!(route.urls, vec!["/users", "/users/{id}"]);
        assert_eq!(route.path, "/users/[[id]]");
        assert_eq!(route.return_type, "{ ok: boolean }");
        assert!(route.query_parameters.is_empty());
        assert!(route.body_type.is_none());
        assert!(route.documentation.is_none());
    }

    #[test]
    fn test_file_without_method_exports_contributes_no_key() {
        let temp_dir = TempDir::new().unwrap();
        write_route(
            temp_dir.path(),
            "misc",
            "export function PATCH() { return json(1); }\nexport const helper = 2;",
        );

        let routes = RouteMapBuilder::new(temp_dir.path().to_path_buf())
            .build()
            .unwrap();

        assert!(routes.is_empty());
    }

    #[test]
    fn test_non_function_method_export_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        write_route(temp_dir.path(), "odd", "export const GET = 42;");

        let routes = RouteMapBuilder::new(temp_dir.path().to_path_buf())
            .build()
            .unwrap();

        assert!(routes.is_empty());
    }

    #[test]
    fn test_multiple_methods_share_path_and_urls() {
        let temp_dir = TempDir::new().unwrap();
        let code = r#"
export function GET() { return json([]); }

/**
 * Creates a user.
 * @body { name: string }
 */
export async function POST({ request }) {
    return json({ created: true });
}
"#;
        let file = write_route(temp_dir.path(), "users", code);

        let routes = RouteMapBuilder::new(temp_dir.path().to_path_buf())
            .build()
            .unwrap();

        let table = &routes[&file];
        assert_eq!(table.len(), 2);

        let get = &table[&HttpMethod::Get];
        let post = &table[&HttpMethod::Post];

        assert_eq!(get.urls, post.urls);
        assert_eq!(get.path, "/users");
        assert!(get.documentation.is_none());
        assert_eq!(post.documentation, Some("Creates a user.".to_string()));
        assert_eq!(post.body_type, Some("{ name: string }".to_string()));
        assert_eq!(post.return_type, "{ created: boolean }");
    }

    #[test]
    fn test_handler_without_json_call_gets_sentinel() {
        let temp_dir = TempDir::new().unwrap();
        let file = write_route(
            temp_dir.path(),
            "raw",
            "export function GET() { return new Response('raw'); }",
        );

        let routes = RouteMapBuilder::new(temp_dir.path().to_path_buf())
            .build()
            .unwrap();

        assert_eq!(routes[&file][&HttpMethod::Get].return_type, UNKNOWN_RETURN_TYPE);
    }

    #[test]
    fn test_query_parameters_are_recorded_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let code = r#"
export function GET({ url }) {
    const page = url.searchParams.get('page');
    const tags = url.searchParams.getAll('tag');
    return json({ page, tags });
}
"#;
        let file = write_route(temp_dir.path(), "posts", code);

        let routes = RouteMapBuilder::new(temp_dir.path().to_path_buf())
            .build()
            .unwrap();

        assert_eq!(
            routes[&file][&HttpMethod::Get].query_parameters,
            vec!["page", "tag"]
        );
    }

    #[test]
    fn test_malformed_file_fails_the_pass() {
        let temp_dir = TempDir::new().unwrap();
        write_route(temp_dir.path(), "ok", "export function GET() { return json(1); }");
        write_route(temp_dir.path(), "broken", "export function GET( { return ;;;(");

        let result = RouteMapBuilder::new(temp_dir.path().to_path_buf()).build();

        assert!(matches!(result, Err(Error::Parse { .. })));
    }

    #[test]
    fn test_missing_root_is_scan_fatal() {
        let result = RouteMapBuilder::new(PathBuf::from("/nonexistent/app")).build();

        assert!(matches!(result, Err(Error::Scan { .. })));
    }
}
