use crate::parser::node_text;
use crate::route_map::HttpMethod;
use log::debug;
use tree_sitter::Node;

/// Sentinel return type recorded when no recognizable response-construction
/// call is found in a handler body.
pub const UNKNOWN_RETURN_TYPE: &str = "any";

/// The response constructor recognized in return statements. SvelteKit
/// handlers build JSON responses through the `json` helper.
pub const RESPONSE_CONSTRUCTOR: &str = "json";

/// Call-site idioms recognized as query-parameter reads on the handler's
/// request-context object.
const QUERY_ACCESSORS: [&str; 2] = ["url.searchParams.get", "url.searchParams.getAll"];

/// A top-level exported declaration named after an HTTP method token,
/// classified by shape.
///
/// Only the function-like variant is analyzed; an exported class or plain
/// value that happens to carry a method name is skipped explicitly by the
/// route map builder rather than being probed for handler structure.
pub enum ExportedDeclaration<'a> {
    /// An exported function declaration, arrow function or function
    /// expression bound to a method-token name
    FunctionLike(HandlerDeclaration<'a>),
    /// Any other exported form under a method-token name
    Other { method: HttpMethod, node: Node<'a> },
}

/// One exported handler declaration, ready for analysis.
pub struct HandlerDeclaration<'a> {
    /// The HTTP method implemented by this handler
    pub method: HttpMethod,
    /// 1-based start line of the enclosing export statement, used for
    /// documentation comment association
    pub start_line: usize,
    /// The declaration subtree scanned for returns and call sites
    node: Node<'a>,
    /// The formal parameter list, when syntactically present
    parameters: Option<Node<'a>>,
    /// An unparenthesized single arrow-function parameter, when present
    bare_parameter: Option<Node<'a>>,
    /// The declared return type annotation, when present
    return_annotation: Option<Node<'a>>,
    is_async: bool,
}

/// Collects every top-level exported declaration whose name is one of the
/// fixed HTTP method tokens, in source order.
pub fn exported_method_declarations<'a>(
    root: Node<'a>,
    source: &str,
) -> Vec<ExportedDeclaration<'a>> {
    let mut found = Vec::new();

    let mut cursor = root.walk();
    for statement in root.named_children(&mut cursor) {
        if statement.kind() != "export_statement" {
            continue;
        }
        let Some(declaration) = statement.child_by_field_name("declaration") else {
            continue;
        };
        let export_line = statement.start_position().row + 1;

        match declaration.kind() {
            "function_declaration" | "generator_function_declaration" => {
                let Some(name) = declaration.child_by_field_name("name") else {
                    continue;
                };
                let Some(method) = HttpMethod::from_token(node_text(name, source)) else {
                    continue;
                };
                found.push(ExportedDeclaration::FunctionLike(HandlerDeclaration {
                    method,
                    start_line: export_line,
                    node: declaration,
                    parameters: declaration.child_by_field_name("parameters"),
                    bare_parameter: None,
                    return_annotation: declaration.child_by_field_name("return_type"),
                    is_async: has_keyword(declaration, "async"),
                }));
            }
            "lexical_declaration" | "variable_declaration" => {
                let mut declarators = declaration.walk();
                for declarator in declaration.named_children(&mut declarators) {
                    if declarator.kind() != "variable_declarator" {
                        continue;
                    }
                    let Some(name) = declarator.child_by_field_name("name") else {
                        continue;
                    };
                    let Some(method) = HttpMethod::from_token(node_text(name, source)) else {
                        continue;
                    };
                    match declarator.child_by_field_name("value") {
                        Some(value) if is_function_like(value.kind()) => {
                            found.push(ExportedDeclaration::FunctionLike(HandlerDeclaration {
                                method,
                                start_line: export_line,
                                node: value,
                                parameters: value.child_by_field_name("parameters"),
                                bare_parameter: value.child_by_field_name("parameter"),
                                return_annotation: value.child_by_field_name("return_type"),
                                is_async: has_keyword(value, "async"),
                            }));
                        }
                        _ => found.push(ExportedDeclaration::Other {
                            method,
                            node: declarator,
                        }),
                    }
                }
            }
            _ => {
                // Classes and other exported forms are only reported when
                // they shadow a method token, so the builder can skip them
                // deliberately.
                if let Some(name) = declaration.child_by_field_name("name") {
                    if let Some(method) = HttpMethod::from_token(node_text(name, source)) {
                        found.push(ExportedDeclaration::Other {
                            method,
                            node: declaration,
                        });
                    }
                }
            }
        }
    }

    found
}

fn is_function_like(kind: &str) -> bool {
    matches!(
        kind,
        "arrow_function" | "function_expression" | "function" | "generator_function"
    )
}

fn has_keyword(node: Node<'_>, keyword: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == keyword);
    found
}

impl<'a> HandlerDeclaration<'a> {
    /// Textual rendering of the declaration's type signature:
    /// `(<parameters>) => <return>`. The return part prefers the declared
    /// annotation; absent one, async handlers render as `Promise<unknown>`
    /// and synchronous ones as `unknown`. The string is opaque to the
    /// engine and recorded verbatim for downstream consumers.
    pub fn declared_signature(&self, source: &str) -> String {
        let params = match (self.parameters, self.bare_parameter) {
            (Some(p), _) => node_text(p, source).to_string(),
            (None, Some(p)) => format!("({})", node_text(p, source)),
            (None, None) => "()".to_string(),
        };

        let ret = match self.return_annotation {
            Some(annotation) => node_text(annotation, source)
                .trim_start_matches(':')
                .trim()
                .to_string(),
            None if self.is_async => "Promise<unknown>".to_string(),
            None => "unknown".to_string(),
        };

        format!("{} => {}", params, ret)
    }

    /// Infers the response payload type by scanning every return statement
    /// in the declaration subtree for a `json(...)` call and joining the
    /// distinct argument types with ` | ` in first-seen order.
    ///
    /// This is a heuristic: handlers that build responses any other way
    /// degrade to [`UNKNOWN_RETURN_TYPE`], never to an error.
    pub fn inferred_return_type(&self, source: &str) -> String {
        let mut types: Vec<String> = Vec::new();

        for node in descendants(self.node) {
            if node.kind() != "return_statement" {
                continue;
            }
            let Some(call) = first_descendant(node, "call_expression") else {
                continue;
            };
            let Some(callee) = first_descendant(call, "identifier") else {
                continue;
            };
            if node_text(callee, source) != RESPONSE_CONSTRUCTOR {
                continue;
            }
            let Some(argument) = first_argument(call) else {
                continue;
            };

            let inferred = infer_expression_type(argument, source);
            if !types.contains(&inferred) {
                types.push(inferred);
            }
        }

        if types.is_empty() {
            debug!(
                "no {} call found in {} handler; response type unknown",
                RESPONSE_CONSTRUCTOR,
                self.method.as_token()
            );
            UNKNOWN_RETURN_TYPE.to_string()
        } else {
            types.join(" | ")
        }
    }

    /// Collects query-parameter names read through the recognized accessor
    /// pair, in call order. Repeated reads of the same name produce
    /// repeated entries.
    pub fn query_parameters(&self, source: &str) -> Vec<String> {
        let mut parameters = Vec::new();

        for node in descendants(self.node) {
            if node.kind() != "call_expression" {
                continue;
            }
            let Some(callee) = node.child_by_field_name("function") else {
                continue;
            };
            if !QUERY_ACCESSORS.contains(&node_text(callee, source)) {
                continue;
            }
            let Some(argument) = first_argument(node) else {
                continue;
            };

            let name = node_text(argument, source).replace(['\'', '"'], "");
            parameters.push(name);
        }

        parameters
    }
}

/// All strict descendants of `node` in pre-order (document order), gathered
/// over an explicit stack.
pub(crate) fn descendants(node: Node<'_>) -> Vec<Node<'_>> {
    fn push_children<'a>(node: Node<'a>, stack: &mut Vec<Node<'a>>) {
        let mut cursor = node.walk();
        let children: Vec<Node<'a>> = node.named_children(&mut cursor).collect();
        // Reverse so the LIFO stack pops children in document order.
        stack.extend(children.into_iter().rev());
    }

    let mut collected = Vec::new();
    let mut stack = Vec::new();
    push_children(node, &mut stack);

    while let Some(current) = stack.pop() {
        collected.push(current);
        push_children(current, &mut stack);
    }

    collected
}

/// The first strict descendant of `node` with the given kind, in document
/// order.
fn first_descendant<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    descendants(node).into_iter().find(|n| n.kind() == kind)
}

/// The first argument expression of a call, when the call has one.
fn first_argument(call: Node<'_>) -> Option<Node<'_>> {
    let arguments = call.child_by_field_name("arguments")?;
    let mut cursor = arguments.walk();
    let found = arguments
        .named_children(&mut cursor)
        .find(|n| n.kind() != "comment");
    found
}

/// Infers a textual TypeScript type for an expression from its syntactic
/// shape, widening literals the way a type checker would (`true` becomes
/// `boolean`, `1` becomes `number`). Expressions whose type cannot be
/// derived without resolution degrade to `unknown`.
fn infer_expression_type(node: Node<'_>, source: &str) -> String {
    match node.kind() {
        "string" | "template_string" => "string".to_string(),
        "number" => "number".to_string(),
        "true" | "false" => "boolean".to_string(),
        "null" => "null".to_string(),
        "undefined" => "undefined".to_string(),
        "object" => infer_object_type(node, source),
        "array" => infer_array_type(node, source),
        "as_expression" => node
            .named_child(1)
            .map(|ty| node_text(ty, source).to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        "satisfies_expression" | "parenthesized_expression" | "await_expression"
        | "non_null_expression" => node
            .named_child(0)
            .map(|inner| infer_expression_type(inner, source))
            .unwrap_or_else(|| "unknown".to_string()),
        "ternary_expression" => {
            let mut branches = Vec::new();
            for field in ["consequence", "alternative"] {
                if let Some(branch) = node.child_by_field_name(field) {
                    let inferred = infer_expression_type(branch, source);
                    if !branches.contains(&inferred) {
                        branches.push(inferred);
                    }
                }
            }
            match branches.len() {
                0 => "unknown".to_string(),
                _ => branches.join(" | "),
            }
        }
        "unary_expression" => {
            let operator = node
                .child_by_field_name("operator")
                .map(|op| node_text(op, source))
                .unwrap_or("");
            match operator {
                "-" | "+" | "~" => "number".to_string(),
                "!" => "boolean".to_string(),
                _ => "unknown".to_string(),
            }
        }
        _ => "unknown".to_string(),
    }
}

fn infer_object_type(node: Node<'_>, source: &str) -> String {
    let mut members = Vec::new();

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "pair" => {
                let key = child
                    .child_by_field_name("key")
                    .map(|k| node_text(k, source).replace(['\'', '"'], ""))
                    .unwrap_or_default();
                let value_type = child
                    .child_by_field_name("value")
                    .map(|v| infer_expression_type(v, source))
                    .unwrap_or_else(|| "unknown".to_string());
                members.push(format!("{}: {}", key, value_type));
            }
            "shorthand_property_identifier" => {
                members.push(format!("{}: unknown", node_text(child, source)));
            }
            // Spread elements and method shorthand are beyond shape
            // inference; they contribute nothing.
            _ => {}
        }
    }

    if members.is_empty() {
        "{}".to_string()
    } else {
        format!("{{ {} }}", members.join("; "))
    }
}

fn infer_array_type(node: Node<'_>, source: &str) -> String {
    let mut element_types: Vec<String> = Vec::new();

    let mut cursor = node.walk();
    for element in node.named_children(&mut cursor) {
        if element.kind() == "comment" {
            continue;
        }
        let inferred = infer_expression_type(element, source);
        if !element_types.contains(&inferred) {
            element_types.push(inferred);
        }
    }

    match element_types.len() {
        0 => "unknown[]".to_string(),
        1 => format!("{}[]", element_types[0]),
        _ => format!("({})[]", element_types.join(" | ")),
    }
}
