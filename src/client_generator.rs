use crate::route_map::{HttpMethod, Route, RouteMap};
use log::debug;
use std::collections::BTreeMap;

/// Generates a typed TypeScript API client from a route map.
///
/// The emitted module exposes one exported async function per
/// (URL template, method) pair: path parameters become positional string
/// arguments, query parameters an optional typed object, a documented
/// request body an explicit `body` argument. Response types reuse the
/// inferred `returnType` texts verbatim. Output is deterministic for a
/// given route map.
pub fn generate_api_client(routes: &RouteMap) -> String {
    // Key by (URL, method) so routes that expand onto the same template
    // (an optional-segment route next to its static sibling) produce a
    // single function; map iteration order makes the winner deterministic.
    let mut functions: BTreeMap<(String, &'static str), String> = BTreeMap::new();

    for table in routes.values() {
        for route in table.values() {
            for url in &route.urls {
                debug!(
                    "Emitting client function for {} {}",
                    route.method.as_token(),
                    url
                );
                functions.insert(
                    (url.clone(), route.method.as_token()),
                    client_function(route, url),
                );
            }
        }
    }

    let mut output = String::from(
        "// Generated by openapi-from-routes. Do not edit by hand.\n\
         /* eslint-disable */\n",
    );
    for function in functions.values() {
        output.push('\n');
        output.push_str(function);
    }
    output
}

/// Renders the client function for one (URL, method) pair.
fn client_function(route: &Route, url: &str) -> String {
    let name = function_name(route.method, url);
    let path_params = path_parameters(url);
    let query_params = unique_query_parameters(route);

    let mut arguments: Vec<String> = path_params
        .iter()
        .map(|p| format!("{}: string", sanitize_identifier(p)))
        .collect();
    if let Some(body_type) = &route.body_type {
        arguments.push(format!("body: {}", body_type));
    }
    if !query_params.is_empty() {
        let members: Vec<String> = query_params
            .iter()
            .map(|p| format!("{}?: string", sanitize_identifier(p)))
            .collect();
        arguments.push(format!("query?: {{ {} }}", members.join("; ")));
    }
    arguments.push("init?: RequestInit".to_string());

    let mut lines = Vec::new();
    if let Some(documentation) = &route.documentation {
        if !documentation.is_empty() {
            lines.push(format!("/** {} */", documentation.replace('\n', " ")));
        }
    }
    lines.push(format!(
        "export async function {}({}): Promise<{}> {{",
        name,
        arguments.join(", "),
        route.return_type
    ));

    if query_params.is_empty() {
        lines.push(format!("    const url = {};", path_template(url)));
    } else {
        lines.push(format!("    let url = {};", path_template(url)));
        lines.push("    if (query) {".to_string());
        lines.push("        const search = new URLSearchParams();".to_string());
        lines.push(
            "        for (const [key, value] of Object.entries(query)) {".to_string(),
        );
        lines.push("            if (value !== undefined) search.append(key, value);".to_string());
        lines.push("        }".to_string());
        lines.push("        if (search.size > 0) url += `?${search}`;".to_string());
        lines.push("    }".to_string());
    }

    let mut fetch_options = vec![format!("method: '{}'", route.method.as_token())];
    if route.body_type.is_some() {
        fetch_options.push("headers: { 'content-type': 'application/json' }".to_string());
        fetch_options.push("body: JSON.stringify(body)".to_string());
    }
    fetch_options.push("...init".to_string());

    lines.push(format!(
        "    const response = await fetch(url, {{ {} }});",
        fetch_options.join(", ")
    ));
    lines.push("    return response.json();".to_string());
    lines.push("}".to_string());

    let mut rendered = lines.join("\n");
    rendered.push('\n');
    rendered
}

/// Derives the function name for a (method, URL) pair:
/// `GET /users/{id}` becomes `getUsersById`, the root URL becomes
/// `getIndex`.
fn function_name(method: HttpMethod, url: &str) -> String {
    let mut name = method.as_token().to_lowercase();

    let mut named_segment = false;
    for segment in url.split('/').filter(|s| !s.is_empty()) {
        if let Some(param) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            name.push_str("By");
            name.push_str(&pascal_case(param));
        } else {
            name.push_str(&pascal_case(segment));
        }
        named_segment = true;
    }

    if !named_segment {
        name.push_str("Index");
    }
    name
}

/// Parameter names appearing in a URL template, in order.
fn path_parameters(url: &str) -> Vec<String> {
    url.split('/')
        .filter_map(|segment| {
            segment
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
                .map(|name| name.to_string())
        })
        .collect()
}

/// Query parameter names with repetitions collapsed, first-seen order.
fn unique_query_parameters(route: &Route) -> Vec<String> {
    let mut unique = Vec::new();
    for name in &route.query_parameters {
        if !unique.contains(name) {
            unique.push(name.clone());
        }
    }
    unique
}

/// Renders a URL template as a TypeScript template literal interpolating
/// path parameters: `/users/{id}` becomes `` `/users/${id}` ``.
fn path_template(url: &str) -> String {
    let mut rendered = String::from("`");
    for segment in url.split('/').skip(1) {
        rendered.push('/');
        match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(param) => {
                rendered.push_str("${");
                rendered.push_str(&sanitize_identifier(param));
                rendered.push('}');
            }
            None => rendered.push_str(segment),
        }
    }
    rendered.push('`');
    rendered
}

/// Upper-camel-cases a segment, splitting on `-`, `_` and `.`.
fn pascal_case(text: &str) -> String {
    text.split(['-', '_', '.'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Restricts a parameter name to identifier characters so rest-style
/// parameter names cannot break the emitted source.
fn sanitize_identifier(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
