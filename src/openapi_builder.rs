use crate::analyzer::UNKNOWN_RETURN_TYPE;
use crate::route_map::{HttpMethod, Route, RouteMap};
use crate::routing::first_segment_before_param;
use crate::schema_generator::{Schema, TypeSchemaConverter};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// OpenAPI document builder.
///
/// Groups routes by expanded URL template and HTTP method: every URL a
/// route expands to receives its own path item, so an optional-segment
/// route contributes several operations. Ordered maps keep the serialized
/// document stable across runs.
pub struct OpenApiBuilder {
    info: Info,
    paths: BTreeMap<String, PathItem>,
}

/// OpenAPI Info object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Info {
    /// API title
    pub title: String,
    /// API version
    pub version: String,
    /// API description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI PathItem object - all operations for a single URL template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathItem {
    /// GET operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    /// POST operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    /// PUT operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    /// DELETE operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
}

/// OpenAPI Operation object - a single (URL, method) pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    /// Group tag derived from the URL
    pub tags: Vec<String>,
    /// Human-readable description from handler documentation
    pub description: String,
    /// Query parameters read by the handler
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Parameter>>,
    /// Request body, present when the handler documents one
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Responses keyed by status code
    pub responses: BTreeMap<String, Response>,
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Parameter location
    #[serde(rename = "in")]
    pub location: String,
    /// Whether the parameter must be supplied
    pub required: bool,
    /// Parameter schema
    pub schema: Schema,
}

/// OpenAPI RequestBody object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBody {
    /// Whether the request body is required
    pub required: bool,
    /// Content types and their schemas
    pub content: BTreeMap<String, MediaType>,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaType {
    /// Schema for this media type
    pub schema: Schema,
}

/// OpenAPI Response object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Response description
    pub description: String,
    /// Response content, absent when the payload type is unknown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaType>>,
}

/// Complete OpenAPI document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// OpenAPI version
    pub openapi: String,
    /// API info
    pub info: Info,
    /// API paths
    pub paths: BTreeMap<String, PathItem>,
}

const JSON_CONTENT_TYPE: &str = "application/json";

impl OpenApiBuilder {
    /// Create a new OpenApiBuilder with default info
    pub fn new() -> Self {
        Self {
            info: Info {
                title: "SvelteKit API".to_string(),
                version: "1.0.0".to_string(),
                description: None,
            },
            paths: BTreeMap::new(),
        }
    }

    /// Set custom info for the API
    pub fn with_info(mut self, title: String, version: String, description: Option<String>) -> Self {
        self.info = Info {
            title,
            version,
            description,
        };
        self
    }

    /// Add every route of a route map to the document
    pub fn add_route_map(&mut self, routes: &RouteMap, converter: &dyn TypeSchemaConverter) {
        for table in routes.values() {
            for route in table.values() {
                self.add_route(route, converter);
            }
        }
    }

    /// Add one route to the document, one operation per expanded URL
    pub fn add_route(&mut self, route: &Route, converter: &dyn TypeSchemaConverter) {
        for url in &route.urls {
            debug!("Adding operation: {} {}", route.method.as_token(), url);

            let operation = self.build_operation(route, url, converter);
            let path_item = self.paths.entry(url.clone()).or_default();

            match route.method {
                HttpMethod::Get => path_item.get = Some(operation),
                HttpMethod::Post => path_item.post = Some(operation),
                HttpMethod::Put => path_item.put = Some(operation),
                HttpMethod::Delete => path_item.delete = Some(operation),
            }
        }
    }

    fn build_operation(
        &self,
        route: &Route,
        url: &str,
        converter: &dyn TypeSchemaConverter,
    ) -> Operation {
        let tag = capitalize(first_segment_before_param(url));

        let parameters = if route.query_parameters.is_empty() {
            None
        } else {
            // Query parameters carry no declared types; they are opaque
            // string-valued by convention.
            let params: Vec<Parameter> = route
                .query_parameters
                .iter()
                .map(|name| Parameter {
                    name: name.clone(),
                    location: "query".to_string(),
                    required: false,
                    schema: Schema::of_type("string"),
                })
                .collect();
            Some(params)
        };

        let request_body = route.body_type.as_ref().map(|body_type| RequestBody {
            required: true,
            content: json_content(converter.convert(body_type)),
        });

        let response = if route.return_type == UNKNOWN_RETURN_TYPE {
            Response {
                description: "Successful response".to_string(),
                content: None,
            }
        } else {
            Response {
                description: "Successful response".to_string(),
                content: Some(json_content(converter.convert(&route.return_type))),
            }
        };

        let mut responses = BTreeMap::new();
        responses.insert("200".to_string(), response);

        Operation {
            tags: vec![tag],
            description: route
                .documentation
                .clone()
                .unwrap_or_else(|| "No description".to_string()),
            parameters,
            request_body,
            responses,
        }
    }

    /// Build the final OpenAPI document
    pub fn build(self) -> OpenApiDocument {
        debug!("Building final OpenAPI document");

        OpenApiDocument {
            openapi: "3.0.0".to_string(),
            info: self.info,
            paths: self.paths,
        }
    }
}

impl Default for OpenApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn json_content(schema: Schema) -> BTreeMap<String, MediaType> {
    let mut content = BTreeMap::new();
    content.insert(JSON_CONTENT_TYPE.to_string(), MediaType { schema });
    content
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema_generator::TsTypeConverter;
    use pretty_assertions::assert_eq;

    fn route(method: HttpMethod, path: &str, urls: &[&str]) -> Route {
        Route {
            method,
            declared_type: "({ url }) => Promise<unknown>".to_string(),
            return_type: UNKNOWN_RETURN_TYPE.to_string(),
            documentation: None,
            query_parameters: Vec::new(),
            body_type: None,
            urls: urls.iter().map(|u| u.to_string()).collect(),
            path: path.to_string(),
        }
    }

    #[test]
    fn test_one_operation_per_expanded_url() {
        let mut builder = OpenApiBuilder::new();
        let route = route(HttpMethod::Get, "/users/[[id]]", &["/users", "/users/{id}"]);

        builder.add_route(&route, &TsTypeConverter);
        let document = builder.build();

        assert_eq!(document.paths.len(), 2);
        assert!(document.paths["/users"].get.is_some());
        assert!(document.paths["/users/{id}"].get.is_some());
    }

    #[test]
    fn test_methods_group_under_shared_url() {
        let mut builder = OpenApiBuilder::new();
        builder.add_route(&route(HttpMethod::Get, "/users", &["/users"]), &TsTypeConverter);
        builder.add_route(&route(HttpMethod::Post, "/users", &["/users"]), &TsTypeConverter);

        let document = builder.build();

        assert_eq!(document.paths.len(), 1);
        let path_item = &document.paths["/users"];
        assert!(path_item.get.is_some());
        assert!(path_item.post.is_some());
        assert!(path_item.put.is_none());
    }

    #[test]
    fn test_tag_from_segment_before_parameter() {
        let mut builder = OpenApiBuilder::new();
        let route = route(HttpMethod::Get, "/users/[id]", &["/users/{id}"]);

        builder.add_route(&route, &TsTypeConverter);
        let document = builder.build();

        let operation = document.paths["/users/{id}"].get.as_ref().unwrap();
        assert_eq!(operation.tags, vec!["Users"]);
    }

    #[test]
    fn test_description_defaults_when_undocumented() {
        let mut builder = OpenApiBuilder::new();
        builder.add_route(&route(HttpMethod::Get, "/users", &["/users"]), &TsTypeConverter);

        let document = builder.build();

        let operation = document.paths["/users"].get.as_ref().unwrap();
        assert_eq!(operation.description, "No description");
    }

    #[test]
    fn test_documentation_becomes_description() {
        let mut builder = OpenApiBuilder::new();
        let mut documented = route(HttpMethod::Get, "/users", &["/users"]);
        documented.documentation = Some("Lists every user.".to_string());

        builder.add_route(&documented, &TsTypeConverter);
        let document = builder.build();

        let operation = document.paths["/users"].get.as_ref().unwrap();
        assert_eq!(operation.description, "Lists every user.");
    }

    #[test]
    fn test_query_parameters_are_opaque_strings() {
        let mut builder = OpenApiBuilder::new();
        let mut with_query = route(HttpMethod::Get, "/posts", &["/posts"]);
        with_query.query_parameters = vec!["page".to_string(), "tag".to_string()];

        builder.add_route(&with_query, &TsTypeConverter);
        let document = builder.build();

        let operation = document.paths["/posts"].get.as_ref().unwrap();
        let parameters = operation.parameters.as_ref().unwrap();

        assert_eq!(parameters.len(), 2);
        assert_eq!(parameters[0].name, "page");
        assert_eq!(parameters[0].location, "query");
        assert_eq!(parameters[0].schema, Schema::of_type("string"));
        assert!(!parameters[0].required);
    }

    #[test]
    fn test_request_body_present_iff_body_type() {
        let mut builder = OpenApiBuilder::new();
        let mut with_body = route(HttpMethod::Post, "/users", &["/users"]);
        with_body.body_type = Some("{ name: string }".to_string());

        builder.add_route(&with_body, &TsTypeConverter);
        builder.add_route(&route(HttpMethod::Put, "/users", &["/users"]), &TsTypeConverter);

        let document = builder.build();
        let path_item = &document.paths["/users"];

        let post = path_item.post.as_ref().unwrap();
        let body = post.request_body.as_ref().unwrap();
        assert!(body.required);
        let media = &body.content["application/json"];
        assert!(media.schema.properties.as_ref().unwrap().contains_key("name"));

        assert!(path_item.put.as_ref().unwrap().request_body.is_none());
    }

    #[test]
    fn test_response_content_absent_for_unknown_return_type() {
        let mut builder = OpenApiBuilder::new();
        builder.add_route(&route(HttpMethod::Delete, "/users", &["/users"]), &TsTypeConverter);

        let document = builder.build();

        let operation = document.paths["/users"].delete.as_ref().unwrap();
        let response = &operation.responses["200"];
        assert_eq!(response.description, "Successful response");
        assert!(response.content.is_none());
    }

    #[test]
    fn test_response_content_from_inferred_type() {
        let mut builder = OpenApiBuilder::new();
        let mut typed = route(HttpMethod::Get, "/users", &["/users"]);
        typed.return_type = "{ ok: boolean }".to_string();

        builder.add_route(&typed, &TsTypeConverter);
        let document = builder.build();

        let operation = document.paths["/users"].get.as_ref().unwrap();
        let content = operation.responses["200"].content.as_ref().unwrap();
        let schema = &content["application/json"].schema;

        assert_eq!(schema.schema_type.as_deref(), Some("object"));
        assert_eq!(
            schema.properties.as_ref().unwrap()["ok"],
            Schema::of_type("boolean")
        );
    }

    #[test]
    fn test_with_info() {
        let builder = OpenApiBuilder::new().with_info(
            "My API".to_string(),
            "2.0.0".to_string(),
            Some("Custom description".to_string()),
        );
        let document = builder.build();

        assert_eq!(document.openapi, "3.0.0");
        assert_eq!(document.info.title, "My API");
        assert_eq!(document.info.version, "2.0.0");
        assert_eq!(document.info.description, Some("Custom description".to_string()));
    }

    #[test]
    fn test_add_route_map_covers_every_route() {
        use std::path::PathBuf;

        let mut routes = RouteMap::new();
        let mut table = crate::route_map::MethodTable::new();
        table.insert(HttpMethod::Get, route(HttpMethod::Get, "/users", &["/users"]));
        table.insert(HttpMethod::Post, route(HttpMethod::Post, "/users", &["/users"]));
        routes.insert(PathBuf::from("/app/src/routes/users/+server.ts"), table);

        let mut builder = OpenApiBuilder::new();
        builder.add_route_map(&routes, &TsTypeConverter);
        let document = builder.build();

        let path_item = &document.paths["/users"];
        assert!(path_item.get.is_some());
        assert!(path_item.post.is_some());
    }
}
