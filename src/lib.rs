//! SvelteKit OpenAPI Generator - automatic OpenAPI documentation and typed
//! clients from SvelteKit server routes.
//!
//! This library statically analyzes the `+server.ts` files of a SvelteKit
//! project and derives a normalized route model: HTTP method, expanded URL
//! templates, inferred response types, query-parameter usage and
//! documentation. The model feeds an OpenAPI 3.0 document builder and a
//! TypeScript client generator. No analyzed code is ever executed.
//!
//! # Architecture
//!
//! The library is organized into several modules that work together:
//!
//! 1. [`scanner`] - Recursively scans the project directory for route files
//! 2. [`parser`] - Parses TypeScript route files into syntax trees
//! 3. [`routing`] - Translates file paths into canonical route paths and
//!    expands optional dynamic segments into URL templates
//! 4. [`analyzer`] - Analyzes exported handler declarations: response type
//!    inference, query-parameter usage, declared signatures
//! 5. [`docs`] - Associates JSDoc blocks with handlers and extracts `@body`
//!    tags and free-text documentation
//! 6. [`route_map`] - Orchestrates analysis into the aggregate route map
//! 7. [`schema_generator`] - Converts extracted type texts to OpenAPI schemas
//! 8. [`openapi_builder`] - Constructs the complete OpenAPI document
//! 9. [`client_generator`] - Emits a typed TypeScript API client
//! 10. [`serializer`] - Serializes the document to YAML or JSON
//!
//! # Example Usage
//!
//! ```no_run
//! use openapi_from_routes::{
//!     client_generator::generate_api_client,
//!     openapi_builder::OpenApiBuilder,
//!     route_map::RouteMapBuilder,
//!     schema_generator::TsTypeConverter,
//!     serializer::serialize_yaml,
//! };
//! use std::path::PathBuf;
//!
//! // Build the route map for a project
//! let routes = RouteMapBuilder::new(PathBuf::from("./my-app")).build().unwrap();
//!
//! // Build the OpenAPI document
//! let mut builder = OpenApiBuilder::new();
//! builder.add_route_map(&routes, &TsTypeConverter);
//! let document = builder.build();
//!
//! // Serialize to YAML
//! let yaml = serialize_yaml(&document).unwrap();
//! println!("{}", yaml);
//!
//! // Emit the typed client
//! let client = generate_api_client(&routes);
//! println!("{}", client);
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module which provides a complete
//! CLI application.

pub mod analyzer;
pub mod cli;
pub mod client_generator;
pub mod docs;
pub mod error;
pub mod openapi_builder;
pub mod parser;
pub mod route_map;
pub mod routing;
pub mod scanner;
pub mod schema_generator;
pub mod serializer;
