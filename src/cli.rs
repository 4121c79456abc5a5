use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::path::PathBuf;

/// SvelteKit OpenAPI Generator - derive OpenAPI documentation and a typed
/// client from your server routes
#[derive(Parser, Debug)]
#[command(name = "openapi-from-routes")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the SvelteKit project directory
    #[arg(value_name = "PROJECT_PATH")]
    pub project_path: PathBuf,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path for the OpenAPI document (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Output file path for the generated TypeScript client
    #[arg(short = 'c', long = "client", value_name = "FILE")]
    pub client_path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    // Validate project path exists
    if !args.project_path.exists() {
        anyhow::bail!(
            "Project path does not exist: {}",
            args.project_path.display()
        );
    }

    // Validate project path is a directory
    if !args.project_path.is_dir() {
        anyhow::bail!(
            "Project path is not a directory: {}",
            args.project_path.display()
        );
    }

    info!("Project path: {}", args.project_path.display());
    info!("Output format: {:?}", args.output_format);
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }
    if let Some(ref client) = args.client_path {
        info!("Client file: {}", client.display());
    }

    Ok(args)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    use crate::client_generator::generate_api_client;
    use crate::openapi_builder::OpenApiBuilder;
    use crate::route_map::RouteMapBuilder;
    use crate::schema_generator::TsTypeConverter;
    use crate::serializer::{serialize_json, serialize_yaml, write_to_file};

    info!("Starting OpenAPI document generation...");

    // Step 1: Discover and analyze route files into the route map. Any
    // scan-fatal or file-fatal condition aborts here, before generation.
    info!("Building route map...");
    let routes = RouteMapBuilder::new(args.project_path.clone()).build()?;

    let route_count: usize = routes.values().map(|table| table.len()).sum();
    info!(
        "Route map holds {} routes across {} files",
        route_count,
        routes.len()
    );

    if routes.is_empty() {
        log::warn!("No route handlers found in the project");
    }

    // Step 2: Build the OpenAPI document from the route map.
    info!("Building OpenAPI document...");
    let converter = TsTypeConverter;
    let mut builder = OpenApiBuilder::new();
    builder.add_route_map(&routes, &converter);
    let document = builder.build();

    // Step 3: Produce every artifact in memory before writing anything, so
    // a failed pass leaves existing artifacts untouched.
    info!("Serializing to {:?} format...", args.output_format);
    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document)?,
        OutputFormat::Json => serialize_json(&document)?,
    };

    let client = args
        .client_path
        .as_ref()
        .map(|_| generate_api_client(&routes));

    // Step 4: Write outputs.
    if let Some(output_path) = &args.output_path {
        write_to_file(&content, output_path)?;
        info!("Wrote OpenAPI document to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    if let (Some(client_path), Some(client)) = (&args.client_path, client) {
        write_to_file(&client, client_path)?;
        info!("Wrote API client to {}", client_path.display());
    }

    // Step 5: Display summary
    info!("Generation complete!");
    info!("Summary:");
    info!("  - Files with routes: {}", routes.len());
    info!("  - Routes found: {}", route_count);
    info!("  - Paths documented: {}", document.paths.len());

    Ok(())
}
