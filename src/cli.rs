use crate::config::GeneratorConfig;
use crate::manifest::{merge, ManifestParser};
use crate::metadata::Metadata;
use crate::openapi_builder::generate;
use crate::scanner::ManifestScanner;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::path::PathBuf;

/// Generate an OpenAPI document from reflected route and type metadata
#[derive(Parser, Debug)]
#[command(name = "openapi-from-metadata")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Manifest file, or directory of manifest fragments
    #[arg(value_name = "MANIFEST_PATH")]
    pub manifest_path: PathBuf,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Generator configuration file (YAML or JSON)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_path: Option<PathBuf>,

    /// Document title, overrides the configuration
    #[arg(long)]
    pub title: Option<String>,

    /// Document version, overrides the configuration
    #[arg(long = "api-version")]
    pub api_version: Option<String>,

    /// Directory used to resolve relative source file references
    #[arg(long, value_name = "DIR")]
    pub source_root: Option<PathBuf>,

    /// Only document routes matching this pattern (`prefix*` or exact, repeatable)
    #[arg(long = "include", value_name = "PATTERN")]
    pub include: Vec<String>,

    /// Skip routes matching this pattern (repeatable)
    #[arg(long = "exclude", value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Only document routes carrying this middleware tag (repeatable)
    #[arg(long = "middleware", value_name = "TAG")]
    pub middleware: Vec<String>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}

/// Validate and log already-parsed arguments
pub fn validate_args(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.manifest_path.exists() {
        bail!("Manifest path does not exist: {}", args.manifest_path.display());
    }
    if let Some(config) = &args.config_path {
        if !config.is_file() {
            bail!("Config file does not exist: {}", config.display());
        }
    }

    info!("Manifest path: {}", args.manifest_path.display());
    info!("Output format: {:?}", args.output_format);
    match &args.output_path {
        Some(output) => info!("Output file: {}", output.display()),
        None => info!("Output: stdout"),
    }

    Ok(args)
}

/// Configuration file (if any) with command line overrides applied
pub fn effective_config(args: &CliArgs) -> Result<GeneratorConfig> {
    let mut config = match &args.config_path {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };

    if let Some(title) = &args.title {
        config.info.title = title.clone();
    }
    if let Some(version) = &args.api_version {
        config.info.version = version.clone();
    }
    if args.source_root.is_some() {
        config.source_root = args.source_root.clone();
    }
    config.routes.include.extend(args.include.iter().cloned());
    config.routes.exclude.extend(args.exclude.iter().cloned());
    config.routes.middleware.extend(args.middleware.iter().cloned());

    Ok(config)
}

/// Scan, parse and merge every manifest under `args.manifest_path`
pub fn load_metadata(args: &CliArgs, config: &GeneratorConfig) -> Result<Metadata> {
    let scan_result = ManifestScanner::new(args.manifest_path.clone()).scan()?;
    info!("Found {} manifest files", scan_result.manifests.len());
    if scan_result.manifests.is_empty() {
        bail!("No manifest files found under {}", args.manifest_path.display());
    }

    let parser = ManifestParser::new().with_source_root(config.source_root.clone());
    let fragments: Vec<Metadata> = parser
        .parse_files(&scan_result.manifests)
        .into_iter()
        .filter_map(Result::ok)
        .collect();

    if fragments.is_empty() {
        bail!("No manifest could be parsed successfully");
    }
    info!("Parsed {} of {} manifests", fragments.len(), scan_result.manifests.len());

    Ok(merge(fragments))
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting OpenAPI document generation...");

    let config = effective_config(&args)?;
    let metadata = load_metadata(&args, &config)?;

    let routes_in_scope = config.routes.apply(&metadata.routes).len();
    info!(
        "{} of {} routes selected for documentation",
        routes_in_scope,
        metadata.routes.len()
    );
    if routes_in_scope == 0 {
        warn!("No routes to document");
    }

    let document = generate(&metadata, &config);

    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document)?,
        OutputFormat::Json => serialize_json(&document)?,
    };

    match &args.output_path {
        Some(output_path) => {
            write_to_file(&content, output_path)?;
            info!("Wrote OpenAPI document to {}", output_path.display());
        }
        None => println!("{}", content),
    }

    info!("Summary:");
    info!("  - Routes processed: {}", routes_in_scope);
    info!("  - Paths: {}", document.paths.len());
    info!("  - Operations: {}", document.operation_count());
    info!("  - Schemas: {}", document.components.schemas.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_overrides_apply_on_top_of_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(
            &config_path,
            "info:\n  title: From file\n  version: 0.1.0\nroutes:\n  include: [\"api/*\"]\n",
        )
        .unwrap();

        let args = CliArgs::parse_from([
            "openapi-from-metadata",
            temp_dir.path().to_str().unwrap(),
            "--config",
            config_path.to_str().unwrap(),
            "--api-version",
            "2.0.0",
            "--exclude",
            "api/internal/*",
        ]);
        let config = effective_config(&args).unwrap();

        assert_eq!(config.info.title, "From file");
        assert_eq!(config.info.version, "2.0.0");
        assert_eq!(config.routes.include, vec!["api/*".to_string()]);
        assert_eq!(config.routes.exclude, vec!["api/internal/*".to_string()]);
    }

    #[test]
    fn test_missing_manifest_path_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.json");
        let args = CliArgs::parse_from(["openapi-from-metadata", missing.to_str().unwrap()]);

        assert!(validate_args(args).is_err());
    }

    #[test]
    fn test_validate_args_checks_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = temp_dir.path().join("manifest.json");
        fs::write(&manifest, "{}").unwrap();
        let missing_config = temp_dir.path().join("missing.yaml");

        let args = CliArgs::parse_from(["openapi-from-metadata", manifest.to_str().unwrap()]);
        let validated = validate_args(args).unwrap();
        assert_eq!(validated.manifest_path, manifest);

        let args = CliArgs::parse_from([
            "openapi-from-metadata",
            manifest.to_str().unwrap(),
            "--config",
            missing_config.to_str().unwrap(),
        ]);
        assert!(validate_args(args).is_err());
    }

    #[test]
    fn test_run_writes_document() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = temp_dir.path().join("manifest.json");
        fs::write(
            &manifest,
            r#"{"routes": [{"uri": "api/health", "methods": ["GET"],
                            "controller": "HealthController", "action": "index"}]}"#,
        )
        .unwrap();
        let output = temp_dir.path().join("out/openapi.json");

        let args = CliArgs::parse_from([
            "openapi-from-metadata",
            manifest.to_str().unwrap(),
            "-f",
            "json",
            "-o",
            output.to_str().unwrap(),
        ]);
        run(args).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(
            value["paths"]["/api/health"]["get"]["operationId"],
            "HealthController.index"
        );
    }
}
