//! Figure Export CLI - inspection interface for the export bridge
//!
//! Commands: formats, parse, estimate, gate
//! Outputs JSON to stdout
//! Returns 2 when a request would be rejected

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use figure_export_core::{
    engine::EngineFormat, estimate, negotiate_format, request_fingerprint,
    version::resolve_profile, BridgeConfig, ExportFormat, ParseResponse, StatusCode,
    BRIDGE_VERSION,
};

#[derive(Parser)]
#[command(name = "figure-export-cli", version = BRIDGE_VERSION)]
#[command(about = "Figure Export CLI - validate export requests and engine capabilities")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a bridge config file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log at info level regardless of RUST_LOG
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List accepted export formats
    Formats,

    /// Parse an export request into its canonical form
    Parse {
        /// JSON request body
        #[arg(short, long)]
        payload: String,

        /// JSON options record (used with the {data, layout} shorthand)
        #[arg(short, long)]
        options: Option<String>,

        /// Pick the format from a content type when the request names none
        #[arg(short, long)]
        accept: Option<String>,

        /// Reject figures likely to hang the exporter
        #[arg(long)]
        safe_mode: bool,
    },

    /// Report the hang-risk estimate for a figure's data
    Estimate {
        /// JSON request body
        #[arg(short, long)]
        payload: String,
    },

    /// Resolve an engine version to its capability profile
    Gate {
        /// Version string reported by the charting engine
        #[arg(short, long)]
        engine_version: String,

        /// Export format to check
        #[arg(short, long, default_value = "png")]
        format: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => match BridgeConfig::load_from_file(path) {
            Ok(c) => c,
            Err(e) => {
                println!("{}", json!({"error": e.to_string()}));
                return ExitCode::FAILURE;
            }
        },
        None => BridgeConfig::default(),
    };

    match cli.command {
        Commands::Formats => {
            let formats: Vec<_> = ExportFormat::ALL
                .iter()
                .map(|f| json!({
                    "format": f.as_str(),
                    "contentType": f.content_type(),
                    "engineFormat": EngineFormat::for_export(*f).as_str(),
                }))
                .collect();
            print_json(&json!(formats));
            ExitCode::SUCCESS
        }

        Commands::Parse { payload, options, accept, safe_mode } => {
            let body = match read_json("payload", &payload) {
                Ok(v) => v,
                Err(code) => return code,
            };
            let mut options = match options.as_deref().map(|o| read_json("options", o)) {
                Some(Ok(v)) => v,
                Some(Err(code)) => return code,
                None => json!({}),
            };

            if let Some(content_type) = accept {
                match negotiate_format(&content_type) {
                    Ok(format) => apply_default_format(&body, &mut options, format),
                    Err(e) => {
                        print_json(&json!(ParseResponse::from(&e)));
                        return ExitCode::from(2);
                    }
                }
            }

            let outcome = figure_export_core::parse(&body, &options, safe_mode || config.safe_mode);
            let fingerprint = outcome.as_ref().ok().and_then(|r| request_fingerprint(r).ok());
            let response = ParseResponse::from(outcome);
            let accepted = response.code == StatusCode::Success.code();
            print_json(&json!({"response": response, "fingerprint": fingerprint}));
            if accepted {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }

        Commands::Estimate { payload } => {
            let body = match read_json("payload", &payload) {
                Ok(v) => v,
                Err(code) => return code,
            };
            let figure = body.get("figure").filter(|f| f.is_object()).unwrap_or(&body);
            let data = figure
                .get("data")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let report = estimate(data);
            print_json(&json!(report));
            if report.is_likely_to_hang() {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            }
        }

        Commands::Gate { engine_version, format } => {
            let Some(format) = ExportFormat::from_name(&format) else {
                println!("{}", json!({"error": format!("Unknown format: {format}")}));
                return ExitCode::FAILURE;
            };
            let profile = resolve_profile(&engine_version);
            let status = if !profile.is_supported() {
                StatusCode::UnsupportedEngineVersion
            } else if format == ExportFormat::Json && !profile.supports_full_data() {
                StatusCode::UnsupportedFormatForVersion
            } else {
                StatusCode::Success
            };
            print_json(&json!({
                "engineVersion": engine_version,
                "profile": profile,
                "format": format,
                "code": status.code(),
                "message": status.message(),
            }));
            if status == StatusCode::Success {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
    }
}

fn read_json(what: &str, raw: &str) -> Result<Value, ExitCode> {
    serde_json::from_str(raw).map_err(|e| {
        println!("{}", json!({"error": format!("Invalid {what}: {e}")}));
        ExitCode::FAILURE
    })
}

/// A negotiated content type only fills in a format the options left out.
fn apply_default_format(body: &Value, options: &mut Value, format: ExportFormat) {
    if body.get("figure").is_some() {
        tracing::warn!("--accept is ignored for requests carrying `figure`; set `format` there");
        return;
    }
    match options.as_object_mut() {
        Some(map) => {
            map.entry("format").or_insert_with(|| json!(format));
        }
        None => *options = json!({"format": format}),
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => println!("{}", json!({"error": e.to_string()})),
    }
}
