//! hyperdoc CLI
//!
//! Command-line interface for processing JSON Hyper-Schema documents
//! into documentation-ready form.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use hyperdoc::{
    extract_ldo, load_schema, load_schema_auto, process_api_doc, LinkQuery, TransformOptions,
};

#[derive(Parser)]
#[command(name = "hyperdoc")]
#[command(about = "Process JSON Hyper-Schema documents for API documentation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full documentation pipeline over a schema document
    Process {
        /// Schema source: file path or URL (http:// or https://)
        schema: String,

        /// Absolute URI prefix for example request URLs; should end
        /// in "/" while link hrefs should not begin with one
        #[arg(long)]
        base_uri: Option<String>,

        /// File containing a header schema whose "example" supplies
        /// default request headers for every link
        #[arg(long)]
        global_headers: Option<PathBuf>,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Look up a single Link Description Object by title, rel, or method
    Link {
        /// Schema source: file path or URL (http:// or https://)
        schema: String,

        /// Match on the link's title (case-insensitive)
        #[arg(long)]
        title: Option<String>,

        /// Match on the link's rel (case-insensitive)
        #[arg(long)]
        rel: Option<String>,

        /// Match on the link's method; links without one count as GET
        #[arg(long)]
        method: Option<String>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Process {
            schema,
            base_uri,
            global_headers,
            output,
            pretty,
        } => run_process(&schema, base_uri, global_headers, output, pretty),

        Commands::Link {
            schema,
            title,
            rel,
            method,
            pretty,
        } => run_link(&schema, title, rel, method, pretty),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_process(
    schema_source: &str,
    base_uri: Option<String>,
    global_headers: Option<PathBuf>,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    let mut schema = load_schema_auto(schema_source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let mut options = TransformOptions::new();
    if let Some(base_uri) = base_uri {
        options = options.base_uri(base_uri);
    }
    if let Some(path) = global_headers {
        let headers = load_schema(&path).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;
        options = options.global_header_schema(headers);
    }

    process_api_doc(&mut schema, &options).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    write_json(&schema, output, pretty)
}

fn run_link(
    schema_source: &str,
    title: Option<String>,
    rel: Option<String>,
    method: Option<String>,
    pretty: bool,
) -> Result<(), u8> {
    let schema = load_schema_auto(schema_source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let mut query = LinkQuery::new();
    if let Some(title) = title {
        query = query.title(title);
    }
    if let Some(rel) = rel {
        query = query.rel(rel);
    }
    if let Some(method) = method {
        query = query.method(method);
    }

    let ldo = extract_ldo(&query, &schema).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    write_json(ldo, None, pretty)
}

fn write_json(
    value: &serde_json::Value,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    let json_output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}
