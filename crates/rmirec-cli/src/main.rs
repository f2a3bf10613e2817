//! Remote call recorder CLI.
//!
//! Provides the `rmirec` binary for working with packed call records:
//! `inspect` decodes a record, `generate` turns it into replay artifacts
//! and `list` shows artifacts persisted in a SQLite database.
//!
//! Uses the same [`Recorder`] pipeline as the HTTP server, so artifacts are
//! identical whichever entry point produced them.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde_json::json;

use rmirec_codegen::{annotate_remote_returns, GeneratedArtifacts, Recorder, RecorderOptions};
use rmirec_storage::{
    ArtifactSink, BincodePacker, CallRecord, InMemorySink, Outcome, SqliteSink, StorageError,
};

/// Remote call recorder tools.
#[derive(Parser)]
#[command(name = "rmirec", about = "Remote call recorder tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Decode a packed call record and describe it.
    Inspect {
        /// Path to the packed record file.
        file: PathBuf,
    },

    /// Generate replay artifacts from a packed call record.
    Generate {
        /// Path to the packed record file.
        file: PathBuf,

        /// Identity of the remote object the call was made against.
        #[arg(short, long)]
        target: String,

        /// Position of the call in its recording session.
        #[arg(short, long, default_value_t = 0)]
        index: u32,

        /// Recording run the call belongs to. Calls with equal target, method
        /// and index only share an artifact id within the same scope.
        #[arg(short, long, default_value = "")]
        scope: String,

        /// Scan the return value for remote references, naming them with
        /// this prefix.
        #[arg(short, long)]
        remote_prefix: Option<String>,

        /// Persist artifacts to this SQLite database instead of only printing them.
        #[arg(short, long)]
        db: Option<String>,

        /// JSON file with recorder options (missing keys use defaults).
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List artifacts persisted in a database.
    List {
        /// Path to the artifact database file.
        #[arg(short, long)]
        db: String,
    },
}

fn main() {
    // stdout carries the JSON results.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Inspect { file } => run_inspect(&file),
        Commands::Generate {
            file,
            target,
            index,
            scope,
            remote_prefix,
            db,
            config,
        } => run_generate(
            &file,
            &target,
            index,
            &scope,
            remote_prefix.as_deref(),
            db.as_deref(),
            config.as_deref(),
        ),
        Commands::List { db } => run_list(&db),
    };
    process::exit(exit_code);
}

/// Reads and decodes a packed record.
///
/// Errors carry the exit code: 1 for undecodable input, 3 for I/O.
fn load_record(file: &Path) -> Result<CallRecord, i32> {
    let bytes = std::fs::read(file).map_err(|e| {
        eprintln!("Error: failed to read '{}': {}", file.display(), e);
        3
    })?;
    CallRecord::unpack(&bytes, &BincodePacker).map_err(|e| {
        report_decode_error(&e);
        1
    })
}

fn report_decode_error(err: &StorageError) {
    if err.is_framing() {
        eprintln!("Error: not a valid call record frame: {}", err);
    } else if err.is_corruption() {
        eprintln!("Error: call record data is corrupt: {}", err);
    } else {
        eprintln!("Error: failed to decode call record: {}", err);
    }
}

/// Execute the inspect subcommand.
///
/// Returns exit code: 0 = success, 1 = decode error, 3 = I/O error.
fn run_inspect(file: &Path) -> i32 {
    let record = match load_record(file) {
        Ok(record) => record,
        Err(code) => return code,
    };

    let outcome = match record.outcome() {
        Some(Outcome::Returned(_)) => "returned",
        Some(Outcome::Thrown(_)) => "thrown",
        None => "pending",
    };
    let summary = json!({
        "method_name": record.method_name(),
        "mangled_signature": record.mangled_signature(),
        "outcome": outcome,
        "argument_count": record.arguments().map(|args| args.len()).unwrap_or(0),
        "packed_argument_bytes": record.packed_arguments().len(),
    });
    print_json(&summary);
    0
}

/// Execute the generate subcommand.
///
/// Returns exit code: 0 = success, 1 = decode or generation error,
/// 3 = I/O or storage error.
fn run_generate(
    file: &Path,
    target: &str,
    index: u32,
    scope: &str,
    remote_prefix: Option<&str>,
    db: Option<&str>,
    config: Option<&Path>,
) -> i32 {
    let options = match config.map(load_options).transpose() {
        Ok(options) => options.unwrap_or_default(),
        Err(code) => return code,
    };
    let mut record = match load_record(file) {
        Ok(record) => record.with_origin(index, target).with_scope(scope),
        Err(code) => return code,
    };

    if let Some(prefix) = remote_prefix {
        if let Err(e) = annotate_remote_returns(&mut record, prefix) {
            eprintln!("Error: failed to scan return value: {}", e);
            return 1;
        }
    }

    let mut sink: Box<dyn ArtifactSink> = match db {
        Some(path) => match SqliteSink::new(path) {
            Ok(sink) => Box::new(sink),
            Err(e) => {
                eprintln!("Error: failed to open database '{}': {}", path, e);
                return 3;
            }
        },
        None => Box::new(InMemorySink::new()),
    };

    let recorder = Recorder::new(options);
    match recorder.record_call(&record, sink.as_mut()) {
        Ok(artifacts) => {
            print_json(&artifacts_json(&artifacts));
            0
        }
        Err(rmirec_codegen::CodegenError::Storage(e)) => {
            eprintln!("Storage error: {}", e);
            3
        }
        Err(e) => {
            eprintln!("Generation error: {}", e);
            1
        }
    }
}

/// Execute the list subcommand.
///
/// Returns exit code: 0 = success, 3 = storage error.
fn run_list(db: &str) -> i32 {
    let sink = match SqliteSink::new(db) {
        Ok(sink) => sink,
        Err(e) => {
            eprintln!("Error: failed to open database '{}': {}", db, e);
            return 3;
        }
    };
    match sink.list_artifacts() {
        Ok(artifacts) => {
            print_json(&json!(artifacts));
            0
        }
        Err(e) => {
            eprintln!("Error: failed to list artifacts: {}", e);
            3
        }
    }
}

fn load_options(path: &Path) -> Result<RecorderOptions, i32> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        eprintln!("Error: failed to read config '{}': {}", path.display(), e);
        3
    })?;
    serde_json::from_str(&text).map_err(|e| {
        eprintln!("Error: invalid config '{}': {}", path.display(), e);
        1
    })
}

fn artifacts_json(artifacts: &GeneratedArtifacts) -> serde_json::Value {
    json!({
        "sampler": artifacts.sampler,
        "post_processor": artifacts.post_processor,
    })
}

fn print_json(value: &serde_json::Value) {
    let text = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize result: {}\"}}", e));
    println!("{}", text);
}
