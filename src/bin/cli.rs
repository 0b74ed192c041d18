//! StrataKV CLI
//!
//! Command-line interface for a local StrataKV directory. Each invocation
//! opens the engine, runs one command, and closes it (flushing any writes).

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use stratakv::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// StrataKV CLI
#[derive(Parser, Debug)]
#[command(name = "stratakv")]
#[command(about = "Embedded LSM key-value store")]
#[command(version)]
struct Args {
    /// Data directory (created if missing)
    #[arg(short, long, default_value = "./stratakv_data")]
    data_dir: String,

    /// MemTable footprint in bytes that triggers a flush
    #[arg(short, long, default_value = "4194304")]
    flush_threshold: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Insert or overwrite a key
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// List live pairs in key order
    Scan {
        /// First key to include
        #[arg(long, default_value = "")]
        from: String,

        /// Stop after this many pairs
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show segment and memtable counters
    Stats,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stratakv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> stratakv::Result<()> {
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .create_if_missing(true)
        .flush_threshold(args.flush_threshold)
        .build();

    let mut engine = Engine::open(config)?;

    match args.command {
        Commands::Put { key, value } => engine.upsert(key.as_bytes(), value.as_bytes())?,
        Commands::Del { key } => engine.remove(key.as_bytes())?,
        Commands::Get { key } => match engine.get(key.as_bytes())? {
            Some(data) => println!("{}", String::from_utf8_lossy(&data)),
            None => println!("(nil)"),
        },
        Commands::Scan { from, limit } => {
            let scan = engine.iter(from.as_bytes())?;
            for pair in scan.take(limit.unwrap_or(usize::MAX)) {
                let (key, data) = pair?;
                println!(
                    "{}\t{}",
                    String::from_utf8_lossy(&key),
                    String::from_utf8_lossy(&data)
                );
            }
        }
        Commands::Stats => {
            println!("segments:        {}", engine.segment_count());
            println!("generations:     {:?}", engine.generations());
            println!("next generation: {}", engine.next_generation());
            println!("memtable keys:   {}", engine.memtable_entry_count());
            println!("memtable bytes:  {}", engine.memtable_size());
        }
    }

    engine.close()
}
