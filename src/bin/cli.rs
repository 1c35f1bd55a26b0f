//! PropKV CLI
//!
//! Command-line interface for inspecting and editing a file-backed store.

use clap::{Parser, Subcommand};
use propkv::store::DynStore;
use propkv::{Config, Value};
use tracing_subscriber::{fmt, EnvFilter};

/// PropKV CLI
#[derive(Parser, Debug)]
#[command(name = "propkv-cli")]
#[command(about = "CLI for PropKV chunked values and linked arrays")]
#[command(version)]
struct Args {
    /// Snapshot file
    #[arg(short, long, default_value = "./propkv.db")]
    data: String,

    /// Namespace path (e.g. "app/users")
    #[arg(short, long, default_value = "")]
    namespace: String,

    /// Per-key byte ceiling
    #[arg(short, long, default_value = "32767")]
    limit: usize,

    /// Serve repeated reads from a cache
    #[arg(long)]
    cache: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a value (JSON, or plain text)
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a value or array
    Del {
        /// The key to delete
        key: String,
    },

    /// Append to an array
    Push {
        key: String,
        value: String,

        /// Prepend instead of append
        #[arg(long)]
        left: bool,
    },

    /// Remove from the end of an array
    Pop {
        key: String,

        /// Pop from the front instead
        #[arg(long)]
        left: bool,
    },

    /// Print every element of an array
    List {
        key: String,
    },

    /// Print the number of elements of an array
    Len {
        key: String,
    },

    /// List logical keys in the namespace
    Keys,

    /// Print backend byte usage
    Usage,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,propkv=info"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    let config = Config::builder()
        .data_path(&args.data)
        .namespace(&args.namespace)
        .value_size_limit(args.limit)
        .read_cache(args.cache)
        .build();

    let store = match DynStore::open(&config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&store, args.command) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(store: &DynStore, command: Commands) -> propkv::Result<()> {
    match command {
        Commands::Get { key } => match store.get(&key)? {
            Some(value) => println!("{}", value),
            None => println!("(nil)"),
        },
        Commands::Set { key, value } => {
            store.set_value(&key, &parse_value(&value))?;
            println!("OK");
        }
        Commands::Del { key } => {
            store.delete(&key)?;
            println!("OK");
        }
        Commands::Push { key, value, left } => {
            let value = parse_value(&value);
            let slot = if left {
                store.push_left(&key, &value)?
            } else {
                store.push_right(&key, &value)?
            };
            println!("slot {}", slot);
        }
        Commands::Pop { key, left } => {
            let popped = if left {
                store.pop_left(&key)?
            } else {
                store.pop_right(&key)?
            };
            match popped {
                Some(value) => println!("{}", value),
                None => println!("(empty)"),
            }
        }
        Commands::List { key } => {
            let mut cursor = store.head(&key)?;
            while let Some(c) = cursor {
                let value = c.value()?.unwrap_or(Value::Null);
                println!("[{}] {}", c.slot(), value);
                cursor = c.next()?;
            }
        }
        Commands::Len { key } => println!("{}", store.length(&key)?),
        Commands::Keys => {
            for key in store.keys()? {
                println!("{}", key);
            }
        }
        Commands::Usage => println!("{} bytes", store.usage()?),
    }
    Ok(())
}

/// Accept JSON, falling back to a plain string
fn parse_value(raw: &str) -> Value {
    propkv::codec::deserialize(raw)
}
