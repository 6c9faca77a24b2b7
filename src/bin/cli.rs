//! k2hdkc CLI Client
//!
//! Issues single commands against a k2hdkc cluster.

use clap::{Parser, Subcommand};
use k2hdkc::{
    CasGet, CasValue, CasWidth, Client, ClientConfig, Command, K2hdkcError, QueuePop, QueuePush,
    Rename, Result,
};
use tracing_subscriber::{fmt, EnvFilter};

/// k2hdkc CLI
#[derive(Parser, Debug)]
#[command(name = "k2hdkc-cli")]
#[command(about = "CLI for the k2hdkc clustered key-value store")]
#[command(version)]
struct Args {
    /// chmpx slave configuration file
    #[arg(short, long)]
    conf: String,

    /// chmpx control port
    #[arg(short, long, default_value = "8031")]
    port: u16,

    /// Cluster unique key
    #[arg(long, default_value = "")]
    cuk: String,

    /// Native library soname or path
    #[arg(long, default_value = "libk2hdkc.so.0")]
    library: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        key: String,

        /// Encryption pass phrase
        #[arg(long)]
        pass: Option<String>,
    },

    /// Set a key-value pair
    Set {
        key: String,
        value: String,

        /// Expiry in seconds
        #[arg(long)]
        expire: Option<i64>,
    },

    /// Delete a key
    Del { key: String },

    /// Rename a key
    Rename {
        old: String,
        new: String,

        /// Parent key whose subkey list is updated
        #[arg(long)]
        parent: Option<String>,
    },

    /// List the subkeys of a key
    Subkeys { key: String },

    /// Replace the subkey list of a key
    SetSubkeys {
        key: String,

        #[arg(required = true)]
        subkeys: Vec<String>,
    },

    /// Show the attributes of a key
    Attrs { key: String },

    /// Read a CAS value
    CasGet {
        key: String,

        /// Value width in bits (8, 16, 32 or 64)
        #[arg(long, default_value = "64")]
        bits: u8,
    },

    /// Initialize a CAS value
    CasInit {
        key: String,

        #[arg(default_value = "0")]
        value: u64,

        /// Value width in bits (8, 16, 32 or 64)
        #[arg(long, default_value = "64")]
        bits: u8,
    },

    /// Increment a CAS value
    Incr { key: String },

    /// Decrement a CAS value
    Decr { key: String },

    /// Push a value onto a queue
    Push {
        prefix: String,
        value: String,

        /// Push onto the key queue with this key
        #[arg(long)]
        key: Option<String>,

        /// Push for LIFO order
        #[arg(long)]
        lifo: bool,
    },

    /// Pop a value from a queue
    Pop {
        prefix: String,

        /// Pop from the key queue
        #[arg(long)]
        key_queue: bool,

        /// Pop from the tail
        #[arg(long)]
        lifo: bool,
    },
}

fn cas_value(value: u64, width: CasWidth) -> Result<CasValue> {
    let out_of_range =
        || K2hdkcError::Config(format!("{value} does not fit in {} bits", width.bits()));
    Ok(match width {
        CasWidth::W8 => CasValue::U8(u8::try_from(value).map_err(|_| out_of_range())?),
        CasWidth::W16 => CasValue::U16(u16::try_from(value).map_err(|_| out_of_range())?),
        CasWidth::W32 => CasValue::U32(u32::try_from(value).map_err(|_| out_of_range())?),
        CasWidth::W64 => CasValue::U64(value),
    })
}

fn run(client: &Client, command: Commands) -> Result<()> {
    match command {
        Commands::Get { key, pass } => {
            let mut cmd = k2hdkc::Get::new(key)?;
            if let Some(pass) = pass {
                cmd.set_enc_pass(pass);
            }
            println!("{}", client.send(cmd)?.result().string());
        }
        Commands::Set { key, value, expire } => {
            let mut cmd = k2hdkc::Set::new(key, value)?;
            if let Some(secs) = expire {
                cmd.set_expire(secs);
            }
            client.send(cmd)?;
        }
        Commands::Del { key } => {
            client.remove(key)?;
        }
        Commands::Rename { old, new, parent } => {
            let mut cmd = Rename::new(old, new)?;
            if let Some(parent) = parent {
                cmd.set_parent_key(parent)?;
            }
            client.send(cmd)?;
        }
        Commands::Subkeys { key } => {
            for subkey in client.get_sub_keys(key)?.strings() {
                println!("{subkey}");
            }
        }
        Commands::SetSubkeys { key, subkeys } => {
            client.set_sub_keys(key, subkeys)?;
        }
        Commands::Attrs { key } => {
            let mut attrs: Vec<_> = client.get_attrs(key)?.to_string_map().into_iter().collect();
            attrs.sort();
            for (name, value) in attrs {
                println!("{name}={value}");
            }
        }
        Commands::CasGet { key, bits } => {
            let cmd = client.send(CasGet::with_width(key, CasWidth::from_bits(bits)?)?)?;
            if let Some(value) = cmd.result().as_u64() {
                println!("{value}");
            }
        }
        Commands::CasInit { key, value, bits } => {
            client.cas_init(key, cas_value(value, CasWidth::from_bits(bits)?)?)?;
        }
        Commands::Incr { key } => {
            client.cas_increment(key)?;
        }
        Commands::Decr { key } => {
            client.cas_decrement(key)?;
        }
        Commands::Push {
            prefix,
            value,
            key,
            lifo,
        } => {
            let mut cmd = QueuePush::new(prefix, value)?;
            cmd.use_fifo(!lifo);
            if let Some(key) = key {
                cmd.set_key(key)?;
            }
            client.send(cmd)?;
        }
        Commands::Pop {
            prefix,
            key_queue,
            lifo,
        } => {
            let mut cmd = QueuePop::with_key_queue(prefix, key_queue)?;
            cmd.use_fifo(!lifo);
            let item = client.send(cmd)?.into_result().into_payload();
            if key_queue {
                println!("{}\t{}", item.key_string(), item.value_string());
            } else {
                println!("{}", item.value_string());
            }
        }
    }
    Ok(())
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,k2hdkc=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    let config = ClientConfig::builder()
        .chmpx_file(&args.conf)
        .ctl_port(args.port)
        .cuk(&args.cuk)
        .library(&args.library)
        .build();

    let client = match Client::from_config(config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Failed to load k2hdkc: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&client, args.command) {
        match e.status() {
            Some(status) => eprintln!("{status}"),
            None => eprintln!("{e}"),
        }
        std::process::exit(1);
    }
}
