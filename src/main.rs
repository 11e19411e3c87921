//! facet CLI - Command line interface for facet_db
//!
//! Provides commands for managing record tables in a store file from the
//! command line.

use clap::{Parser, Subcommand};
use facet_db::{FieldValue, KvStore, Record};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "facet")]
#[command(about = "An embedded key-value table of field-structured records")]
#[command(version)]
struct Cli {
    /// Path to the store file
    #[arg(short, long, default_value = "data.facet")]
    database: PathBuf,

    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new store file
    Init,

    /// Insert a record, replacing any existing one under the key
    Insert {
        /// Table name
        table: String,
        /// Record key
        key: String,
        /// Fields as name=value pairs (int, float, bool inferred; else text)
        #[arg(required = true)]
        fields: Vec<String>,
    },

    /// Merge fields into the record under the key
    Update {
        /// Table name
        table: String,
        /// Record key
        key: String,
        /// Fields as name=value pairs (int, float, bool inferred; else text)
        #[arg(required = true)]
        fields: Vec<String>,
    },

    /// Read a record
    Get {
        /// Table name
        table: String,
        /// Record key
        key: String,
        /// Comma-separated field names to read (default: all)
        #[arg(short = 'F', long, value_delimiter = ',')]
        fields: Vec<String>,
    },

    /// Remove a record
    Erase {
        /// Table name
        table: String,
        /// Record key
        key: String,
    },

    /// List the keys in a table
    Keys {
        /// Table name
        table: String,
    },

    /// List all tables in the store
    Tables,

    /// Destroy a table and every record it contains
    Destroy {
        /// Table name
        table: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            let kv = KvStore::create(&cli.database)?;
            kv.sync()?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "message": format!("Created store at {}", cli.database.display())
                }),
            );
        }

        Commands::Insert { table, key, fields } => {
            let kv = KvStore::open_or_create(&cli.database)?;
            let record = parse_fields(&fields)?;
            kv.table(&table)?.insert(&key, record)?;
            kv.sync()?;
            output(
                &cli.format,
                &serde_json::json!({ "status": "ok", "key": key }),
            );
        }

        Commands::Update { table, key, fields } => {
            let kv = KvStore::open_or_create(&cli.database)?;
            let record = parse_fields(&fields)?;
            kv.table(&table)?.update(&key, record)?;
            kv.sync()?;
            output(
                &cli.format,
                &serde_json::json!({ "status": "ok", "key": key }),
            );
        }

        Commands::Get { table, key, fields } => {
            let kv = KvStore::open(&cli.database)?;
            let names: Vec<&str> = fields.iter().map(String::as_str).collect();
            match kv.table(&table)?.read_fields(&key, &names) {
                Ok(record) => {
                    output(
                        &cli.format,
                        &serde_json::json!({
                            "key": key,
                            "fields": record_to_json(&record)
                        }),
                    );
                }
                Err(facet_db::Error::KeyNotFound(_)) => {
                    output(
                        &cli.format,
                        &serde_json::json!({
                            "status": "error",
                            "message": format!("Key not found: {}", key)
                        }),
                    );
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Erase { table, key } => {
            let kv = KvStore::open(&cli.database)?;
            kv.table(&table)?.erase(&key)?;
            kv.sync()?;
            output(
                &cli.format,
                &serde_json::json!({ "status": "ok", "key": key }),
            );
        }

        Commands::Keys { table } => {
            let kv = KvStore::open(&cli.database)?;
            let keys = kv.table(&table)?.keys()?;
            output(
                &cli.format,
                &serde_json::json!({ "table": table, "keys": keys }),
            );
        }

        Commands::Tables => {
            let kv = KvStore::open(&cli.database)?;
            output(
                &cli.format,
                &serde_json::json!({ "tables": kv.table_names()? }),
            );
        }

        Commands::Destroy { table } => {
            let kv = KvStore::open(&cli.database)?;
            kv.table(&table)?.destroy()?;
            kv.sync()?;
            output(
                &cli.format,
                &serde_json::json!({ "status": "ok", "table": table }),
            );
        }
    }

    Ok(())
}

/// Parse name=value arguments into a record
///
/// Values that parse as an integer, float, or boolean get the matching
/// type; everything else is stored as text.
fn parse_fields(args: &[String]) -> anyhow::Result<Record> {
    let mut record = Record::new();
    for arg in args {
        let (name, value) = arg
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Expected name=value, got: {}", arg))?;
        record.set(name, parse_value(value));
    }
    Ok(record)
}

fn parse_value(value: &str) -> FieldValue {
    if let Ok(int) = value.parse::<i64>() {
        return FieldValue::Int(int);
    }
    if let Ok(float) = value.parse::<f64>() {
        return FieldValue::Float(float);
    }
    match value {
        "true" => FieldValue::Bool(true),
        "false" => FieldValue::Bool(false),
        other => FieldValue::Text(other.to_string()),
    }
}

fn record_to_json(record: &Record) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = record
        .iter()
        .map(|(name, value)| (name.to_string(), field_to_json(value)))
        .collect();
    serde_json::Value::Object(map)
}

fn field_to_json(value: &FieldValue) -> serde_json::Value {
    match value {
        FieldValue::Bytes(b) => serde_json::json!({ "hex": hex::encode(b) }),
        FieldValue::Text(s) => serde_json::json!(s),
        FieldValue::Int(v) => serde_json::json!(v),
        FieldValue::Float(v) => serde_json::json!(v),
        FieldValue::Bool(v) => serde_json::json!(v),
    }
}

fn output(format: &OutputFormat, value: &serde_json::Value) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(value).unwrap());
        }
        OutputFormat::Text => {
            println!("{}", serde_json::to_string_pretty(value).unwrap());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_inference() {
        assert_eq!(parse_value("42"), FieldValue::Int(42));
        assert_eq!(parse_value("-7"), FieldValue::Int(-7));
        assert_eq!(parse_value("2.5"), FieldValue::Float(2.5));
        assert_eq!(parse_value("true"), FieldValue::Bool(true));
        assert_eq!(parse_value("false"), FieldValue::Bool(false));
        assert_eq!(
            parse_value("hello"),
            FieldValue::Text("hello".to_string())
        );
    }

    #[test]
    fn test_parse_fields() {
        let record =
            parse_fields(&["name=alice".to_string(), "age=30".to_string()]).unwrap();
        assert_eq!(record.get("name").unwrap().as_text().unwrap(), "alice");
        assert_eq!(record.get("age").unwrap().as_int().unwrap(), 30);

        assert!(parse_fields(&["broken".to_string()]).is_err());
    }

    #[test]
    fn test_value_with_equals_sign() {
        let record = parse_fields(&["note=a=b".to_string()]).unwrap();
        assert_eq!(record.get("note").unwrap().as_text().unwrap(), "a=b");
    }
}
