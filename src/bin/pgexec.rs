use clap::{Parser, Subcommand};
use tracing::Level;

use pgexec::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run SQL through the pgexec executor")]
struct Args {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,
    /// Log every forwarded call
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute a statement and print the number of affected rows
    Exec {
        sql: String,
        /// Bound to $1, $2, ... in order
        #[arg(long = "param", short)]
        params: Vec<String>,
    },
    /// Run a query and print each row, tab separated
    Query {
        sql: String,
        #[arg(long = "param", short)]
        params: Vec<String>,
    },
    /// Print the SQL literal of each value without connecting
    Literal { values: Vec<String> },
}

/// `null`, booleans, integers, and floats are recognized; anything else is text.
/// Spelled-out float specials (`inf`, `NaN`) stay text.
fn parse_value(raw: &str) -> RowValues {
    if raw.eq_ignore_ascii_case("null") {
        return RowValues::Null;
    }
    if let Ok(b) = raw.parse::<bool>() {
        return RowValues::Bool(b);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return RowValues::Int(i);
    }
    if raw.bytes().any(|b| b.is_ascii_digit())
        && let Ok(f) = raw.parse::<f64>()
    {
        return RowValues::Float(f);
    }
    RowValues::Text(raw.to_string())
}

fn display_value(value: &RowValues) -> String {
    match value {
        RowValues::Timestamp(ts) => ts.to_string(),
        RowValues::Date(day) => day.to_string(),
        RowValues::TextArray(items) => {
            let shown: Vec<String> = items
                .iter()
                .map(|item| item.as_deref().map_or_else(|| "NULL".to_string(), |text| serialize(text)))
                .collect();
            format!("{{{}}}", shown.join(","))
        }
        RowValues::JSON(json) => json.to_string(),
        RowValues::Blob(bytes) => {
            let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
            format!("\\x{hex}")
        }
        other => serialize(other),
    }
}

fn bind(raw: &[String]) -> Vec<RowValues> {
    let mut serializer = Serializer::new();
    for value in raw {
        serializer.add(parse_value(value));
    }
    serializer.into_params()
}

async fn run(args: Args) -> Result<(), PgExecError> {
    let database_url = || {
        args.database_url.clone().ok_or_else(|| {
            PgExecError::ConfigError("--database-url or DATABASE_URL is required".to_string())
        })
    };

    match &args.command {
        Command::Literal { values } => {
            for value in values {
                println!("{}", serialize(parse_value(value)));
            }
        }
        Command::Exec { sql, params } => {
            let mut executor = Executor::new(&database_url()?).await?;
            let affected = executor.exec(sql, &bind(params)).await;
            executor.close().await?;
            println!("{}", affected?);
        }
        Command::Query { sql, params } => {
            let mut executor = Executor::new(&database_url()?).await?;
            let mut rows = executor.query(sql, &bind(params)).await?;
            while rows.next().await {
                if let Some(row) = rows.current_row() {
                    let line: Vec<String> = row.iter().map(display_value).collect();
                    println!("{}", line.join("\t"));
                }
            }
            let iteration = rows.err().map(ToString::to_string);
            rows.close()?;
            executor.close().await?;
            if let Some(message) = iteration {
                return Err(PgExecError::ExecutionError(message));
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(level)
        .init();

    if let Err(err) = run(args).await {
        tracing::error!("{err}");
        std::process::exit(1);
    }
}
