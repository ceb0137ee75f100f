mod error_presentation;

use std::{
    fs,
    io::{self, IsTerminal, Read},
    path::PathBuf,
    process::ExitCode,
};

use clap::{Args, Parser, Subcommand};
use error_presentation::{CliError, CliResult, render_runtime_error};
use quarry_core::{Binding, BindingType, ConnectionConfig, Dialect, Value};
use quarry_dialect_bigquery::{
    BigQueryDialect, KeywordEscaping, to_relational_type, to_warehouse_type,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "QUARRY_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";
const NULL_TYPE: &str = "null";

#[derive(Debug, Parser)]
#[command(name = "quarry", version, about = "Inspect warehouse SQL generated by quarry")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Translate generic SQL for one table and inline bound values.
    Translate(TranslateArgs),
    /// Print the relational type of each warehouse column type.
    Types(TypesArgs),
}

#[derive(Debug, Args)]
struct TranslateArgs {
    /// Connection config (YAML) supplying `projectId` and `dataSet`.
    #[arg(long, value_name = "PATH")]
    config: PathBuf,
    /// Table whose references are qualified.
    #[arg(long, value_name = "NAME")]
    table: String,
    /// Read SQL from a file instead of stdin.
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,
    /// Bind a placeholder, e.g. `--bind c0=string:O'Brien` or `--bind c1=null:`.
    #[arg(long = "bind", value_name = "NAME=TYPE:VALUE", value_parser = parse_binding)]
    bindings: Vec<Binding>,
    /// Also escape reserved words inside string literals.
    #[arg(long)]
    legacy_keywords: bool,
}

#[derive(Debug, Args)]
struct TypesArgs {
    #[arg(required = true, value_name = "TYPE")]
    types: Vec<String>,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            let code = error.exit_code();
            eprintln!("{}", render_runtime_error(error));
            ExitCode::from(code)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(command: Command) -> CliResult<String> {
    match command {
        Command::Translate(args) => translate(args),
        Command::Types(args) => Ok(describe_types(&args.types)),
    }
}

fn translate(args: TranslateArgs) -> CliResult<String> {
    let config = ConnectionConfig::from_path(&args.config)?;
    let table = config.table_ref(args.table.as_str())?;
    let sql = read_sql(args.file)?;

    let dialect = if args.legacy_keywords {
        BigQueryDialect::with_keyword_escaping(KeywordEscaping::Legacy)
    } else {
        BigQueryDialect::default()
    };
    debug!(
        table = %table,
        bindings = args.bindings.len(),
        escaping = ?dialect.keyword_escaping(),
        "translating SQL"
    );

    let mut output = dialect.prepare(sql.trim_end(), &table, &args.bindings);
    output.push('\n');
    Ok(output)
}

fn read_sql(file: Option<PathBuf>) -> CliResult<String> {
    let sql = match file {
        Some(path) => {
            fs::read_to_string(&path).map_err(|source| CliError::ReadFile { path, source })?
        }
        None => {
            let mut stdin = io::stdin();
            if stdin.is_terminal() {
                return Err(CliError::MissingSqlInput);
            }
            let mut sql = String::new();
            stdin
                .read_to_string(&mut sql)
                .map_err(CliError::ReadStdin)?;
            sql
        }
    };

    if sql.trim().is_empty() {
        return Err(CliError::MissingSqlInput);
    }
    Ok(sql)
}

fn describe_types(types: &[String]) -> String {
    types
        .iter()
        .map(|name| {
            let relational = to_relational_type(name);
            format!(
                "{name}\t{}\t{}\n",
                relational.as_str(),
                to_warehouse_type(relational)
            )
        })
        .collect()
}

/// Parses `NAME=TYPE:VALUE`. `null` as the type binds NULL.
fn parse_binding(raw: &str) -> Result<Binding, String> {
    let (name, typed) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=TYPE:VALUE, got `{raw}`"))?;
    let (ty, value) = typed
        .split_once(':')
        .ok_or_else(|| format!("expected TYPE:VALUE after `{name}=`, got `{typed}`"))?;
    let name = name.trim().trim_start_matches(':');
    if name.is_empty() {
        return Err(format!("binding `{raw}` has an empty placeholder name"));
    }

    if ty.eq_ignore_ascii_case(NULL_TYPE) {
        return Ok(Binding::new(name, Value::Null, BindingType::String));
    }

    let ty = BindingType::parse(ty);
    let value = match ty {
        BindingType::Integer => value
            .trim()
            .parse::<i64>()
            .map_or_else(|_| Value::from(value), Value::Int),
        BindingType::Float => value
            .trim()
            .parse::<f64>()
            .map_or_else(|_| Value::from(value), Value::Float),
        BindingType::String | BindingType::Boolean | BindingType::Other(_) => Value::from(value),
    };
    Ok(Binding::new(name, value, ty))
}
