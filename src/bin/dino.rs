//! dino — The Dino CLI
//!
//! Runs Dino queries against JSON data described by a `dino.toml` schema.
//!
//! # Usage
//!
//! ```bash
//! # Execute a query
//! dino "SELECT * FROM users WHERE Age > 18 ORDER BY Name" -d shop.json
//!
//! # With parameters
//! dino "SELECT * FROM users WHERE Age > @min" -p min=21
//!
//! # Show the lowered predicate
//! dino explain "SELECT * FROM users u JOIN orders o ON u.Id = o.UserId WHERE o.TotalAmount > 100"
//! ```

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use dino::prelude::*;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dino")]
#[command(version)]
#[command(about = "Dino: SQL-like queries over typed records", long_about = None)]
#[command(after_help = "EXAMPLES:
    dino 'SELECT * FROM users WHERE Age > 18' -d shop.json
    dino 'SELECT * FROM users WHERE Name LIKE @p' -p p=J%
    dino explain 'SELECT * FROM products WHERE Price BETWEEN 10 AND 20'")]
struct Cli {
    /// The query to execute
    query: Option<String>,

    /// Path to dino.toml (default: ./dino.toml, then the user config dir)
    #[arg(short, long, env = "DINO_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// JSON data file; overrides `data` from the config
    #[arg(short, long, env = "DINO_DATA")]
    data: Option<PathBuf>,

    /// Parameter binding name=value (repeatable)
    #[arg(short, long = "param", value_name = "NAME=VALUE", global = true)]
    param: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the token stream of a query
    Tokens { query: String },
    /// Print the parsed AST as JSON
    Ast { query: String },
    /// Re-serialize a query
    Fmt { query: String },
    /// Show the compiled filter and sort keys
    Explain {
        query: String,
        /// Compile against this entity instead of the FROM table
        #[arg(short, long)]
        entity: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("{} {}", "Error:".red().bold(), e);
    }

    let result = match &cli.command {
        Some(Commands::Tokens { query }) => show_tokens(query),
        Some(Commands::Ast { query }) => show_ast(query, &cli),
        Some(Commands::Fmt { query }) => format_query(query, &cli),
        Some(Commands::Explain { query, entity }) => explain_query(query, entity.as_deref(), &cli),
        None => match &cli.query {
            Some(query) => execute_query(query, &cli),
            None => {
                println!("{}", "Dino — SQL-like queries over typed records".cyan().bold());
                println!();
                println!("Usage: dino <QUERY> [OPTIONS]");
                println!();
                println!("Try: dino --help");
                Ok(())
            }
        },
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(snippet) = e.downcast_ref::<DinoError>().and_then(DinoError::snippet) {
            eprintln!("{}", snippet.yellow());
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let directive = if verbose { "dino=debug" } else { "dino=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn execute_query(query: &str, cli: &Cli) -> Result<()> {
    if cli.verbose {
        println!("{} {}", "Input:".dimmed(), query.yellow());
    }

    let config = load_config(cli.config.as_deref())?;
    let catalog = load_catalog(config, cli.data.as_deref())?;
    let params = parse_params(&cli.param)?;

    let result = catalog.execute_with_params(query, &params)?;
    for key in &result.dropped {
        println!("{} ORDER BY {} ignored", "⚠".yellow(), key.yellow());
    }

    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result.to_json())?);
        }
        OutputFormat::Table => print_table(&catalog, &result),
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<DinoConfig> {
    match DinoConfig::discover(path)? {
        Some(config) => Ok(config),
        None => bail!("dino.toml not found. Pass --config or create ./dino.toml"),
    }
}

fn load_catalog(config: DinoConfig, data: Option<&Path>) -> Result<Catalog> {
    let mut catalog = Catalog::new(config.schema);
    let data = data.map(Path::to_path_buf).or(config.data);
    if let Some(path) = data {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read data file {}", path.display()))?;
        let json: serde_json::Value = serde_json::from_str(&content)?;
        let loaded = catalog.load_json(&json)?;
        tracing::info!(path = %path.display(), rows = loaded, "loaded data");
    }
    Ok(catalog)
}

/// `name=value`; the value is typed by its text.
fn parse_params(raw: &[String]) -> Result<Parameters> {
    let mut params = Parameters::new();
    for binding in raw {
        let Some((name, value)) = binding.split_once('=') else {
            bail!("Invalid parameter '{}': expected NAME=VALUE", binding);
        };
        let name = name.trim().trim_start_matches('@');
        params.insert(name.to_string(), parse_value(value));
    }
    Ok(params)
}

fn parse_value(text: &str) -> Value {
    if let Ok(n) = text.parse::<i32>() {
        return Value::Int(n);
    }
    if let Ok(n) = text.parse::<i64>() {
        return Value::Long(n);
    }
    if text.contains('.') {
        if let Ok(n) = Decimal::from_str(text) {
            return Value::Decimal(n);
        }
    }
    match text.to_ascii_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        _ => Value::from(text),
    }
}

fn print_table(catalog: &Catalog, result: &ResultSet) {
    if result.is_empty() {
        println!("{}", "(no results)".dimmed());
        return;
    }

    let columns: Vec<&str> = match catalog.schema().entity(&result.entity) {
        Some(entity) => entity.columns.iter().map(|c| c.name.as_str()).collect(),
        None => Vec::new(),
    };

    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| match row.get(c) {
                    Some(Value::Null) | None => "NULL".to_string(),
                    Some(value) => value.render(),
                })
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .fold(c.len(), usize::max)
        })
        .collect();

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{:width$}", c, width = *w))
        .collect();
    println!("{}", header.join(" │ ").white().bold());

    let sep: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    println!("{}", sep.join("─┼─").dimmed());

    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:width$}", v, width = *w))
            .collect();
        println!("{}", line.join(" │ "));
    }

    println!();
    println!("{} row(s) returned", result.len().to_string().cyan());
}

fn show_tokens(query: &str) -> Result<()> {
    let tokens = Lexer::new(query).tokenize()?;
    for token in tokens {
        println!(
            "{:>4}:{:<4} {:<20} {}",
            token.line,
            token.column,
            token.kind.to_string().cyan(),
            token.value.white()
        );
    }
    Ok(())
}

fn show_ast(query: &str, cli: &Cli) -> Result<()> {
    let ast = dino::parse_with_params(query, &parse_params(&cli.param)?)?;
    println!("{}", serde_json::to_string_pretty(&ast)?);
    Ok(())
}

fn format_query(query: &str, cli: &Cli) -> Result<()> {
    let ast = dino::parse_with_params(query, &parse_params(&cli.param)?)?;
    println!("{}", ast.to_sql());
    Ok(())
}

fn explain_query(query: &str, entity: Option<&str>, cli: &Cli) -> Result<()> {
    println!("{} {}", "Query:".dimmed(), query.yellow());

    let ast = dino::parse_with_params(query, &parse_params(&cli.param)?)?;
    println!("{} {}", "Parsed:".dimmed(), ast.to_sql().white());

    let unbound = ast.parameters();
    if !unbound.is_empty() {
        println!("{} {}", "Unbound:".dimmed(), unbound.join(", ").red());
    }
    println!();

    let config = load_config(cli.config.as_deref())?;
    let catalog = Catalog::new(config.schema);

    let Some(entity) = entity else {
        let plan = catalog.plan(&ast)?;
        print!("{}", plan.to_string().green());
        return Ok(());
    };

    let schema = catalog.schema();
    println!("{} {}", "entity:  ".dimmed(), entity.cyan());
    if let Some(where_clause) = &ast.where_clause {
        let predicate = match &ast.from {
            Some(from) if from.has_joins() => compile_join_predicate(from, where_clause, schema, entity)?,
            _ => compile_predicate(where_clause, schema, entity)?,
        };
        println!("{} {}", "filter:  ".dimmed(), predicate.to_string().green());
    }
    if let Some(order_by) = &ast.order_by {
        for item in &order_by.items {
            let key = match &ast.from {
                Some(from) if from.has_joins() => compile_join_order_key(&item.expr, from, schema, entity),
                _ => Some(compile_order_key(&item.expr, schema, entity)?),
            };
            match key {
                Some(key) => println!("{} {} {}", "order:   ".dimmed(), key.to_string().green(), item.order),
                None => println!("{} {}", "dropped: ".dimmed(), item.expr.to_sql().yellow()),
            }
        }
    }
    Ok(())
}
