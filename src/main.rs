use clap::Parser;
use rgg_rust::dataset::{data_sql, DatasetRef, InlineData, SystemTempPaths};
use rgg_rust::executor::Interpreter;
use rgg_rust::from_json::table_from_json_str;
use rgg_rust::program::{assemble, ProgramOptions};
use rgg_rust::Statements;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// ggplot2 from the command line.
///
///   rgg -c "ggplot(diamonds, aes(carat, price)) + geom_point()" -o plot.pdf
///   rgg --csv mydata.csv -c "ggplot(data, aes(x=a, y=b)) + geom_point()"
///   rgg --db intel --sql "SELECT epoch, temp FROM readings" -c "..." -o out.png
///
/// Without -o the generated program is printed and R is not run.
#[derive(Parser, Debug)]
#[command(name = "rgg", verbatim_doc_comment)]
struct Args {
    /// Plot expression, in R
    #[arg(short = 'c', long = "command")]
    command: Option<String>,

    /// R code to run before the data is loaded
    #[arg(long)]
    prefix: Option<String>,

    /// CSV file to load into `data`
    #[arg(long, conflicts_with_all = ["json", "sql", "db"])]
    csv: Option<PathBuf>,

    /// JSON table (object of columns or array of rows) to load into `data`
    #[arg(long, conflicts_with_all = ["sql", "db"])]
    json: Option<PathBuf>,

    /// Database name, used with --sql
    #[arg(long)]
    db: Option<String>,

    /// SQL query whose result is loaded into `data`
    #[arg(long)]
    sql: Option<String>,

    /// Output file for the graphic
    #[arg(short = 'o', long)]
    output: Option<String>,

    #[arg(short = 'w', long, default_value_t = 10.0)]
    width: f64,

    #[arg(long, default_value_t = 8.0)]
    height: f64,

    #[arg(long, default_value_t = 1.0)]
    scale: f64,

    /// Extra R library to load (repeatable)
    #[arg(long = "lib")]
    libs: Vec<String>,

    /// Don't log the program or the interpreter output
    #[arg(short, long)]
    quiet: bool,

    /// Interpreter binary; the program is piped to its stdin
    #[arg(long, env = "RGG_INTERPRETER", default_value = "R")]
    interpreter: String,
}

fn load_data(args: &Args) -> Result<Option<DatasetRef>, rgg_rust::Error> {
    if let Some(csv) = &args.csv {
        return Ok(Some(DatasetRef::file(csv)));
    }
    if let Some(json) = &args.json {
        let text = std::fs::read_to_string(json)?;
        let table = table_from_json_str(&text)?;
        return Ok(Some(DatasetRef::Inline(InlineData::new(table))));
    }
    if args.sql.is_some() || args.db.is_some() {
        return Ok(Some(data_sql(
            args.db.as_deref(),
            args.sql.as_deref().unwrap_or_default(),
        )));
    }
    Ok(None)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let Some(command) = args.command.clone() else {
        println!("no command. exiting");
        return;
    };
    let plot = Statements::raw(command);

    let data = match load_data(&args) {
        Ok(data) => data,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };

    let mut options = ProgramOptions::new()
        .size(args.width, args.height)
        .save_kwarg("scale", args.scale)
        .quiet(args.quiet);
    options.libs = args.libs.clone();
    options.prefix = args.prefix.clone();
    options.data = data;

    let paths = SystemTempPaths::new();
    if let Some(output) = &args.output {
        options = options.destination(output.as_str());
    }
    let program = match assemble(&plot, &options, &paths) {
        Ok(program) => program,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };
    if args.output.is_none() || !args.quiet {
        println!("{}", program);
    }
    if args.output.is_none() {
        return;
    }

    let interpreter = Interpreter {
        command: args.interpreter.clone(),
        ..Interpreter::default()
    };
    match interpreter.run(program.text()) {
        Ok(out) => {
            if !args.quiet && !out.output.is_empty() {
                eprintln!("{}", out.output);
            }
        }
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sources_exclude_database() {
        assert!(Args::try_parse_from(["rgg", "--csv", "f.csv", "--db", "x"]).is_err());
        assert!(Args::try_parse_from(["rgg", "--json", "f.json", "--db", "x"]).is_err());
        assert!(Args::try_parse_from(["rgg", "--csv", "f.csv", "--json", "f.json"]).is_err());
        let args = Args::try_parse_from(["rgg", "--db", "x", "--sql", "SELECT 1"]).unwrap();
        assert_eq!(args.db.as_deref(), Some("x"));
    }
}
