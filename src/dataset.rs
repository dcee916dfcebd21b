use crate::error::Result;
use crate::statement::Statement;
use crate::value::{encode, quote, unquote, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// R variable that inline and query datasets are loaded into.
pub const DATA_VARIABLE: &str = "data";

/// Tabular data supplied by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Table {
    /// `{ "x": [0, 1], "y": [1, 2] }`
    Columns(BTreeMap<String, Vec<Value>>),
    /// `[{ "x": 0, "y": 1 }, { "x": 1, "y": 2 }]`
    Rows(Vec<BTreeMap<String, Value>>),
    /// An existing delimited file, loaded as-is.
    File(PathBuf),
}

impl Table {
    /// Column-oriented view with every column padded to the same length.
    /// Returns `None` for file-backed tables.
    pub fn to_columns(&self) -> Option<BTreeMap<String, Vec<Value>>> {
        match self {
            Table::Columns(cols) => {
                let nrows = cols.values().map(Vec::len).max().unwrap_or(0);
                Some(
                    cols.iter()
                        .map(|(name, vals)| {
                            let mut vals = vals.clone();
                            vals.resize(nrows, Value::Null);
                            (name.clone(), vals)
                        })
                        .collect(),
                )
            }
            Table::Rows(rows) => Some(pivot_rows(rows)),
            Table::File(_) => None,
        }
    }
}

/// Pivot row records into columns. The column set is the union of all row
/// keys; a row missing a key contributes `NA`.
pub fn pivot_rows(rows: &[BTreeMap<String, Value>]) -> BTreeMap<String, Vec<Value>> {
    let keys: BTreeSet<&String> = rows.iter().flat_map(|r| r.keys()).collect();
    keys.into_iter()
        .map(|key| {
            let col = rows
                .iter()
                .map(|r| r.get(key).cloned().unwrap_or(Value::Null))
                .collect();
            (key.clone(), col)
        })
        .collect()
}

/// Inline data plus the extra arguments passed through to `read.csv`.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineData {
    pub table: Table,
    pub read_args: Vec<Value>,
    pub read_kwargs: BTreeMap<String, Value>,
}

impl InlineData {
    pub fn new(table: Table) -> Self {
        InlineData {
            table,
            read_args: Vec::new(),
            read_kwargs: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn read_arg(mut self, value: impl Into<Value>) -> Self {
        self.read_args.push(value.into());
        self
    }

    /// Keyword for `read.csv`. A `sep` keyword is ignored: inline data is
    /// always written comma-separated.
    #[must_use]
    pub fn read_kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.read_kwargs.insert(key.into(), value.into());
        self
    }
}

/// Where the plot's data comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetRef {
    /// A variable already bound in the R session (e.g. `diamonds`).
    Variable(String),
    Inline(InlineData),
    /// A pre-rendered loading block that assigns `data`.
    Query(String),
}

impl DatasetRef {
    pub fn variable(name: impl Into<String>) -> Self {
        DatasetRef::Variable(name.into())
    }

    pub fn columns<I, K, V>(cols: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<V>)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let cols = cols
            .into_iter()
            .map(|(k, vs)| (k.into(), vs.into_iter().map(Into::into).collect()))
            .collect();
        DatasetRef::Inline(InlineData::new(Table::Columns(cols)))
    }

    pub fn rows(rows: Vec<BTreeMap<String, Value>>) -> Self {
        DatasetRef::Inline(InlineData::new(Table::Rows(rows)))
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        DatasetRef::Inline(InlineData::new(Table::File(path.into())))
    }

    pub fn query(block: impl Into<String>) -> Self {
        DatasetRef::Query(block.into())
    }

    /// The R symbol a plot uses to refer to this dataset.
    pub fn symbol(&self) -> &str {
        match self {
            DatasetRef::Variable(name) => name,
            DatasetRef::Inline(_) | DatasetRef::Query(_) => DATA_VARIABLE,
        }
    }
}

/// Load a CSV file into `data` with `read.csv`.
pub fn data_csv(path: impl Into<PathBuf>) -> DatasetRef {
    DatasetRef::file(path)
}

/// Load the result of a PostgreSQL query into `data`.
///
/// Without a database name there is nothing to connect to: the result is an
/// empty loading block, reported by the assembler as a diagnostic.
pub fn data_sql(db: Option<&str>, query: &str) -> DatasetRef {
    let Some(db) = db.filter(|d| !d.is_empty()) else {
        tracing::warn!(query, "a database name is required to load a SQL query");
        return DatasetRef::Query(String::new());
    };
    let connect = Statement::new("dbConnect")
        .arg("drv")
        .kwarg("dbname", Value::literal(db));
    let lines = [
        "library(RPostgreSQL)".to_string(),
        format!("drv = {}", Statement::new("dbDriver").arg(Value::literal("PostgreSQL"))),
        format!("con = {}", connect),
        format!("q = {}", quote(query)),
        format!("{} = {}", DATA_VARIABLE, Statement::new("dbGetQuery").arg("con").arg("q")),
    ];
    DatasetRef::Query(lines.join("\n"))
}

// ── Temp file paths ─────────────────────────────────────────────────

/// Source of fresh paths for materialized datasets.
///
/// Every call must return a path no other call (in any thread) returns.
pub trait TempPaths {
    fn create(&self) -> Result<PathBuf>;
}

/// Collision-resistant files in the system temp dir (or `dir`), kept on
/// disk after creation. The caller owns cleanup.
#[derive(Debug, Clone, Default)]
pub struct SystemTempPaths {
    dir: Option<PathBuf>,
}

impl SystemTempPaths {
    pub fn new() -> Self {
        SystemTempPaths { dir: None }
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        SystemTempPaths {
            dir: Some(dir.into()),
        }
    }
}

impl TempPaths for SystemTempPaths {
    fn create(&self) -> Result<PathBuf> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("rgg_").suffix(".csv");
        let file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        let path = file.into_temp_path().keep().map_err(io::Error::from)?;
        Ok(path)
    }
}

/// Deterministic `data_0.csv`, `data_1.csv`, ... under a directory.
#[derive(Debug)]
pub struct NumberedTempPaths {
    dir: PathBuf,
    next: AtomicUsize,
}

impl NumberedTempPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        NumberedTempPaths {
            dir: dir.into(),
            next: AtomicUsize::new(0),
        }
    }
}

impl TempPaths for NumberedTempPaths {
    fn create(&self) -> Result<PathBuf> {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        Ok(self.dir.join(format!("{}_{}.csv", DATA_VARIABLE, n)))
    }
}

// ── Binding ─────────────────────────────────────────────────────────

/// How a dataset enters the program.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// Loading statement(s); empty when nothing needs loading.
    pub load: String,
    /// Set when a file was materialized for this binding.
    pub temp_file: Option<PathBuf>,
    pub symbol: String,
}

/// Decide how `data` gets loaded, materializing inline tables to CSV.
pub fn bind(data: &DatasetRef, paths: &dyn TempPaths) -> Result<Binding> {
    let symbol = data.symbol().to_string();
    match data {
        DatasetRef::Variable(_) => Ok(Binding {
            load: String::new(),
            temp_file: None,
            symbol,
        }),
        DatasetRef::Query(block) => Ok(Binding {
            load: block.clone(),
            temp_file: None,
            symbol,
        }),
        DatasetRef::Inline(inline) => {
            let (path, temp_file) = match (&inline.table, inline.table.to_columns()) {
                (Table::File(path), _) => (path.clone(), None),
                (_, cols) => {
                    let path = paths.create()?;
                    write_csv(&path, &cols.unwrap_or_default())?;
                    tracing::debug!(path = %path.display(), "materialized inline dataset");
                    (path.clone(), Some(path))
                }
            };
            let read = read_csv_call(&path, inline);
            Ok(Binding {
                load: format!("{} = {}", DATA_VARIABLE, read.render()),
                temp_file,
                symbol,
            })
        }
    }
}

/// `read.csv("<path>",<args>,<sorted kwargs>,sep=",")`, with the forced
/// separator last.
fn read_csv_call(path: &Path, inline: &InlineData) -> Statement {
    let kwargs: BTreeMap<String, Value> = inline
        .read_kwargs
        .iter()
        .filter(|(k, _)| k.as_str() != "sep")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let sep: BTreeMap<String, Value> = [("sep".to_string(), Value::literal(","))].into();
    Statement::new("read.csv")
        .arg(Value::literal(&path.to_string_lossy()))
        .args(inline.read_args.iter().cloned())
        .arg(Value::Map(kwargs))
        .arg(Value::Map(sep))
}

fn write_csv(path: &Path, cols: &BTreeMap<String, Vec<Value>>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(cols.keys())?;
    let nrows = cols.values().map(Vec::len).max().unwrap_or(0);
    for i in 0..nrows {
        writer.write_record(cols.values().map(|col| cell_text(col.get(i))))?;
    }
    writer.flush()?;
    Ok(())
}

/// CSV text for one cell. String literals are written without their quotes;
/// the CSV writer adds its own quoting where needed.
fn cell_text(v: Option<&Value>) -> String {
    match v {
        None | Some(Value::Null) => "NA".to_string(),
        Some(Value::Text(s)) => unquote(s),
        Some(other) => encode(other, true),
    }
}
