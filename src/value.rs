use crate::dataset::DatasetRef;
use crate::statement::{Statement, Statements};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

/// A host value that can be written as R source text.
///
/// `Text` is raw R syntax (identifiers, operators, pre-written
/// sub-expressions) and is emitted verbatim. String literals are made with
/// [`quote`] or [`Value::literal`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Number(f64),
    Text(String),
    Seq(Vec<Value>),
    /// Entries always render in key order.
    Map(BTreeMap<String, Value>),
    Call(Statement),
    Layers(Statements),
    /// Renders as the R symbol the dataset is bound to.
    Data(DatasetRef),
    /// Pre-formatted fragment of some other type, written verbatim.
    Opaque(String),
}

impl Value {
    /// A double-quoted R string literal.
    pub fn literal(s: &str) -> Self {
        Value::Text(quote(s))
    }

    /// Wrap anything printable as an opaque fragment.
    pub fn opaque(v: impl fmt::Display) -> Self {
        Value::Opaque(v.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// R text for this value used as a bare call argument.
    pub fn to_r(&self) -> String {
        encode(self, false)
    }

    /// Visit this value and every value nested inside it, including the
    /// arguments of nested calls.
    pub fn walk(&self, f: &mut dyn FnMut(&Value)) {
        f(self);
        match self {
            Value::Seq(items) => items.iter().for_each(|v| v.walk(f)),
            Value::Map(entries) => entries.values().for_each(|v| v.walk(f)),
            Value::Call(stmt) => stmt.walk_values(f),
            Value::Layers(stmts) => stmts.walk_values(f),
            _ => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_r())
    }
}

// ── Encoding ────────────────────────────────────────────────────────

/// Encode a value as R source text.
///
/// `as_data` is true when the value is itself being written as data (an
/// element of a vector or list). Sequences and maps are then wrapped in
/// `c(...)` / `list(...)`; as bare arguments they are spliced into the
/// surrounding call instead.
pub fn encode(value: &Value, as_data: bool) -> String {
    match value {
        Value::Null => "NA".to_string(),
        Value::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Number(n) => encode_number(*n),
        Value::Text(s) => s.clone(),
        Value::Seq(items) => {
            let inner = items
                .iter()
                .map(|v| encode(v, true))
                .collect::<Vec<_>>()
                .join(",");
            if as_data {
                format!("c({})", inner)
            } else {
                inner
            }
        }
        Value::Map(entries) => {
            let inner = encode_entries(entries, true);
            if as_data {
                format!("list({})", inner)
            } else {
                inner
            }
        }
        Value::Call(stmt) => stmt.render(),
        Value::Layers(stmts) => stmts.render(),
        Value::Data(data) => data.symbol().to_string(),
        Value::Opaque(s) => {
            tracing::debug!(fragment = %s, "encoding opaque value verbatim");
            s.clone()
        }
    }
}

/// Render map entries as `key=value` pairs in key order.
pub(crate) fn encode_entries(entries: &BTreeMap<String, Value>, as_data: bool) -> String {
    entries
        .iter()
        .map(|(k, v)| format!("{}={}", encode_name(k), encode(v, as_data)))
        .collect::<Vec<_>>()
        .join(",")
}

fn encode_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Inf" } else { "-Inf" }.to_string()
    } else {
        // Debug keeps a fractional part for integral floats (1.0, not 1).
        format!("{:?}", n)
    }
}

// ── Names and string literals ───────────────────────────────────────

const RESERVED: &[&str] = &[
    "if", "else", "repeat", "while", "function", "for", "next", "break", "TRUE", "FALSE", "NULL",
    "Inf", "NaN", "NA", "in",
];

fn syntactic_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(([A-Za-z]|\.[._A-Za-z])[._A-Za-z0-9]*|\.)$").expect("valid name pattern")
    })
}

/// Whether `name` can appear unquoted as an R argument name.
pub fn is_syntactic_name(name: &str) -> bool {
    syntactic_name_re().is_match(name) && !RESERVED.contains(&name)
}

/// Argument or list names, backquoted when they are not syntactic.
pub fn encode_name(name: &str) -> String {
    if is_syntactic_name(name) {
        name.to_string()
    } else {
        format!("`{}`", name.replace('`', "\\`"))
    }
}

/// Make an R string literal: escape embedded double quotes and wrap the
/// result in double quotes. Single quotes need no escaping inside `"..."`.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        if ch == '"' {
            out.push_str("\\\"");
        } else {
            out.push(ch);
        }
    }
    out.push('"');
    out
}

/// Inverse of [`quote`]. Strings that are not quoted come back unchanged.
pub fn unquote(s: &str) -> String {
    if !is_quoted(s) {
        return s.to_string();
    }
    let inner = &s[1..s.len() - 1];
    let delim = &s[..1];
    inner.replace(&format!("\\{}", delim), delim)
}

/// Whether `s` is already wrapped in matching single or double quotes.
pub fn is_quoted(s: &str) -> bool {
    s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
}

// ── Conversions ─────────────────────────────────────────────────────

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        match i64::try_from(n) {
            Ok(n) => Value::Int(n),
            Err(_) => Value::Number(n as f64),
        }
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Statement> for Value {
    fn from(stmt: Statement) -> Self {
        Value::Call(stmt)
    }
}

impl From<Statements> for Value {
    fn from(stmts: Statements) -> Self {
        Value::Layers(stmts)
    }
}

impl From<DatasetRef> for Value {
    fn from(data: DatasetRef) -> Self {
        Value::Data(data)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Seq(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(entries: BTreeMap<String, T>) -> Self {
        Value::Map(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
