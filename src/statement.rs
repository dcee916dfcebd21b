use crate::dataset::DatasetRef;
use crate::value::{encode, encode_name, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign};

/// A single R function call: `name(positional..., key=value...)`.
///
/// Built with by-value builder methods; keyword arguments always render
/// in name order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    name: String,
    args: Vec<Value>,
    kwargs: BTreeMap<String, Value>,
    /// Set only by `gg::ggplot`, so the plot's dataset travels with it.
    data: Option<DatasetRef>,
}

impl Statement {
    pub fn new(name: impl Into<String>) -> Self {
        Statement {
            name: name.into(),
            args: Vec::new(),
            kwargs: BTreeMap::new(),
            data: None,
        }
    }

    /// Append a positional argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    #[must_use]
    pub fn args<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.args.extend(values.into_iter().map(Into::into));
        self
    }

    /// Set a keyword argument, replacing any earlier value for `key`.
    #[must_use]
    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn kwargs<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.kwargs
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: DatasetRef) -> Self {
        self.data = Some(data);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn positional(&self) -> &[Value] {
        &self.args
    }

    pub fn keyword(&self) -> &BTreeMap<String, Value> {
        &self.kwargs
    }

    pub fn data(&self) -> Option<&DatasetRef> {
        self.data.as_ref()
    }

    /// Render as `name(args)`. Positional sequences and maps are spliced;
    /// keyword values are written as data (`a=c(1,2)`). Empty argument
    /// fragments (an empty sequence, say) are dropped so no stray commas
    /// appear.
    pub fn render(&self) -> String {
        let positional = self.args.iter().map(|v| encode(v, false));
        let keyword = self
            .kwargs
            .iter()
            .map(|(k, v)| format!("{}={}", encode_name(k), encode(v, true)));
        let all_args: Vec<String> = positional.chain(keyword).filter(|s| !s.is_empty()).collect();
        format!("{}({})", self.name, all_args.join(","))
    }

    /// A copy attached to `data` instead, with dataset arguments rewritten so
    /// the call names the symbol `data` is bound to.
    pub fn rebind(&self, data: &DatasetRef) -> Statement {
        let args = self
            .args
            .iter()
            .map(|v| match v {
                Value::Data(_) => Value::Data(data.clone()),
                other => other.clone(),
            })
            .collect();
        Statement {
            name: self.name.clone(),
            args,
            kwargs: self.kwargs.clone(),
            data: Some(data.clone()),
        }
    }

    pub fn to_stmts(&self) -> Statements {
        Statements {
            layers: vec![Layer::Call(self.clone())],
        }
    }

    pub(crate) fn walk_values(&self, f: &mut dyn FnMut(&Value)) {
        for v in &self.args {
            v.walk(f);
        }
        for v in self.kwargs.values() {
            v.walk(f);
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// One element of a statement sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    Call(Statement),
    /// A non-call operand that was composed in; written verbatim.
    Fragment(String),
    /// R source supplied as-is by the caller, e.g. a whole plot expression
    /// typed on the command line.
    Raw(String),
}

impl Layer {
    pub fn render(&self) -> String {
        match self {
            Layer::Call(stmt) => stmt.render(),
            Layer::Fragment(text) | Layer::Raw(text) => text.clone(),
        }
    }
}

/// An ordered, composable sequence of calls rendered as an additive
/// `a + b + c` chain.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statements {
    layers: Vec<Layer>,
}

impl Statements {
    /// The empty sequence, identity of `+`.
    pub fn new() -> Self {
        Statements { layers: Vec::new() }
    }

    /// A plot given directly as R source.
    pub fn raw(expr: impl Into<String>) -> Self {
        Statements {
            layers: vec![Layer::Raw(expr.into())],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Calls in order, skipping fragments and raw text.
    pub fn calls(&self) -> impl Iterator<Item = &Statement> {
        self.layers.iter().filter_map(|l| match l {
            Layer::Call(stmt) => Some(stmt),
            Layer::Fragment(_) | Layer::Raw(_) => None,
        })
    }

    /// The first dataset attached to any call in the sequence.
    pub fn data(&self) -> Option<&DatasetRef> {
        self.calls().find_map(Statement::data)
    }

    /// Replace the dataset of every call that carries one.
    pub fn rebind(&self, data: &DatasetRef) -> Statements {
        let layers = self
            .layers
            .iter()
            .map(|layer| match layer {
                Layer::Call(stmt) if stmt.data().is_some() => Layer::Call(stmt.rebind(data)),
                other => other.clone(),
            })
            .collect();
        Statements { layers }
    }

    /// Text of the fragments composed in, in order.
    pub fn fragments(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().filter_map(|l| match l {
            Layer::Fragment(text) => Some(text.as_str()),
            Layer::Call(_) | Layer::Raw(_) => None,
        })
    }

    pub fn render(&self) -> String {
        self.layers
            .iter()
            .map(Layer::render)
            .collect::<Vec<_>>()
            .join(" + ")
    }

    pub(crate) fn walk_values(&self, f: &mut dyn FnMut(&Value)) {
        for stmt in self.calls() {
            stmt.walk_values(f);
        }
    }
}

impl fmt::Display for Statements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

// ── Composition ─────────────────────────────────────────────────────

/// Anything that can appear on the right of `+`, flattened to layers.
pub trait IntoLayers {
    fn into_layers(self) -> Vec<Layer>;
}

impl IntoLayers for Statement {
    fn into_layers(self) -> Vec<Layer> {
        vec![Layer::Call(self)]
    }
}

impl IntoLayers for Statements {
    fn into_layers(self) -> Vec<Layer> {
        self.layers
    }
}

impl IntoLayers for Layer {
    fn into_layers(self) -> Vec<Layer> {
        vec![self]
    }
}

impl<T: IntoLayers> IntoLayers for Vec<T> {
    fn into_layers(self) -> Vec<Layer> {
        self.into_iter().flat_map(IntoLayers::into_layers).collect()
    }
}

impl<T: IntoLayers> IntoLayers for Option<T> {
    fn into_layers(self) -> Vec<Layer> {
        self.map(IntoLayers::into_layers).unwrap_or_default()
    }
}

impl IntoLayers for Value {
    fn into_layers(self) -> Vec<Layer> {
        match self {
            Value::Null => Vec::new(),
            Value::Call(stmt) => vec![Layer::Call(stmt)],
            Value::Layers(stmts) => stmts.layers,
            Value::Seq(items) => items.into_layers(),
            other => {
                let text = encode(&other, false);
                if text.trim().is_empty() {
                    return Vec::new();
                }
                tracing::warn!(
                    fragment = %text,
                    "composing a non-statement value; appending it as a raw fragment"
                );
                vec![Layer::Fragment(text)]
            }
        }
    }
}

impl<R: IntoLayers> Add<R> for Statements {
    type Output = Statements;

    fn add(mut self, rhs: R) -> Statements {
        self.layers.extend(rhs.into_layers());
        self
    }
}

impl<R: IntoLayers> Add<R> for Statement {
    type Output = Statements;

    fn add(self, rhs: R) -> Statements {
        Statements::from(self) + rhs
    }
}

impl<R: IntoLayers> AddAssign<R> for Statements {
    fn add_assign(&mut self, rhs: R) {
        self.layers.extend(rhs.into_layers());
    }
}

impl From<Statement> for Statements {
    fn from(stmt: Statement) -> Self {
        Statements {
            layers: vec![Layer::Call(stmt)],
        }
    }
}
