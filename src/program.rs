use crate::dataset::{bind, DatasetRef, TempPaths};
use crate::error::{Diagnostic, Result};
use crate::statement::{Statement, Statements};
use crate::value::{encode, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Library loaded at the top of every program.
pub const HEADER_LIBRARY: &str = "ggplot2";

/// Everything around the plot expression that goes into a program.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramOptions {
    /// Extra `library(...)` imports after the header.
    pub libs: Vec<String>,
    /// Raw R code before the data is loaded.
    pub prefix: Option<String>,
    /// Raw R code after the data is loaded, before the plot.
    pub postfix: Option<String>,
    /// Statements after the plot assignment, one per line.
    pub custom: Vec<Value>,
    /// Output file for `ggsave`. Without one no save call is emitted.
    pub destination: Option<String>,
    /// Overrides any dataset attached to the plot's `ggplot` call.
    pub data: Option<DatasetRef>,
    pub save_args: Vec<Value>,
    /// `ggsave` keywords; `Value::Null` entries are dropped before merging
    /// over [`save_defaults`].
    pub save_kwargs: BTreeMap<String, Value>,
    /// Suppress logging of the program and of interpreter output.
    pub quiet: bool,
    pub plot_variable: String,
}

impl Default for ProgramOptions {
    fn default() -> Self {
        ProgramOptions {
            libs: Vec::new(),
            prefix: None,
            postfix: None,
            custom: Vec::new(),
            destination: None,
            data: None,
            save_args: Vec::new(),
            save_kwargs: BTreeMap::new(),
            quiet: false,
            plot_variable: "p".to_string(),
        }
    }
}

impl ProgramOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lib(mut self, name: impl Into<String>) -> Self {
        self.libs.push(name.into());
        self
    }

    #[must_use]
    pub fn prefix(mut self, code: impl Into<String>) -> Self {
        self.prefix = Some(code.into());
        self
    }

    #[must_use]
    pub fn postfix(mut self, code: impl Into<String>) -> Self {
        self.postfix = Some(code.into());
        self
    }

    #[must_use]
    pub fn custom(mut self, stmt: impl Into<Value>) -> Self {
        self.custom.push(stmt.into());
        self
    }

    #[must_use]
    pub fn destination(mut self, name: impl Into<String>) -> Self {
        self.destination = Some(name.into());
        self
    }

    #[must_use]
    pub fn data(mut self, data: DatasetRef) -> Self {
        self.data = Some(data);
        self
    }

    #[must_use]
    pub fn save_arg(mut self, value: impl Into<Value>) -> Self {
        self.save_args.push(value.into());
        self
    }

    #[must_use]
    pub fn save_kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.save_kwargs.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn size(self, width: f64, height: f64) -> Self {
        self.save_kwarg("width", width).save_kwarg("height", height)
    }

    #[must_use]
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }
}

/// `ggsave` keywords used unless overridden.
pub fn save_defaults() -> BTreeMap<String, Value> {
    [
        ("width".to_string(), Value::Int(10)),
        ("height".to_string(), Value::Int(8)),
        ("scale".to_string(), Value::Int(1)),
    ]
    .into()
}

/// An assembled R program.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub text: String,
    /// CSV written for inline data, if any. The caller owns its lifetime.
    pub temp_file: Option<PathBuf>,
    pub destination: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Program {
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Assemble the full program text for `plot`.
///
/// Block order is fixed: header, extra libraries, prefix, data loading,
/// postfix, `<var> = <plot>`, custom statements, save call. Empty blocks
/// are left out. The only side effect is materializing inline data.
pub fn assemble(plot: &Statements, options: &ProgramOptions, paths: &dyn TempPaths) -> Result<Program> {
    let mut diagnostics = collect_diagnostics(plot, &options.custom);

    // Explicit save-time data wins over data attached to the plot, and the
    // plot is rewritten to reference it.
    let rebound;
    let plot = match &options.data {
        Some(data) => {
            rebound = plot.rebind(data);
            &rebound
        }
        None => plot,
    };
    let data = options.data.as_ref().or_else(|| plot.data());
    let binding = data.map(|d| bind(d, paths)).transpose()?;
    if let Some(DatasetRef::Query(block)) = data {
        if block.trim().is_empty() {
            diagnostics.push(Diagnostic::missing_dataset_configuration());
        }
    }
    for d in &diagnostics {
        tracing::warn!(code = d.code, "{}", d.message);
    }

    let var = &options.plot_variable;
    let mut blocks = vec![format!("library({})", HEADER_LIBRARY)];
    blocks.extend(
        options
            .libs
            .iter()
            .filter(|lib| lib.as_str() != HEADER_LIBRARY)
            .map(|lib| format!("library({})", lib)),
    );
    blocks.push(options.prefix.clone().unwrap_or_default());
    blocks.push(binding.as_ref().map(|b| b.load.clone()).unwrap_or_default());
    blocks.push(options.postfix.clone().unwrap_or_default());
    blocks.push(format!("{} = {}", var, plot.render()));
    blocks.extend(options.custom.iter().map(|v| encode(v, false)));
    if let Some(dest) = &options.destination {
        blocks.push(save_call(dest, options).render());
    }

    let text = blocks
        .into_iter()
        .filter(|b| !b.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    Ok(Program {
        text,
        temp_file: binding.and_then(|b| b.temp_file),
        destination: options.destination.clone(),
        diagnostics,
    })
}

/// `ggsave("<dest>",<var>,<args>,<sorted kwargs>)`.
fn save_call(destination: &str, options: &ProgramOptions) -> Statement {
    let mut kwargs = save_defaults();
    kwargs.extend(
        options
            .save_kwargs
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.clone(), v.clone())),
    );
    Statement::new("ggsave")
        .arg(Value::literal(destination))
        .arg(options.plot_variable.as_str())
        .args(options.save_args.iter().cloned())
        .kwargs(kwargs)
}

/// Non-fatal problems visible in the plot tree: raw fragments composed in
/// as layers (also inside layer sequences passed as arguments) and opaque
/// values encoded verbatim.
pub fn collect_diagnostics(plot: &Statements, custom: &[Value]) -> Vec<Diagnostic> {
    let mut diagnostics: Vec<Diagnostic> = plot
        .fragments()
        .map(Diagnostic::composition_type_mismatch)
        .collect();
    let mut note = |v: &Value| match v {
        Value::Opaque(s) => diagnostics.push(Diagnostic::encoding_fallback(s)),
        Value::Layers(nested) => diagnostics.extend(
            nested
                .fragments()
                .map(Diagnostic::composition_type_mismatch),
        ),
        _ => {}
    };
    plot.walk_values(&mut note);
    for v in custom {
        v.walk(&mut note);
    }
    diagnostics
}
