pub mod dataset;
pub mod error;
pub mod executor;
pub mod from_json;
pub mod gg;
pub mod primitives;
pub mod program;
pub mod statement;
pub mod value;

use dataset::{SystemTempPaths, TempPaths};
use error::Result;
use executor::Interpreter;
use program::{assemble, Program, ProgramOptions};

pub use dataset::{data_csv, data_sql, DatasetRef, InlineData, Table};
pub use error::{Diagnostic, Error};
pub use gg::{aes, axis_labels, facet_grid, facet_wrap, ggplot};
pub use statement::{Layer, Statement, Statements};
pub use value::{encode, is_quoted, quote, unquote, Value};

// ── Core API ───────────────────────────────────────────────────────

/// Assemble `plot` into a program and, if `options.destination` is set,
/// run it with the default R interpreter.
///
/// Inline data is written to a fresh file in the system temp dir.
pub fn ggsave(plot: &Statements, options: &ProgramOptions) -> Result<Program> {
    ggsave_with(plot, options, &Interpreter::default(), &SystemTempPaths::new())
}

/// [`ggsave`] with an explicit interpreter and temp path source.
pub fn ggsave_with(
    plot: &Statements,
    options: &ProgramOptions,
    interpreter: &Interpreter,
    paths: &dyn TempPaths,
) -> Result<Program> {
    let program = assemble(plot, options, paths)?;
    if !options.quiet {
        tracing::info!("generated program:\n{}", program.text);
    }
    if program.destination.is_none() {
        return Ok(program);
    }

    let result = interpreter.run(&program.text)?;
    if !options.quiet {
        tracing::info!("interpreter output:\n{}", result.output);
    }
    Ok(program)
}

impl Statement {
    /// Save this single call as a plot to `destination`.
    pub fn save(&self, destination: &str, options: ProgramOptions) -> Result<Program> {
        self.to_stmts().save(destination, options)
    }
}

impl Statements {
    /// Save the plot to `destination`.
    pub fn save(&self, destination: &str, options: ProgramOptions) -> Result<Program> {
        ggsave(self, &options.destination(destination))
    }
}
