use std::fmt;
use std::io;
use std::process::ExitStatus;
use thiserror::Error;

/// Hard failures: I/O while materializing data, bad host input, and the
/// external interpreter rejecting a program.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("unknown scale suffix: {0}")]
    UnknownScale(String),

    /// The interpreter could not be started or fed its input.
    #[error("failed to run interpreter `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The interpreter ran and exited non-zero. `program` is the exact text
    /// that was submitted.
    #[error("interpreter exited with {status}\n--- program ---\n{program}\n--- output ---\n{output}")]
    ExternalExecution {
        status: ExitStatus,
        program: String,
        output: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// A non-fatal problem found while assembling a program. The program is
/// still produced; these explain why it may not do what was intended.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub code: &'static str,
    pub message: String,
}

impl Diagnostic {
    pub fn encoding_fallback(fragment: &str) -> Self {
        Diagnostic {
            code: "encoding-fallback",
            message: format!("value written verbatim from its display form: {}", fragment),
        }
    }

    pub fn composition_type_mismatch(fragment: &str) -> Self {
        Diagnostic {
            code: "composition-type-mismatch",
            message: format!("non-statement operand appended as a raw layer: {}", fragment),
        }
    }

    pub fn missing_dataset_configuration() -> Self {
        Diagnostic {
            code: "missing-dataset-configuration",
            message: "query dataset has no loading block (was a database name given?)"
                .to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}
