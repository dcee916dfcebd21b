//! Constructors that need more than a bare call: the plot root, facets
//! (R formulas) and axis labels.

use crate::dataset::DatasetRef;
use crate::error::{Error, Result};
use crate::statement::{Statement, Statements};
use crate::value::Value;

/// `ggplot(<data>)`. The dataset is attached to the node so the assembler
/// can load it; in the call it renders as the symbol it is bound to.
pub fn ggplot(data: DatasetRef) -> Statement {
    Statement::new("ggplot")
        .arg(Value::Data(data.clone()))
        .with_data(data)
}

/// Aesthetic mapping `aes(...)`.
pub fn aes() -> Statement {
    Statement::new("aes")
}

fn side(v: Option<&str>) -> Option<&str> {
    v.filter(|s| !s.is_empty())
}

/// `facet_wrap(x~y)`. A missing `x` is left empty, a missing `y` becomes `.`.
/// With neither there is nothing to facet on and `None` is returned, which
/// composes as a no-op.
pub fn facet_wrap(x: Option<&str>, y: Option<&str>) -> Option<Statement> {
    let (x, y) = (side(x), side(y));
    if x.is_none() && y.is_none() {
        tracing::warn!("facet_wrap got no facet variables");
        return None;
    }
    let formula = format!("{}~{}", x.unwrap_or(""), y.unwrap_or("."));
    Some(Statement::new("facet_wrap").arg(formula))
}

/// `facet_grid(x~y)` with `.` for a missing side. `None` when both are
/// missing.
pub fn facet_grid(x: Option<&str>, y: Option<&str>) -> Option<Statement> {
    let (x, y) = (side(x), side(y));
    if x.is_none() && y.is_none() {
        tracing::warn!("facet_grid got no facet variables");
        return None;
    }
    let formula = format!("{}~{}", x.unwrap_or("."), y.unwrap_or("."));
    Some(Statement::new("facet_grid").arg(formula))
}

/// Scale suffix → (x scale, y scale).
const SCALES: &[(&str, &str, &str)] = &[
    ("continuous", "scale_x_continuous", "scale_y_continuous"),
    ("discrete", "scale_x_discrete", "scale_y_discrete"),
    ("log10", "scale_x_log10", "scale_y_log10"),
    ("reverse", "scale_x_reverse", "scale_y_reverse"),
    ("sqrt", "scale_x_sqrt", "scale_y_sqrt"),
    ("date", "scale_x_date", "scale_y_date"),
    ("datetime", "scale_x_datetime", "scale_y_datetime"),
];

fn scale_names(suffix: &str) -> Result<(&'static str, &'static str)> {
    SCALES
        .iter()
        .find(|(s, _, _)| *s == suffix)
        .map(|(_, x, y)| (*x, *y))
        .ok_or_else(|| Error::UnknownScale(suffix.to_string()))
}

/// Axis titles as `scale_x_<x_scale>(name="..") + scale_y_<y_scale>(name="..")`.
pub fn axis_labels(x_title: &str, y_title: &str, x_scale: &str, y_scale: &str) -> Result<Statements> {
    let (x_fn, _) = scale_names(x_scale)?;
    let (_, y_fn) = scale_names(y_scale)?;
    let x = Statement::new(x_fn).kwarg("name", Value::literal(x_title));
    let y = Statement::new(y_fn).kwarg("name", Value::literal(y_title));
    Ok(x + y)
}
