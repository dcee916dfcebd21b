//! The ggplot2 functions this crate knows by name.
//!
//! The set lives in `data/ggplot2_primitives.txt`; every entry is built by
//! the same constructor, so adding a primitive means adding a line there.

use crate::statement::Statement;
use std::collections::BTreeSet;
use std::sync::OnceLock;

const TABLE_SRC: &str = include_str!("../data/ggplot2_primitives.txt");

fn table() -> &'static BTreeSet<&'static str> {
    static TABLE: OnceLock<BTreeSet<&'static str>> = OnceLock::new();
    TABLE.get_or_init(|| {
        TABLE_SRC
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect()
    })
}

/// All known primitive names, sorted.
pub fn names() -> impl Iterator<Item = &'static str> {
    table().iter().copied()
}

pub fn is_primitive(name: &str) -> bool {
    table().contains(name)
}

/// An argument-less call to a known primitive, or `None` if `name` is not
/// in the table. Use [`Statement::new`] for functions outside it.
pub fn lookup(name: &str) -> Option<Statement> {
    table().get(name).map(|n| Statement::new(*n))
}
