use crate::dataset::Table;
use crate::error::{Error, Result};
use crate::value::Value;
use serde_json::Value as Json;
use std::collections::BTreeMap;

/// Convert a JSON value into a [`Value`].
///
/// JSON strings are data, so they become quoted R string literals. Integral
/// numbers stay integers.
pub fn value_from_json(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(s) => Value::literal(s),
        Json::Array(items) => Value::Seq(items.iter().map(value_from_json).collect()),
        Json::Object(entries) => Value::Map(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), value_from_json(v)))
                .collect(),
        ),
    }
}

/// Interpret JSON as a table: either an object of columns
/// (`{"x": [0, 1]}`) or an array of row objects (`[{"x": 0}, {"x": 1}]`).
pub fn table_from_json(json: &Json) -> Result<Table> {
    match json {
        Json::Object(cols) => {
            let mut out = BTreeMap::new();
            for (name, col) in cols {
                let Json::Array(cells) = col else {
                    return Err(Error::InvalidData(format!(
                        "column '{}' is not an array",
                        name
                    )));
                };
                out.insert(name.clone(), cells.iter().map(value_from_json).collect());
            }
            Ok(Table::Columns(out))
        }
        Json::Array(rows) => {
            let mut out = Vec::with_capacity(rows.len());
            for (i, row) in rows.iter().enumerate() {
                let Json::Object(cells) = row else {
                    return Err(Error::InvalidData(format!("row {} is not an object", i)));
                };
                out.push(
                    cells
                        .iter()
                        .map(|(k, v)| (k.clone(), value_from_json(v)))
                        .collect(),
                );
            }
            Ok(Table::Rows(out))
        }
        _ => Err(Error::InvalidData(
            "expected an object of columns or an array of rows".to_string(),
        )),
    }
}

/// Parse a JSON document and interpret it as a table.
pub fn table_from_json_str(input: &str) -> Result<Table> {
    let json: Json = serde_json::from_str(input)?;
    table_from_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars() {
        assert_eq!(value_from_json(&Json::Null), Value::Null);
        assert_eq!(value_from_json(&serde_json::json!(true)), Value::Bool(true));
        assert_eq!(value_from_json(&serde_json::json!(3)), Value::Int(3));
        assert_eq!(value_from_json(&serde_json::json!(0.5)), Value::Number(0.5));
    }

    #[test]
    fn strings_become_literals() {
        let v = value_from_json(&serde_json::json!("say \"hi\""));
        assert_eq!(v.to_r(), r#""say \"hi\"""#);
    }

    #[test]
    fn nested_object_renders_as_list() {
        let v = value_from_json(&serde_json::json!({"b": [1, 2], "a": "x"}));
        assert_eq!(crate::value::encode(&v, true), r#"list(a="x",b=c(1,2))"#);
    }

    #[test]
    fn column_table() {
        let table = table_from_json_str(r#"{"x": [0, 1], "y": [1, 2]}"#).unwrap();
        let cols = table.to_columns().unwrap();
        assert_eq!(cols["x"], vec![Value::Int(0), Value::Int(1)]);
        assert_eq!(cols["y"], vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn row_table() {
        let table = table_from_json_str(r#"[{"a": 1}, {"b": 2}]"#).unwrap();
        let cols = table.to_columns().unwrap();
        assert_eq!(cols["a"], vec![Value::Int(1), Value::Null]);
        assert_eq!(cols["b"], vec![Value::Null, Value::Int(2)]);
    }

    #[test]
    fn rejects_non_tables() {
        assert!(matches!(
            table_from_json_str("42"),
            Err(Error::InvalidData(_))
        ));
        assert!(matches!(
            table_from_json_str(r#"{"x": 1}"#),
            Err(Error::InvalidData(_))
        ));
        assert!(matches!(table_from_json_str("[1, 2]"), Err(Error::InvalidData(_))));
        assert!(matches!(table_from_json_str("{"), Err(Error::Json(_))));
    }
}
