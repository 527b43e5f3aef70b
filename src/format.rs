use serde_json::{json, Map, Value};

use crate::db::Row;

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Numeric view of a result cell. NULL, missing and non-numeric cells become
/// `0`.
fn numeric_or_zero(cell: Option<&Value>) -> Value {
    match cell {
        Some(Value::Number(n)) => Value::Number(n.clone()),
        Some(Value::Null) | None => json!(0),
        Some(other) => {
            log::warn!("Non-numeric aggregate value {other}; using 0");
            json!(0)
        }
    }
}

/// First column of the first row, `0` if absent, optionally transformed.
pub fn scalar(rows: &[Row], column: usize, transform: Option<fn(f64) -> f64>) -> Value {
    let value = numeric_or_zero(rows.first().and_then(|row| row.get(column)));
    match transform {
        Some(f) => {
            let transformed = f(value.as_f64().unwrap_or(0.0));
            if transformed.is_finite() {
                json!(transformed)
            } else {
                json!(0)
            }
        }
        None => value,
    }
}

/// `{response_key: value}` for a single-value route.
pub fn single_value(
    rows: &[Row],
    response_key: &str,
    transform: Option<fn(f64) -> f64>,
) -> Value {
    json!({ response_key: scalar(rows, 0, transform) })
}

/// Transposes two-column rows into `{key1: [col0...], key2: [col1...]}`,
/// keeping query order. Missing cells come out as `null` labels or `0`
/// metrics so both arrays stay the same length.
pub fn grouped_pairs(rows: &[Row], key1: &str, key2: &str) -> Value {
    let (labels, values): (Vec<Value>, Vec<Value>) = rows
        .iter()
        .map(|row| {
            let label = row.first().cloned().unwrap_or(Value::Null);
            (label, numeric_or_zero(row.get(1)))
        })
        .unzip();

    let mut map = Map::new();
    map.insert(key1.to_string(), Value::Array(labels));
    map.insert(key2.to_string(), Value::Array(values));
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_one_decimal() {
        assert_eq!(round_one_decimal(12.345), 12.3);
        assert_eq!(round_one_decimal(12.36), 12.4);
        assert_eq!(round_one_decimal(7.0), 7.0);
        assert_eq!(round_one_decimal(0.04), 0.0);
    }

    #[test]
    fn test_single_value_extracts_first_cell() {
        let rows = vec![vec![json!(1234), json!("ignored")]];
        assert_eq!(single_value(&rows, "total_wells", None), json!({"total_wells": 1234}));
    }

    #[test]
    fn test_single_value_defaults_to_zero() {
        assert_eq!(single_value(&[], "total_wells", None), json!({"total_wells": 0}));
        assert_eq!(
            single_value(&[vec![Value::Null]], "total_wells", None),
            json!({"total_wells": 0})
        );
        assert_eq!(single_value(&[vec![]], "total_wells", None), json!({"total_wells": 0}));
    }

    #[test]
    fn test_single_value_applies_transform() {
        let rows = vec![vec![json!(11.2666)]];
        assert_eq!(
            single_value(&rows, "avg_days", Some(round_one_decimal)),
            json!({"avg_days": 11.3})
        );

        let value = single_value(&[vec![Value::Null]], "avg_days", Some(round_one_decimal));
        assert!(value["avg_days"].is_number());
        assert_eq!(value["avg_days"].as_f64(), Some(0.0));
    }

    #[test]
    fn test_single_value_rejects_text() {
        let rows = vec![vec![json!("12")]];
        assert_eq!(single_value(&rows, "avg_days", None), json!({"avg_days": 0}));
    }

    #[test]
    fn test_grouped_pairs_keeps_query_order() {
        let rows = vec![
            vec![json!("B"), json!(250.0)],
            vec![json!("A"), json!(100.0)],
        ];
        assert_eq!(
            grouped_pairs(&rows, "Region", "avg_cost"),
            json!({"Region": ["B", "A"], "avg_cost": [250.0, 100.0]})
        );
    }

    #[test]
    fn test_grouped_pairs_empty() {
        assert_eq!(
            grouped_pairs(&[], "Year", "avg_days"),
            json!({"Year": [], "avg_days": []})
        );
    }

    #[test]
    fn test_grouped_pairs_null_cells() {
        let rows = vec![vec![Value::Null, json!(3.5)], vec![json!("Jurassic"), Value::Null]];
        let value = grouped_pairs(&rows, "Era", "avg_days");

        assert_eq!(value["Era"], json!([null, "Jurassic"]));
        assert_eq!(value["avg_days"], json!([3.5, 0]));
    }
}
