use serde_json::{Number, Value};

/// Typed form of a flattened cell after heuristic classification.
///
/// Source files are edited by hand and carry no schema, so the type of a
/// cell is recovered from its text alone. The classification order is
/// fixed: boolean, then float (only when the text contains a `.`), then
/// integer, then verbatim string. The same text always maps to the same
/// type class, in every conversion direction.
#[derive(Clone, Debug, PartialEq)]
pub enum ScalarValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ScalarValue {
    /// Classify a raw cell string.
    ///
    /// First match wins, no backtracking:
    /// - `"true"` / `"false"` (case-insensitive) → `Bool`
    /// - contains a literal `.` → `Float` if it parses, else fall through
    /// - parses as a whole number → `Int`
    /// - anything else stays `Text`, verbatim
    pub fn parse(raw: &str) -> ScalarValue {
        if raw.eq_ignore_ascii_case("true") {
            return ScalarValue::Bool(true);
        }
        if raw.eq_ignore_ascii_case("false") {
            return ScalarValue::Bool(false);
        }
        if raw.contains('.') {
            if let Ok(f) = raw.parse::<f64>() {
                return ScalarValue::Float(f);
            }
        } else if let Ok(i) = raw.parse::<i64>() {
            return ScalarValue::Int(i);
        }
        ScalarValue::Text(raw.to_string())
    }

    /// Render back to a cell string.
    ///
    /// Whole-valued floats keep a trailing `.0` so the value re-classifies
    /// as a float on the next read.
    pub fn to_cell(&self) -> String {
        match self {
            ScalarValue::Bool(b) => b.to_string(),
            ScalarValue::Int(i) => i.to_string(),
            ScalarValue::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 {
                    format!("{:.1}", f)
                } else {
                    f.to_string()
                }
            }
            ScalarValue::Text(s) => s.clone(),
        }
    }

    /// Native JSON form for the NGSI-LD and GeoJSON representations.
    pub fn to_json(&self) -> Value {
        match self {
            ScalarValue::Bool(b) => Value::Bool(*b),
            ScalarValue::Int(i) => Value::Number(Number::from(*i)),
            ScalarValue::Float(f) => Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ScalarValue::Text(s) => Value::String(s.clone()),
        }
    }

    /// Render an arbitrary JSON value to a cell string.
    ///
    /// Strings are unquoted, numbers and booleans use their natural JSON
    /// text, null renders empty. Nested structures serialize as compact
    /// JSON (opaque pass-through).
    pub fn cell_from_json(value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_booleans_case_insensitive() {
        assert_eq!(ScalarValue::parse("true"), ScalarValue::Bool(true));
        assert_eq!(ScalarValue::parse("True"), ScalarValue::Bool(true));
        assert_eq!(ScalarValue::parse("FALSE"), ScalarValue::Bool(false));
        assert_eq!(ScalarValue::parse("false"), ScalarValue::Bool(false));
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(ScalarValue::parse("42"), ScalarValue::Int(42));
        assert_eq!(ScalarValue::parse("-7"), ScalarValue::Int(-7));
        assert_eq!(ScalarValue::parse("3.14"), ScalarValue::Float(3.14));
        assert_eq!(ScalarValue::parse("-0.5"), ScalarValue::Float(-0.5));
    }

    #[test]
    fn test_parse_falls_through_to_text() {
        assert_eq!(
            ScalarValue::parse("hello"),
            ScalarValue::Text("hello".to_string())
        );
        // Contains a dot but is not a float
        assert_eq!(
            ScalarValue::parse("1.2.3"),
            ScalarValue::Text("1.2.3".to_string())
        );
        // No dot, not an integer
        assert_eq!(
            ScalarValue::parse("10a"),
            ScalarValue::Text("10a".to_string())
        );
        assert_eq!(ScalarValue::parse(""), ScalarValue::Text(String::new()));
    }

    #[test]
    fn test_parse_same_text_same_class() {
        // The heuristic is a pure function of the text
        for raw in ["42", "3.14", "true", "hello"] {
            assert_eq!(ScalarValue::parse(raw), ScalarValue::parse(raw));
        }
    }

    #[test]
    fn test_round_trip_preserves_type_class() {
        for raw in ["42", "3.14", "true", "False", "hello", "2.0"] {
            let decoded = ScalarValue::parse(raw);
            let re_decoded = ScalarValue::parse(&decoded.to_cell());
            assert_eq!(decoded, re_decoded, "round trip changed {}", raw);
        }
    }

    #[test]
    fn test_whole_float_keeps_decimal_point() {
        assert_eq!(ScalarValue::Float(2.0).to_cell(), "2.0");
        assert_eq!(ScalarValue::Float(1.5).to_cell(), "1.5");
        assert_eq!(ScalarValue::Int(2).to_cell(), "2");
    }

    #[test]
    fn test_to_json() {
        assert_eq!(ScalarValue::parse("42").to_json(), json!(42));
        assert_eq!(ScalarValue::parse("1.5").to_json(), json!(1.5));
        assert_eq!(ScalarValue::parse("true").to_json(), json!(true));
        assert_eq!(ScalarValue::parse("hi").to_json(), json!("hi"));
    }

    #[test]
    fn test_cell_from_json() {
        assert_eq!(ScalarValue::cell_from_json(&json!(42)), "42");
        assert_eq!(ScalarValue::cell_from_json(&json!(1.5)), "1.5");
        assert_eq!(ScalarValue::cell_from_json(&json!(true)), "true");
        assert_eq!(ScalarValue::cell_from_json(&json!("hi")), "hi");
        assert_eq!(ScalarValue::cell_from_json(&Value::Null), "");
        assert_eq!(ScalarValue::cell_from_json(&json!([1, 2])), "[1,2]");
    }
}
