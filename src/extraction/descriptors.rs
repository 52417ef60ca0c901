use crate::analysis_store::{DescriptorSet, DescriptorValue};
use serde_json::Value;

/// Flattens the nested extractor JSON into dot-joined descriptor names.
///
/// `{"rhythm": {"bpm": 120}}` becomes `rhythm.bpm -> 120.0`. Numeric arrays
/// become vectors (or matrices when nested once), booleans become 0/1, any
/// other leaf is kept as its JSON text.
pub fn flatten_descriptors(root: &Value) -> DescriptorSet {
    let mut descriptors = DescriptorSet::new();
    flatten_into(&mut descriptors, None, root);
    descriptors
}

fn flatten_into(out: &mut DescriptorSet, prefix: Option<&str>, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let name = match prefix {
                    Some(prefix) => format!("{}.{}", prefix, key),
                    None => key.clone(),
                };
                flatten_into(out, Some(&name), child);
            }
        }
        leaf => {
            if let Some(name) = prefix {
                out.insert(name.to_string(), leaf_value(leaf));
            }
        }
    }
}

fn numbers(values: &[Value]) -> Option<Vec<f64>> {
    values.iter().map(Value::as_f64).collect()
}

fn leaf_value(value: &Value) -> DescriptorValue {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) => DescriptorValue::Scalar(f),
            None => DescriptorValue::Text(n.to_string()),
        },
        Value::Bool(b) => DescriptorValue::Scalar(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => DescriptorValue::Text(s.clone()),
        Value::Array(items) => {
            if let Some(vector) = numbers(items) {
                return DescriptorValue::Vector(vector);
            }
            let rows: Option<Vec<Vec<f64>>> = items
                .iter()
                .map(|item| item.as_array().and_then(|row| numbers(row)))
                .collect();
            match rows {
                Some(matrix) => DescriptorValue::Matrix(matrix),
                None => DescriptorValue::Text(value.to_string()),
            }
        }
        other => DescriptorValue::Text(other.to_string()),
    }
}
