use super::{FieldValues, StoredSource};
use crate::Result;
use serde_json::Value;

/// Stored source parsed once from its JSON blob
#[derive(Debug, Clone, PartialEq)]
pub struct JsonSource {
    root: Value,
}

impl JsonSource {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(Self::new(serde_json::from_slice(bytes)?))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(text)?))
    }

    pub fn root(&self) -> &Value {
        &self.root
    }
}

impl StoredSource for JsonSource {
    fn field_values(&self, path: &str) -> FieldValues<'_> {
        let segments: Vec<&str> = path.split('.').collect();
        let mut out = Vec::new();
        let mut found = false;
        if let Err(kind) = collect_strings(&self.root, &segments, &mut out, &mut found) {
            return FieldValues::Mismatch { found: kind };
        }
        if found {
            FieldValues::Values(out)
        } else {
            FieldValues::Absent
        }
    }
}

/// Walk `segments` below `value`, flattening arrays of objects on the way.
///
/// Keys containing dots are matched before descending, so both
/// `{"a.b": ..}` and `{"a": {"b": ..}}` resolve `a.b`.
fn collect_strings<'a>(
    value: &'a Value,
    segments: &[&str],
    out: &mut Vec<&'a str>,
    found: &mut bool,
) -> std::result::Result<(), &'static str> {
    if segments.is_empty() {
        return collect_leaf(value, out, found);
    }

    match value {
        Value::Object(map) => {
            for split in (1..=segments.len()).rev() {
                let key = segments[..split].join(".");
                if let Some(child) = map.get(&key) {
                    return collect_strings(child, &segments[split..], out, found);
                }
            }
            Ok(())
        }
        Value::Array(items) => {
            for item in items {
                collect_strings(item, segments, out, found)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn collect_leaf<'a>(
    value: &'a Value,
    out: &mut Vec<&'a str>,
    found: &mut bool,
) -> std::result::Result<(), &'static str> {
    match value {
        Value::Null => Ok(()),
        Value::String(s) => {
            *found = true;
            out.push(s.as_str());
            Ok(())
        }
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::Null => {}
                    Value::String(s) => {
                        *found = true;
                        out.push(s.as_str());
                    }
                    other => return Err(kind_name(other)),
                }
            }
            Ok(())
        }
        other => Err(kind_name(other)),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
