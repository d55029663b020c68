use crate::OperationError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Typed parameters of an action, as authored (`values` in the workflow JSON)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Values(Map<String, Value>);

impl Values {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get a value or fail with `MissingValue`
    pub fn require(&self, name: &str) -> Result<&Value, OperationError> {
        self.0
            .get(name)
            .filter(|v| !v.is_null())
            .ok_or_else(|| OperationError::MissingValue(name.to_string()))
    }

    pub fn require_str(&self, name: &str) -> Result<&str, OperationError> {
        let value = self.require(name)?;
        value.as_str().ok_or_else(|| invalid(name, "string", value))
    }

    pub fn require_f64(&self, name: &str) -> Result<f64, OperationError> {
        let value = self.require(name)?;
        value.as_f64().ok_or_else(|| invalid(name, "number", value))
    }

    pub fn require_i64(&self, name: &str) -> Result<i64, OperationError> {
        let value = self.require(name)?;
        value.as_i64().ok_or_else(|| invalid(name, "integer", value))
    }

    pub fn require_u32(&self, name: &str) -> Result<u32, OperationError> {
        let value = self.require(name)?;
        value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| invalid(name, "non-negative integer", value))
    }

    /// A list of non-negative page indices, e.g. `pagesToExtractArray`
    pub fn require_pages(&self, name: &str) -> Result<Vec<u32>, OperationError> {
        let value = self.require(name)?;
        let items = value
            .as_array()
            .ok_or_else(|| invalid(name, "array of page numbers", value))?;

        items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| invalid(name, "array of page numbers", item))
            })
            .collect()
    }

    pub fn require_object(&self, name: &str) -> Result<&Map<String, Value>, OperationError> {
        let value = self.require(name)?;
        value.as_object().ok_or_else(|| invalid(name, "object", value))
    }

    /// Join identifier stored in `values.id`. Numbers are accepted and
    /// normalised to their decimal form.
    pub fn join_id(&self) -> Option<String> {
        match self.0.get("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl From<Map<String, Value>> for Values {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn invalid(field: &str, expected: &str, actual: &Value) -> OperationError {
    OperationError::InvalidValue {
        field: field.to_string(),
        expected: expected.to_string(),
        actual: kind_of(actual).to_string(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_list_rejects_negative_entries() {
        let values = Values::new().with("pagesToExtractArray", json!([1, -2]));
        let err = values.require_pages("pagesToExtractArray").unwrap_err();
        assert_eq!(
            err,
            OperationError::InvalidValue {
                field: "pagesToExtractArray".into(),
                expected: "array of page numbers".into(),
                actual: "number".into(),
            }
        );
    }

    #[test]
    fn null_counts_as_missing() {
        let values = Values::new().with("rotation", Value::Null);
        assert_eq!(
            values.require_f64("rotation"),
            Err(OperationError::MissingValue("rotation".into()))
        );
    }

    #[test]
    fn numeric_join_ids_are_normalised() {
        assert_eq!(Values::new().with("id", 1).join_id(), Some("1".into()));
        assert_eq!(Values::new().with("id", "w1").join_id(), Some("w1".into()));
        assert_eq!(Values::new().with("id", true).join_id(), None);
    }
}
