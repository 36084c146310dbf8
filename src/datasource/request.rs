//! Typed backend operations decoded from template output.

use crate::store::attribute::item_from_wire;
use crate::store::{AttributeValue, Item};
use crate::value::Value;

/// Page size when a query request does not carry one.
pub const DEFAULT_QUERY_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub enum KeyValueOperation {
    Get { key: Item },
    Put { key: Item, attributes: Item },
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryOperation {
    pub partition_attribute: String,
    pub partition_value: AttributeValue,
    pub limit: usize,
    pub continuation_token: Option<String>,
}

fn operation_name(request: &Value) -> Result<&str, String> {
    if request.as_map().is_none() {
        return Err(format!("request must be a map, got {}", request.kind_name()));
    }
    request
        .get("operation")
        .and_then(Value::as_str)
        .ok_or_else(|| "request is missing a string 'operation'".to_string())
}

fn required<'a>(request: &'a Value, field: &str) -> Result<&'a Value, String> {
    match request.get(field) {
        Some(value) if !value.is_null() => Ok(value),
        _ => Err(format!("request is missing '{}'", field)),
    }
}

impl KeyValueOperation {
    pub fn decode(request: &Value) -> Result<Self, String> {
        match operation_name(request)? {
            "GetItem" => Ok(KeyValueOperation::Get {
                key: item_from_wire(required(request, "key")?)?,
            }),
            "PutItem" => {
                let attributes = match request.get("attributeValues") {
                    None | Some(Value::Null) => Item::new(),
                    Some(wire) => item_from_wire(wire)?,
                };
                Ok(KeyValueOperation::Put {
                    key: item_from_wire(required(request, "key")?)?,
                    attributes,
                })
            }
            other => Err(format!("unsupported key-value operation '{}'", other)),
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self, KeyValueOperation::Put { .. })
    }
}

impl QueryOperation {
    pub fn decode(request: &Value) -> Result<Self, String> {
        match operation_name(request)? {
            "Query" => {}
            other => return Err(format!("unsupported index operation '{}'", other)),
        }

        let query = required(request, "query")?;
        let expression = required(query, "expression")?
            .as_str()
            .ok_or_else(|| "query expression must be a string".to_string())?;
        let (attribute, placeholder) = parse_key_condition(expression)?;
        let wire = query
            .get("expressionValues")
            .and_then(|values| values.get(placeholder))
            .ok_or_else(|| format!("no expression value bound for '{}'", placeholder))?;
        let partition_value = AttributeValue::from_wire(wire)
            .map_err(|e| format!("expression value '{}': {}", placeholder, e))?;

        let limit = match request.get("limit") {
            None | Some(Value::Null) => DEFAULT_QUERY_LIMIT,
            Some(value) => match value.as_u64() {
                Some(n) if n > 0 => n as usize,
                _ => return Err(format!("limit must be a positive integer, got {}", value)),
            },
        };

        let continuation_token = match request.get("continuationToken") {
            None | Some(Value::Null) => None,
            Some(Value::String(token)) => Some(token.clone()),
            Some(other) => {
                return Err(format!(
                    "continuationToken must be a string, got {}",
                    other.kind_name()
                ))
            }
        };

        Ok(QueryOperation {
            partition_attribute: attribute.to_string(),
            partition_value,
            limit,
            continuation_token,
        })
    }
}

/// `"<attribute> = :<name>"` → (`attribute`, `:name`).
fn parse_key_condition(expression: &str) -> Result<(&str, &str), String> {
    let (lhs, rhs) = expression
        .split_once('=')
        .ok_or_else(|| format!("unsupported key condition '{}'", expression))?;
    let (attribute, placeholder) = (lhs.trim(), rhs.trim());
    let valid_attribute = !attribute.is_empty()
        && attribute
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_');
    if !valid_attribute || !placeholder.starts_with(':') || placeholder.len() < 2 {
        return Err(format!("unsupported key condition '{}'", expression));
    }
    Ok((attribute, placeholder))
}

/// Payload of an `Invoke` request.
pub fn decode_invoke(request: &Value) -> Result<Value, String> {
    match operation_name(request)? {
        "Invoke" => Ok(request.get("payload").cloned().unwrap_or(Value::Null)),
        other => Err(format!("unsupported function operation '{}'", other)),
    }
}
