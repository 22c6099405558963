use common::model::context::ContextValue;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A runtime value inside the template interpreter.
///
/// `Undefined` carries the name that failed to resolve so errors can point at it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value {
    Undefined(String),
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl From<&ContextValue> for Value {
    fn from(value: &ContextValue) -> Self {
        match value {
            ContextValue::Null => Value::None,
            ContextValue::Bool(b) => Value::Bool(*b),
            ContextValue::Int(i) => Value::Int(*i),
            ContextValue::Float(f) => Value::Float(*f),
            ContextValue::Text(s) => Value::Str(s.clone()),
            ContextValue::List(items) => Value::List(items.iter().map(Value::from).collect()),
            ContextValue::Record(fields) => Value::Map(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl Value {
    pub(crate) fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined(_) | Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(fields) => !fields.is_empty(),
        }
    }

    pub(crate) fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined(_))
    }

    pub(crate) fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined(_) => "undefined",
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Map(_) => "dict",
        }
    }

    /// Error message for using an undefined value where a real one is needed.
    pub(crate) fn undefined_error(&self) -> Option<String> {
        match self {
            Value::Undefined(name) if name.is_empty() => Some("value is undefined".to_string()),
            Value::Undefined(name) => Some(format!("'{}' is undefined", name)),
            _ => None,
        }
    }

    /// How the value prints in template output.
    pub(crate) fn display(&self) -> String {
        match self {
            Value::Undefined(_) => String::new(),
            Value::Str(s) => s.clone(),
            other => other.repr(),
        }
    }

    /// Literal form, used for nested values and `%r`.
    pub(crate) fn repr(&self) -> String {
        match self {
            Value::Undefined(_) => String::new(),
            Value::None => "None".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Str(s) => quote(s),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(Value::repr).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Map(fields) => {
                let parts: Vec<String> = fields
                    .iter()
                    .map(|(k, v)| format!("{}: {}", quote(k), v.repr()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
        }
    }

    /// Items produced when the value is looped over.
    pub(crate) fn iterate(&self) -> Result<Vec<Value>, String> {
        match self {
            Value::Undefined(_) => Ok(Vec::new()),
            Value::List(items) => Ok(items.clone()),
            Value::Map(fields) => Ok(fields.keys().cloned().map(Value::Str).collect()),
            Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
            other => Err(format!("'{}' object is not iterable", other.type_name())),
        }
    }
}

/// Floats always keep a fractional part or an exponent (`2.0`, `1e+16`).
pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = f.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let formatted = format!("{:e}", f);
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) => {
                let exponent: i32 = exponent.parse().unwrap_or(0);
                let sign = if exponent < 0 { '-' } else { '+' };
                format!("{}e{}{:02}", mantissa, sign, exponent.abs())
            }
            None => formatted,
        };
    }
    if f.fract() == 0.0 {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

fn quote(s: &str) -> String {
    if s.contains('\'') && !s.contains('"') {
        return format!("\"{}\"", s.replace('\\', "\\\\"));
    }
    let escaped = s.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}'", escaped)
}

pub(crate) fn equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => *x as f64 == *y,
        (Value::Undefined(_), Value::Undefined(_)) => true,
        (Value::List(x), Value::List(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| equals(l, r))
        }
        (Value::Map(x), Value::Map(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|other| equals(v, other)))
        }
        _ => a == b,
    }
}

pub(crate) fn compare(a: &Value, b: &Value, symbol: &str) -> Result<Ordering, String> {
    let unsupported = || {
        format!(
            "'{}' not supported between instances of '{}' and '{}'",
            symbol,
            a.type_name(),
            b.type_name()
        )
    };
    if let Some(message) = a.undefined_error().or_else(|| b.undefined_error()) {
        return Err(message);
    }
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
        _ => match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).ok_or_else(unsupported),
            _ => Err(unsupported()),
        },
    }
}

pub(crate) fn contains(haystack: &Value, needle: &Value) -> Result<bool, String> {
    match haystack {
        Value::Undefined(_) => Ok(false),
        Value::Str(s) => match needle {
            Value::Str(n) => Ok(s.contains(n.as_str())),
            other => Err(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            )),
        },
        Value::List(items) => Ok(items.iter().any(|item| equals(item, needle))),
        Value::Map(fields) => Ok(match needle {
            Value::Str(key) => fields.contains_key(key),
            _ => false,
        }),
        other => Err(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        )),
    }
}
