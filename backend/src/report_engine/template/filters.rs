//! Filters, tests, global functions and value methods available to templates.

use super::value::{compare, format_float, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;

const FILTERS: &[&str] = &[
    "format_comma",
    "round",
    "default",
    "d",
    "length",
    "count",
    "upper",
    "lower",
    "title",
    "capitalize",
    "trim",
    "abs",
    "int",
    "float",
    "string",
    "join",
    "first",
    "last",
    "replace",
    "format",
    "sum",
    "min",
    "max",
];

const TESTS: &[&str] = &["defined", "undefined", "none", "number", "string", "even", "odd"];

const MAX_RANGE: i64 = 100_000;

pub(crate) fn is_filter(name: &str) -> bool {
    FILTERS.contains(&name)
}

pub(crate) fn is_test(name: &str) -> bool {
    TESTS.contains(&name)
}

/// Evaluated call arguments.
#[derive(Debug, Default)]
pub(crate) struct CallArgs {
    pub positional: Vec<Value>,
    pub keyword: Vec<(String, Value)>,
}

impl CallArgs {
    /// Argument by position, falling back to its keyword name.
    fn get(&self, index: usize, name: &str) -> Option<&Value> {
        self.positional.get(index).or_else(|| {
            self.keyword
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value)
        })
    }

    fn get_str(&self, index: usize, name: &str, default: &str) -> String {
        self.get(index, name)
            .map(Value::display)
            .unwrap_or_else(|| default.to_string())
    }
}

pub(crate) fn apply_filter(name: &str, value: Value, args: &CallArgs) -> Result<Value, String> {
    match name {
        "format_comma" => Ok(Value::Str(format_comma(&value))),
        "round" => round(value, args),
        "default" | "d" => {
            let use_default = if args.get(1, "boolean").is_some_and(Value::is_truthy) {
                !value.is_truthy()
            } else {
                value.is_undefined()
            };
            if use_default {
                Ok(args
                    .get(0, "default_value")
                    .cloned()
                    .unwrap_or_else(|| Value::Str(String::new())))
            } else {
                Ok(value)
            }
        }
        "length" | "count" => length(&value).map(Value::Int),
        "upper" => Ok(Value::Str(value.display().to_uppercase())),
        "lower" => Ok(Value::Str(value.display().to_lowercase())),
        "title" => Ok(Value::Str(title_case(&value.display()))),
        "capitalize" => Ok(Value::Str(capitalize(&value.display()))),
        "trim" => Ok(Value::Str(value.display().trim().to_string())),
        "abs" => match value {
            Value::Int(i) => Ok(i.checked_abs().map_or(Value::Float((i as f64).abs()), Value::Int)),
            Value::Float(f) => Ok(Value::Float(f.abs())),
            other => Err(format!("bad operand type for abs(): '{}'", other.type_name())),
        },
        "int" => {
            let fallback = args.get(0, "default").cloned().unwrap_or(Value::Int(0));
            Ok(to_int(&value).map_or(fallback, Value::Int))
        }
        "float" => {
            let fallback = args.get(0, "default").cloned().unwrap_or(Value::Float(0.0));
            Ok(to_float(&value).map_or(fallback, Value::Float))
        }
        "string" => Ok(Value::Str(value.display())),
        "join" => {
            let separator = args.get_str(0, "d", "");
            let parts: Vec<String> = value.iterate()?.iter().map(Value::display).collect();
            Ok(Value::Str(parts.join(&separator)))
        }
        "first" => Ok(value
            .iterate()?
            .into_iter()
            .next()
            .unwrap_or_else(|| Value::Undefined("first".to_string()))),
        "last" => Ok(value
            .iterate()?
            .pop()
            .unwrap_or_else(|| Value::Undefined("last".to_string()))),
        "replace" => {
            let old = args.get_str(0, "old", "");
            let new = args.get_str(1, "new", "");
            let text = value.display();
            match args.get(2, "count") {
                Some(Value::Int(count)) if *count >= 0 => Ok(Value::Str(text.replacen(
                    &old,
                    &new,
                    usize::try_from(*count).unwrap_or(usize::MAX),
                ))),
                _ => Ok(Value::Str(text.replace(&old, &new))),
            }
        }
        "format" => printf(&value.display(), &args.positional).map(Value::Str),
        "sum" => sum(value, args),
        "min" => extreme(value, args, Ordering::Less),
        "max" => extreme(value, args, Ordering::Greater),
        other => Err(format!("no filter named '{}'", other)),
    }
}

pub(crate) fn apply_test(name: &str, value: &Value) -> Result<bool, String> {
    match name {
        "defined" => Ok(!value.is_undefined()),
        "undefined" => Ok(value.is_undefined()),
        "none" => Ok(matches!(value, Value::None)),
        "number" => Ok(matches!(value, Value::Int(_) | Value::Float(_))),
        "string" => Ok(matches!(value, Value::Str(_))),
        "even" | "odd" => {
            let remainder = match value {
                Value::Int(i) => i.rem_euclid(2),
                Value::Float(f) if f.fract() == 0.0 => f.rem_euclid(2.0) as i64,
                other => {
                    return Err(format!("'{}' test needs a number, got {}", name, other.type_name()))
                }
            };
            Ok((remainder == 0) == (name == "even"))
        }
        other => Err(format!("no test named '{}'", other)),
    }
}

pub(crate) fn call_global(name: &str, args: &CallArgs) -> Result<Value, String> {
    match name {
        "format_comma" => {
            let value = args
                .positional
                .first()
                .ok_or("format_comma() takes exactly one argument")?;
            Ok(Value::Str(format_comma(value)))
        }
        "range" => {
            let bounds: Vec<i64> = args
                .positional
                .iter()
                .map(|arg| match arg {
                    Value::Int(i) => Ok(*i),
                    other => Err(format!(
                        "'{}' object cannot be interpreted as an integer",
                        other.type_name()
                    )),
                })
                .collect::<Result<_, _>>()?;
            let (start, stop, step) = match bounds.as_slice() {
                [stop] => (0, *stop, 1),
                [start, stop] => (*start, *stop, 1),
                [start, stop, step] => (*start, *stop, *step),
                _ => return Err("range expected 1 to 3 arguments".to_string()),
            };
            if step == 0 {
                return Err("range() arg 3 must not be zero".to_string());
            }
            let mut items = Vec::new();
            let mut current = start;
            while (step > 0 && current < stop) || (step < 0 && current > stop) {
                if items.len() as i64 >= MAX_RANGE {
                    return Err(format!("range is limited to {} items", MAX_RANGE));
                }
                items.push(Value::Int(current));
                current = match current.checked_add(step) {
                    Some(next) => next,
                    None => break,
                };
            }
            Ok(Value::List(items))
        }
        other => Err(format!("'{}' is undefined", other)),
    }
}

/// `value.method(args)` on records and strings.
pub(crate) fn call_method(value: &Value, method: &str, args: &CallArgs) -> Result<Value, String> {
    if let Some(message) = value.undefined_error() {
        return Err(message);
    }
    match (value, method) {
        (Value::Map(fields), "items") => Ok(Value::List(
            fields
                .iter()
                .map(|(k, v)| Value::List(vec![Value::Str(k.clone()), v.clone()]))
                .collect(),
        )),
        (Value::Map(fields), "keys") => Ok(Value::List(
            fields.keys().cloned().map(Value::Str).collect(),
        )),
        (Value::Map(fields), "values") => Ok(Value::List(fields.values().cloned().collect())),
        (Value::Map(fields), "get") => {
            let key = args.get_str(0, "key", "");
            Ok(fields
                .get(&key)
                .cloned()
                .or_else(|| args.get(1, "default").cloned())
                .unwrap_or(Value::None))
        }
        (Value::Str(s), "upper") => Ok(Value::Str(s.to_uppercase())),
        (Value::Str(s), "lower") => Ok(Value::Str(s.to_lowercase())),
        (Value::Str(s), "strip") => Ok(Value::Str(s.trim().to_string())),
        (Value::Str(s), "title") => Ok(Value::Str(title_case(s))),
        (Value::Str(s), "capitalize") => Ok(Value::Str(capitalize(s))),
        (Value::Str(s), "startswith") => Ok(Value::Bool(s.starts_with(&args.get_str(0, "prefix", "")))),
        (Value::Str(s), "endswith") => Ok(Value::Bool(s.ends_with(&args.get_str(0, "suffix", "")))),
        (Value::Str(s), "replace") => Ok(Value::Str(
            s.replace(&args.get_str(0, "old", ""), &args.get_str(1, "new", "")),
        )),
        (other, _) => Err(format!(
            "'{}' object has no attribute '{}'",
            other.type_name(),
            method
        )),
    }
}

/// Integer with thousands separators. Floats are truncated; strings holding an
/// integer are parsed; anything else prints unchanged.
pub(crate) fn format_comma(value: &Value) -> String {
    match value {
        Value::Int(i) => thousands(*i),
        Value::Bool(b) => thousands(i64::from(*b)),
        Value::Float(f) if f.is_finite() => group_digits(f.trunc() as i128),
        Value::Str(s) => match s.trim().parse::<i64>() {
            Ok(i) => thousands(i),
            Err(_) => s.clone(),
        },
        other => other.display(),
    }
}

pub fn thousands(n: i64) -> String {
    group_digits(i128::from(n))
}

fn group_digits(n: i128) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

fn round(value: Value, args: &CallArgs) -> Result<Value, String> {
    let precision = match args.get(0, "precision") {
        None => 0,
        Some(Value::Int(p)) => (*p).clamp(-30, 30) as i32,
        Some(other) => {
            return Err(format!(
                "round precision must be an integer, got {}",
                other.type_name()
            ))
        }
    };
    let method = args.get_str(1, "method", "common");
    if !matches!(method.as_str(), "common" | "floor" | "ceil") {
        return Err("round method must be 'common', 'ceil' or 'floor'".to_string());
    }

    let number = match value {
        Value::Int(i) if method == "common" && precision >= 0 => return Ok(Value::Int(i)),
        Value::Int(i) => i as f64,
        Value::Float(f) => f,
        other => {
            return Err(format!(
                "type {} doesn't define __round__ method",
                other.type_name()
            ))
        }
    };
    let scale = 10f64.powi(precision);
    let rounded = match method.as_str() {
        "floor" => (number * scale).floor() / scale,
        "ceil" => (number * scale).ceil() / scale,
        _ => round_half_even(number, precision),
    };
    Ok(Value::Float(rounded))
}

/// Decimal rounding with ties to even, on the exact binary value.
fn round_half_even(number: f64, precision: i32) -> f64 {
    if !number.is_finite() {
        return number;
    }
    if precision >= 0 {
        format!("{:.*}", precision as usize, number)
            .parse()
            .unwrap_or(number)
    } else {
        let scale = 10f64.powi(-precision);
        (number / scale).round_ties_even() * scale
    }
}

/// `attribute` may be dotted (`stats.views`). Without one the item itself is used.
fn attribute_of(item: &Value, attribute: Option<&Value>) -> Value {
    match attribute {
        None | Some(Value::None) => item.clone(),
        Some(path) => path
            .display()
            .split('.')
            .fold(item.clone(), |current, key| match current {
                Value::Map(mut fields) => fields
                    .remove(key)
                    .unwrap_or_else(|| Value::Undefined(key.to_string())),
                _ => Value::Undefined(key.to_string()),
            }),
    }
}

fn sum(value: Value, args: &CallArgs) -> Result<Value, String> {
    let attribute = args.get(0, "attribute");
    let mut total = args.get(1, "start").cloned().unwrap_or(Value::Int(0));
    for item in value.iterate()? {
        let term = attribute_of(&item, attribute);
        total = match (&total, &term) {
            (Value::Int(a), Value::Int(b)) => a
                .checked_add(*b)
                .map_or(Value::Float(*a as f64 + *b as f64), Value::Int),
            _ => match (total.as_number(), term.as_number()) {
                (Some(a), Some(b)) => Value::Float(a + b),
                _ => {
                    return Err(format!(
                        "unsupported operand type(s) for +: '{}' and '{}'",
                        total.type_name(),
                        term.type_name()
                    ))
                }
            },
        };
    }
    Ok(total)
}

/// Smallest (`Less`) or largest (`Greater`) item. Strings compare without case
/// unless `case_sensitive` is set. Empty sequences give an undefined value.
fn extreme(value: Value, args: &CallArgs, wanted: Ordering) -> Result<Value, String> {
    let case_sensitive = args.get(0, "case_sensitive").is_some_and(Value::is_truthy);
    let attribute = args.get(1, "attribute");
    let key_of = |item: &Value| match attribute_of(item, attribute) {
        Value::Str(s) if !case_sensitive => Value::Str(s.to_lowercase()),
        other => other,
    };
    let symbol = if wanted == Ordering::Less { "<" } else { ">" };

    let mut best: Option<(Value, Value)> = None;
    for item in value.iterate()? {
        let key = key_of(&item);
        let better = match &best {
            None => true,
            Some((best_key, _)) => compare(&key, best_key, symbol)? == wanted,
        };
        if better {
            best = Some((key, item));
        }
    }
    Ok(best.map_or_else(
        || Value::Undefined(String::new()),
        |(_, item)| item,
    ))
}

fn length(value: &Value) -> Result<i64, String> {
    let len = match value {
        Value::Undefined(_) => 0,
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.len(),
        Value::Map(fields) => fields.len(),
        other => {
            return Err(format!(
                "object of type '{}' has no len()",
                other.type_name()
            ))
        }
    };
    Ok(i64::try_from(len).unwrap_or(i64::MAX))
}

fn to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Int(i) => Some(*i),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Float(f) if f.is_finite() => Some(f.trunc() as i64),
        Value::Str(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    }
}

fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Float(f) => Some(*f),
        Value::Str(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut start_of_word = true;
    for ch in s.chars() {
        if ch.is_alphanumeric() {
            if start_of_word {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            start_of_word = false;
        } else {
            out.push(ch);
            start_of_word = true;
        }
    }
    out
}

#[derive(Default)]
struct Spec {
    left: bool,
    plus: bool,
    space: bool,
    zero: bool,
    width: usize,
    precision: Option<usize>,
}

/// printf-style formatting (`%s`, `%d`, `%i`, `%f`, `%r`, `%%`) with flags,
/// width and precision.
pub(crate) fn printf(format: &str, args: &[Value]) -> Result<String, String> {
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars().peekable();
    let mut remaining = args.iter();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut spec = Spec::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => spec.left = true,
                '+' => spec.plus = true,
                ' ' => spec.space = true,
                '0' => spec.zero = true,
                '#' => {}
                _ => break,
            }
            chars.next();
        }
        spec.width = take_number(&mut chars).unwrap_or(0);
        if chars.peek() == Some(&'.') {
            chars.next();
            spec.precision = Some(take_number(&mut chars).unwrap_or(0));
        }

        let conversion = chars.next().ok_or("incomplete format")?;
        if conversion == '%' {
            out.push('%');
            continue;
        }
        let arg = remaining
            .next()
            .ok_or("not enough arguments for format string")?;

        let (sign, body) = match conversion {
            's' => {
                let text = arg.display();
                let text = match spec.precision {
                    Some(p) => text.chars().take(p).collect(),
                    None => text,
                };
                (String::new(), text)
            }
            'r' => (String::new(), arg.repr()),
            'd' | 'i' => {
                let n = match arg {
                    Value::Int(i) => *i,
                    Value::Bool(b) => i64::from(*b),
                    Value::Float(f) if f.is_finite() => f.trunc() as i64,
                    other => {
                        return Err(format!(
                            "%{} format: a number is required, not {}",
                            conversion,
                            other.type_name()
                        ))
                    }
                };
                (sign_of(n < 0, &spec), n.unsigned_abs().to_string())
            }
            'f' | 'F' => {
                let f = match arg {
                    Value::Int(i) => *i as f64,
                    Value::Bool(b) => f64::from(u8::from(*b)),
                    Value::Float(f) => *f,
                    other => {
                        return Err(format!("must be real number, not {}", other.type_name()))
                    }
                };
                let body = if f.is_finite() {
                    format!("{:.*}", spec.precision.unwrap_or(6), f.abs())
                } else {
                    format_float(f.abs())
                };
                (sign_of(f.is_sign_negative() && !f.is_nan(), &spec), body)
            }
            other => return Err(format!("unsupported format character '{}'", other)),
        };

        let len = sign.chars().count() + body.chars().count();
        let pad = spec.width.saturating_sub(len);
        if spec.left {
            out.push_str(&sign);
            out.push_str(&body);
            out.extend(std::iter::repeat(' ').take(pad));
        } else if spec.zero && conversion != 's' && conversion != 'r' {
            out.push_str(&sign);
            out.extend(std::iter::repeat('0').take(pad));
            out.push_str(&body);
        } else {
            out.extend(std::iter::repeat(' ').take(pad));
            out.push_str(&sign);
            out.push_str(&body);
        }
    }

    if remaining.next().is_some() {
        return Err("not all arguments converted during string formatting".to_string());
    }
    Ok(out)
}

fn sign_of(negative: bool, spec: &Spec) -> String {
    if negative {
        "-".to_string()
    } else if spec.plus {
        "+".to_string()
    } else if spec.space {
        " ".to_string()
    } else {
        String::new()
    }
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<usize> {
    let mut digits = String::new();
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    digits.parse().ok()
}

/// Record value with fixed keys, such as the `loop` variable.
pub(crate) fn record<I>(pairs: I) -> Value
where
    I: IntoIterator<Item = (&'static str, Value)>,
{
    Value::Map(
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect::<BTreeMap<_, _>>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(positional: Vec<Value>) -> CallArgs {
        CallArgs {
            positional,
            keyword: Vec::new(),
        }
    }

    fn s(text: &str) -> Value {
        Value::Str(text.to_string())
    }

    #[test]
    fn format_comma_groups_thousands() {
        assert_eq!(format_comma(&Value::Int(1234567)), "1,234,567");
        assert_eq!(format_comma(&Value::Int(-1234)), "-1,234");
        assert_eq!(format_comma(&Value::Int(999)), "999");
        assert_eq!(format_comma(&Value::Float(2500000.9)), "2,500,000");
        assert_eq!(format_comma(&s("1000")), "1,000");
        assert_eq!(format_comma(&s("abc")), "abc");
        assert_eq!(format_comma(&s("12.5")), "12.5");
        assert_eq!(format_comma(&Value::None), "None");
    }

    #[test]
    fn round_follows_precision_and_method() {
        let two = args(vec![Value::Int(2)]);
        assert_eq!(round(Value::Float(3.14159), &two).unwrap(), Value::Float(3.14));
        assert_eq!(round(Value::Float(2.5), &CallArgs::default()).unwrap(), Value::Float(2.0));
        assert_eq!(round(Value::Int(7), &CallArgs::default()).unwrap(), Value::Int(7));
        let floor = CallArgs {
            positional: vec![Value::Int(1)],
            keyword: vec![("method".to_string(), s("floor"))],
        };
        assert_eq!(round(Value::Float(1.99), &floor).unwrap(), Value::Float(1.9));
        assert!(round(s("x"), &CallArgs::default()).is_err());
    }

    #[test]
    fn default_only_replaces_undefined_unless_boolean() {
        let fallback = args(vec![s("n/a")]);
        assert_eq!(
            apply_filter("default", Value::Undefined("x".to_string()), &fallback).unwrap(),
            s("n/a")
        );
        assert_eq!(apply_filter("d", Value::Int(0), &fallback).unwrap(), Value::Int(0));
        let boolean = args(vec![s("n/a"), Value::Bool(true)]);
        assert_eq!(apply_filter("default", s(""), &boolean).unwrap(), s("n/a"));
    }

    #[test]
    fn printf_handles_signs_and_precision() {
        assert_eq!(printf("%+.1f%%", &[Value::Float(12.345)]).unwrap(), "+12.3%");
        assert_eq!(printf("%+.1f", &[Value::Float(-0.04)]).unwrap(), "-0.0");
        assert_eq!(printf("%05d|%-4s|", &[Value::Int(42), s("ab")]).unwrap(), "00042|ab  |");
        assert_eq!(printf("%s and %s", &[s("a"), Value::Int(1)]).unwrap(), "a and 1");
        assert!(printf("%s %s", &[s("a")]).is_err());
        assert!(printf("%s", &[s("a"), s("b")]).is_err());
        assert!(printf("%d", &[s("a")]).is_err());
    }

    #[test]
    fn string_filters() {
        let none = CallArgs::default();
        assert_eq!(apply_filter("title", s("day parts"), &none).unwrap(), s("Day Parts"));
        assert_eq!(apply_filter("capitalize", s("hELLO"), &none).unwrap(), s("Hello"));
        assert_eq!(apply_filter("length", s("héllo"), &none).unwrap(), Value::Int(5));
        assert_eq!(
            apply_filter("join", Value::List(vec![s("a"), Value::Int(1)]), &args(vec![s(", ")]))
                .unwrap(),
            s("a, 1")
        );
        assert_eq!(apply_filter("int", s("12.9"), &none).unwrap(), Value::Int(12));
        assert_eq!(apply_filter("int", s("x"), &none).unwrap(), Value::Int(0));
    }

    #[test]
    fn range_builds_integer_lists() {
        assert_eq!(
            call_global("range", &args(vec![Value::Int(3)])).unwrap(),
            Value::List(vec![Value::Int(0), Value::Int(1), Value::Int(2)])
        );
        assert_eq!(
            call_global("range", &args(vec![Value::Int(5), Value::Int(0), Value::Int(-2)]))
                .unwrap(),
            Value::List(vec![Value::Int(5), Value::Int(3), Value::Int(1)])
        );
        assert!(call_global("range", &args(vec![Value::Int(1), Value::Int(2), Value::Int(0)]))
            .is_err());
        assert!(call_global("shout", &CallArgs::default()).is_err());
    }

    #[test]
    fn sum_min_and_max() {
        let numbers = Value::List(vec![Value::Int(3), Value::Float(1.5), Value::Int(7)]);
        assert_eq!(apply_filter("sum", numbers.clone(), &args(vec![])).unwrap(), Value::Float(11.5));
        assert_eq!(apply_filter("min", numbers.clone(), &args(vec![])).unwrap(), Value::Float(1.5));
        assert_eq!(apply_filter("max", numbers, &args(vec![])).unwrap(), Value::Int(7));

        let rows = Value::List(vec![
            record([("name", s("b")), ("views", Value::Int(10))]),
            record([("name", s("A")), ("views", Value::Int(25))]),
        ]);
        let by_views = CallArgs {
            positional: vec![],
            keyword: vec![("attribute".to_string(), s("views"))],
        };
        assert_eq!(apply_filter("sum", rows.clone(), &by_views).unwrap(), Value::Int(35));
        assert_eq!(
            apply_filter("max", rows.clone(), &by_views).unwrap(),
            record([("name", s("A")), ("views", Value::Int(25))])
        );
        let by_name = CallArgs {
            positional: vec![],
            keyword: vec![("attribute".to_string(), s("name"))],
        };
        assert_eq!(
            apply_filter("min", rows, &by_name).unwrap(),
            record([("name", s("A")), ("views", Value::Int(25))])
        );

        let empty = Value::List(vec![]);
        assert_eq!(apply_filter("sum", empty.clone(), &args(vec![])).unwrap(), Value::Int(0));
        assert!(apply_filter("max", empty, &args(vec![])).unwrap().is_undefined());
        assert!(apply_filter("sum", Value::List(vec![s("x")]), &args(vec![])).is_err());
    }

    #[test]
    fn even_and_odd() {
        assert!(apply_test("even", &Value::Int(4)).unwrap());
        assert!(apply_test("odd", &Value::Int(-3)).unwrap());
        assert!(apply_test("even", &s("x")).is_err());
    }
}
