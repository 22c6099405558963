use super::filters::{self, CallArgs};
use super::parser::{Args, BinaryOp, CompareOp, Expr, Node, UnaryOp};
use super::value::{compare, contains, equals, Value};
use crate::report_engine::error::TemplateError;
use common::model::context::ReportContext;
use std::cmp::Ordering;
use std::collections::BTreeMap;

type Scope = BTreeMap<String, Value>;

pub(crate) fn render(nodes: &[Node], context: &ReportContext) -> Result<String, TemplateError> {
    let globals: Scope = context
        .iter()
        .map(|(key, value)| (key.clone(), Value::from(value)))
        .collect();
    let mut renderer = Renderer {
        scopes: vec![globals],
        out: String::new(),
    };
    renderer.render_nodes(nodes)?;
    Ok(renderer.out)
}

struct Renderer {
    scopes: Vec<Scope>,
    out: String,
}

impl Renderer {
    fn render_nodes(&mut self, nodes: &[Node]) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Text(text) => self.out.push_str(text),
                Node::Output { expr, line } => {
                    let value = self.eval(expr).map_err(|e| TemplateError::render(*line, e))?;
                    self.out.push_str(&value.display());
                }
                Node::If {
                    branches,
                    otherwise,
                    line,
                } => {
                    let mut taken = None;
                    for (test, body) in branches {
                        let value = self.eval(test).map_err(|e| TemplateError::render(*line, e))?;
                        if value.is_truthy() {
                            taken = Some(body);
                            break;
                        }
                    }
                    self.render_nodes(taken.unwrap_or(otherwise))?;
                }
                Node::For {
                    targets,
                    iterable,
                    condition,
                    body,
                    otherwise,
                    line,
                } => {
                    let mut items = self
                        .eval(iterable)
                        .and_then(|value| value.iterate())
                        .map_err(|e| TemplateError::render(*line, e))?;
                    if let Some(condition) = condition {
                        items = self
                            .keep_matching(targets, items, condition)
                            .map_err(|e| TemplateError::render(*line, e))?;
                    }
                    if items.is_empty() {
                        self.render_nodes(otherwise)?;
                        continue;
                    }
                    let length = items.len();
                    for (index, item) in items.into_iter().enumerate() {
                        let mut scope =
                            bind_targets(targets, item).map_err(|e| TemplateError::render(*line, e))?;
                        scope.insert("loop".to_string(), loop_record(index, length));
                        self.scopes.push(scope);
                        let result = self.render_nodes(body);
                        self.scopes.pop();
                        result?;
                    }
                }
                Node::Set { name, value, line } => {
                    let value = self.eval(value).map_err(|e| TemplateError::render(*line, e))?;
                    if let Some(scope) = self.scopes.last_mut() {
                        scope.insert(name.clone(), value);
                    }
                }
            }
        }
        Ok(())
    }

    /// Items for which `condition` holds with the loop targets bound.
    fn keep_matching(
        &mut self,
        targets: &[String],
        items: Vec<Value>,
        condition: &Expr,
    ) -> Result<Vec<Value>, String> {
        let mut kept = Vec::with_capacity(items.len());
        for item in items {
            self.scopes.push(bind_targets(targets, item.clone())?);
            let keep = self.eval(condition).map(|value| value.is_truthy());
            self.scopes.pop();
            if keep? {
                kept.push(item);
            }
        }
        Ok(kept)
    }

    fn lookup(&self, name: &str) -> Value {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .cloned()
            .unwrap_or_else(|| Value::Undefined(name.to_string()))
    }

    fn eval(&self, expr: &Expr) -> Result<Value, String> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::List(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<Result<_, _>>()
                .map(Value::List),
            Expr::Var(name) => Ok(self.lookup(name)),
            Expr::Attr(target, name) => {
                let target = self.eval(target)?;
                attribute(&target, name)
            }
            Expr::Item(target, key) => {
                let target = self.eval(target)?;
                let key = self.eval(key)?;
                subscript(&target, &key)
            }
            Expr::Call(callee, args) => {
                let args = self.eval_args(args)?;
                match callee.as_ref() {
                    Expr::Attr(target, method) => {
                        let target = self.eval(target)?;
                        filters::call_method(&target, method, &args)
                    }
                    Expr::Var(name) => filters::call_global(name, &args),
                    _ => Err("object is not callable".to_string()),
                }
            }
            Expr::Filter { name, value, args } => {
                let value = self.eval(value)?;
                let args = self.eval_args(args)?;
                filters::apply_filter(name, value, &args)
            }
            Expr::Test {
                name,
                value,
                negated,
            } => {
                let value = self.eval(value)?;
                Ok(Value::Bool(filters::apply_test(name, &value)? != *negated))
            }
            Expr::Unary(op, operand) => {
                let value = self.eval(operand)?;
                unary(*op, value)
            }
            Expr::Binary(op, left, right) => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                binary(*op, left, right)
            }
            Expr::And(left, right) => {
                let left = self.eval(left)?;
                if left.is_truthy() {
                    self.eval(right)
                } else {
                    Ok(left)
                }
            }
            Expr::Or(left, right) => {
                let left = self.eval(left)?;
                if left.is_truthy() {
                    Ok(left)
                } else {
                    self.eval(right)
                }
            }
            Expr::Compare(first, rest) => {
                let mut left = self.eval(first)?;
                for (op, right) in rest {
                    let right = self.eval(right)?;
                    if !compare_values(*op, &left, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            Expr::Conditional {
                test,
                then,
                otherwise,
            } => {
                if self.eval(test)?.is_truthy() {
                    self.eval(then)
                } else {
                    match otherwise {
                        Some(otherwise) => self.eval(otherwise),
                        None => Ok(Value::Undefined(String::new())),
                    }
                }
            }
        }
    }

    fn eval_args(&self, args: &Args) -> Result<CallArgs, String> {
        Ok(CallArgs {
            positional: args
                .positional
                .iter()
                .map(|arg| self.eval(arg))
                .collect::<Result<_, _>>()?,
            keyword: args
                .keyword
                .iter()
                .map(|(name, arg)| Ok((name.clone(), self.eval(arg)?)))
                .collect::<Result<_, String>>()?,
        })
    }
}

fn bind_targets(targets: &[String], item: Value) -> Result<Scope, String> {
    let mut scope = Scope::new();
    if let [target] = targets {
        scope.insert(target.clone(), item);
        return Ok(scope);
    }
    let parts = match item {
        Value::List(parts) => parts,
        other => {
            return Err(format!(
                "cannot unpack '{}' into {} names",
                other.type_name(),
                targets.len()
            ))
        }
    };
    if parts.len() != targets.len() {
        return Err(format!(
            "expected {} values to unpack, got {}",
            targets.len(),
            parts.len()
        ));
    }
    scope.extend(targets.iter().cloned().zip(parts));
    Ok(scope)
}

fn loop_record(index: usize, length: usize) -> Value {
    let as_int = |n: usize| Value::Int(i64::try_from(n).unwrap_or(i64::MAX));
    filters::record([
        ("index", as_int(index + 1)),
        ("index0", as_int(index)),
        ("revindex", as_int(length - index)),
        ("revindex0", as_int(length - index - 1)),
        ("first", Value::Bool(index == 0)),
        ("last", Value::Bool(index + 1 == length)),
        ("length", as_int(length)),
    ])
}

fn attribute(target: &Value, name: &str) -> Result<Value, String> {
    if let Some(message) = target.undefined_error() {
        return Err(message);
    }
    Ok(match target {
        Value::Map(fields) => fields
            .get(name)
            .cloned()
            .unwrap_or_else(|| Value::Undefined(name.to_string())),
        _ => Value::Undefined(name.to_string()),
    })
}

fn subscript(target: &Value, key: &Value) -> Result<Value, String> {
    if let Some(message) = target.undefined_error() {
        return Err(message);
    }
    let missing = || Value::Undefined(key.display());
    Ok(match (target, key) {
        (Value::Map(fields), Value::Str(k)) => fields.get(k).cloned().unwrap_or_else(missing),
        (Value::List(items), Value::Int(i)) => {
            resolve_index(*i, items.len()).map_or_else(missing, |i| items[i].clone())
        }
        (Value::Str(s), Value::Int(i)) => {
            let chars: Vec<char> = s.chars().collect();
            resolve_index(*i, chars.len()).map_or_else(missing, |i| Value::Str(chars[i].to_string()))
        }
        _ => missing(),
    })
}

/// Python-style index, negative counting from the end.
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let resolved = if index < 0 { index + len } else { index };
    if (0..len).contains(&resolved) {
        usize::try_from(resolved).ok()
    } else {
        None
    }
}

fn unary(op: UnaryOp, value: Value) -> Result<Value, String> {
    if op == UnaryOp::Not {
        return Ok(Value::Bool(!value.is_truthy()));
    }
    if let Some(message) = value.undefined_error() {
        return Err(message);
    }
    match (op, value) {
        (UnaryOp::Neg, Value::Int(i)) => Ok(i
            .checked_neg()
            .map_or(Value::Float(-(i as f64)), Value::Int)),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Pos, value @ (Value::Int(_) | Value::Float(_))) => Ok(value),
        (_, other) => Err(format!(
            "bad operand type for unary operator: '{}'",
            other.type_name()
        )),
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, String> {
    if op == BinaryOp::Concat {
        return Ok(Value::Str(left.display() + &right.display()));
    }
    if let Some(message) = left.undefined_error().or_else(|| right.undefined_error()) {
        return Err(message);
    }
    let unsupported = |symbol: &str, l: &Value, r: &Value| {
        format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            symbol,
            l.type_name(),
            r.type_name()
        )
    };

    match (op, left, right) {
        (BinaryOp::Add, Value::Int(a), Value::Int(b)) => {
            Ok(a.checked_add(b).map_or(Value::Float(a as f64 + b as f64), Value::Int))
        }
        (BinaryOp::Sub, Value::Int(a), Value::Int(b)) => {
            Ok(a.checked_sub(b).map_or(Value::Float(a as f64 - b as f64), Value::Int))
        }
        (BinaryOp::Mul, Value::Int(a), Value::Int(b)) => {
            Ok(a.checked_mul(b).map_or(Value::Float(a as f64 * b as f64), Value::Int))
        }
        (BinaryOp::FloorDiv, Value::Int(a), Value::Int(b)) => {
            if b == 0 {
                return Err("integer division or modulo by zero".to_string());
            }
            let quotient = a.wrapping_div(b);
            let adjust = a.wrapping_rem(b) != 0 && ((a < 0) != (b < 0));
            Ok(Value::Int(if adjust { quotient - 1 } else { quotient }))
        }
        (BinaryOp::Mod, Value::Int(a), Value::Int(b)) => {
            if b == 0 {
                return Err("integer division or modulo by zero".to_string());
            }
            let remainder = a.wrapping_rem(b);
            let adjust = remainder != 0 && ((remainder < 0) != (b < 0));
            Ok(Value::Int(if adjust { remainder + b } else { remainder }))
        }
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
        (BinaryOp::Add, Value::List(mut a), Value::List(b)) => {
            a.extend(b);
            Ok(Value::List(a))
        }
        (BinaryOp::Mul, Value::Str(s), Value::Int(n)) | (BinaryOp::Mul, Value::Int(n), Value::Str(s)) => {
            Ok(Value::Str(s.repeat(usize::try_from(n).unwrap_or(0))))
        }
        (BinaryOp::Mod, Value::Str(format), Value::List(args)) => {
            filters::printf(&format, &args).map(Value::Str)
        }
        (BinaryOp::Mod, Value::Str(format), arg) => filters::printf(&format, &[arg]).map(Value::Str),
        (op, left, right) => {
            let (a, b) = match (left.as_number(), right.as_number()) {
                (Some(a), Some(b)) => (a, b),
                _ => return Err(unsupported(symbol(op), &left, &right)),
            };
            match op {
                BinaryOp::Add => Ok(Value::Float(a + b)),
                BinaryOp::Sub => Ok(Value::Float(a - b)),
                BinaryOp::Mul => Ok(Value::Float(a * b)),
                BinaryOp::Div if b == 0.0 => Err("division by zero".to_string()),
                BinaryOp::Div => Ok(Value::Float(a / b)),
                BinaryOp::FloorDiv if b == 0.0 => Err("float floor division by zero".to_string()),
                BinaryOp::FloorDiv => Ok(Value::Float((a / b).floor())),
                BinaryOp::Mod if b == 0.0 => Err("float modulo".to_string()),
                BinaryOp::Mod => Ok(Value::Float(a - b * (a / b).floor())),
                BinaryOp::Concat => Ok(Value::Str(left.display() + &right.display())),
            }
        }
    }
}

fn symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::FloorDiv => "//",
        BinaryOp::Mod => "%",
        BinaryOp::Concat => "~",
    }
}

fn compare_values(op: CompareOp, left: &Value, right: &Value) -> Result<bool, String> {
    Ok(match op {
        CompareOp::Eq => equals(left, right),
        CompareOp::Ne => !equals(left, right),
        CompareOp::Lt => compare(left, right, "<")? == Ordering::Less,
        CompareOp::Le => compare(left, right, "<=")? != Ordering::Greater,
        CompareOp::Gt => compare(left, right, ">")? == Ordering::Greater,
        CompareOp::Ge => compare(left, right, ">=")? != Ordering::Less,
        CompareOp::In => contains(right, left)?,
        CompareOp::NotIn => !contains(right, left)?,
    })
}
