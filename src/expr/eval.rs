//! Evaluates the expression AST over a set of variable bindings.

use super::{ArithOp, CmpOp, Expr};
use crate::entity::Entity;
use crate::error::MatchError;
use crate::pattern::Pattern;
use crate::value::Value;
use std::collections::BTreeMap;

pub struct Bindings<'a> {
    pub entities: BTreeMap<String, &'a Entity>,
    pub helpers: BTreeMap<String, &'a Pattern>,
}

impl<'a> Bindings<'a> {
    pub fn new() -> Self {
        Bindings {
            entities: BTreeMap::new(),
            helpers: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_entity(mut self, name: impl Into<String>, e: &'a Entity) -> Self {
        self.entities.insert(name.into(), e);
        self
    }

    #[must_use]
    pub fn with_helper(mut self, name: impl Into<String>, p: &'a Pattern) -> Self {
        self.helpers.insert(name.into(), p);
        self
    }

    fn entity(&self, name: &str) -> Result<&'a Entity, MatchError> {
        self.entities
            .get(name)
            .copied()
            .ok_or_else(|| MatchError::Generic(format!("unbound variable '{name}'")))
    }
}

impl Default for Bindings<'_> {
    fn default() -> Self {
        Self::new()
    }
}

pub fn eval(expr: &Expr, b: &Bindings) -> Result<Value, MatchError> {
    match expr {
        Expr::Int(i) => Ok(Value::Int(*i)),
        Expr::Float(f) => Ok(Value::Float(*f)),
        Expr::Bool(x) => Ok(Value::Bool(*x)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Var(v) => {
            let e = b.entity(v)?;
            Ok(Value::Str(e.id.clone()))
        }
        Expr::Attr(base, attr) => {
            if let Expr::Var(v) = base.as_ref() {
                let e = b.entity(v)?;
                e.attr_value(attr)
                    .ok_or_else(|| MatchError::Generic(format!("'{v}' has no attribute '{attr}'")))
            } else {
                Err(MatchError::Generic(
                    "nested attribute access on non-variable base is not supported".to_string(),
                ))
            }
        }
        Expr::BinOp(op, l, r) => arith(*op, eval(l, b)?, eval(r, b)?),
        Expr::Cmp(op, l, r) => Ok(Value::Bool(compare(*op, eval(l, b)?, eval(r, b)?)?)),
        Expr::Not(x) => Ok(Value::Bool(!eval(x, b)?.as_bool()?)),
        Expr::And(l, r) => Ok(Value::Bool(eval(l, b)?.as_bool()? && eval(r, b)?.as_bool()?)),
        Expr::Or(l, r) => Ok(Value::Bool(eval(l, b)?.as_bool()? || eval(r, b)?.as_bool()?)),
        Expr::List(items) => Ok(Value::List(
            items.iter().map(|i| eval(i, b)).collect::<Result<_, _>>()?,
        )),
        Expr::Call(name, args, kwargs) => eval_builtin(name, args, kwargs, b),
        Expr::MethodCall(recv, method, kwargs) => eval_method(recv, method, kwargs, b),
    }
}

fn arith(op: ArithOp, l: Value, r: Value) -> Result<Value, MatchError> {
    if let (Value::Int(a), Value::Int(c)) = (&l, &r) {
        let res = match op {
            ArithOp::Add => a + c,
            ArithOp::Sub => a - c,
            ArithOp::Mul => a * c,
            ArithOp::Div => a
                .checked_div(*c)
                .ok_or_else(|| MatchError::Generic("division by zero".to_string()))?,
        };
        return Ok(Value::Int(res));
    }
    let a = l.as_f64()?;
    let c = r.as_f64()?;
    let res = match op {
        ArithOp::Add => a + c,
        ArithOp::Sub => a - c,
        ArithOp::Mul => a * c,
        ArithOp::Div => a / c,
    };
    Ok(Value::Float(res))
}

fn compare(op: CmpOp, l: Value, r: Value) -> Result<bool, MatchError> {
    if let (Value::Str(a), Value::Str(c)) = (&l, &r) {
        return match op {
            CmpOp::Eq => Ok(a == c),
            CmpOp::Ne => Ok(a != c),
            _ => Err(MatchError::Generic(
                "ordering comparisons are not supported on strings".to_string(),
            )),
        };
    }
    let a = l.as_f64()?;
    let c = r.as_f64()?;
    Ok(match op {
        CmpOp::Lt => a < c,
        CmpOp::Le => a <= c,
        CmpOp::Eq => (a - c).abs() < f64::EPSILON,
        CmpOp::Ne => (a - c).abs() >= f64::EPSILON,
        CmpOp::Ge => a >= c,
        CmpOp::Gt => a > c,
    })
}

fn reduce_numeric(vals: &[Value], f: impl Fn(f64, f64) -> f64, identity: f64) -> Result<Value, MatchError> {
    let all_int = vals.iter().all(|v| matches!(v, Value::Int(_)));
    let mut acc = identity;
    for v in vals {
        acc = f(acc, v.as_f64()?);
    }
    Ok(if all_int {
        Value::Int(acc as i64)
    } else {
        Value::Float(acc)
    })
}

fn eval_builtin(
    name: &str,
    args: &[Expr],
    _kwargs: &[(String, Expr)],
    b: &Bindings,
) -> Result<Value, MatchError> {
    let mut vals: Vec<Value> = args.iter().map(|a| eval(a, b)).collect::<Result<_, _>>()?;
    if vals.len() == 1 {
        if let Value::List(items) = &vals[0] {
            vals = items.clone();
        }
    }
    match name {
        "any" => {
            let mut r = false;
            for v in &vals {
                if v.as_bool()? {
                    r = true;
                }
            }
            Ok(Value::Bool(r))
        }
        "all" => {
            let mut r = true;
            for v in &vals {
                if !v.as_bool()? {
                    r = false;
                }
            }
            Ok(Value::Bool(r))
        }
        "inv" => {
            if vals.len() != 1 {
                return Err(MatchError::Generic("inv() takes exactly one argument".to_string()));
            }
            Ok(Value::Bool(!vals[0].as_bool()?))
        }
        "only_one_true" => {
            let count = vals.iter().map(Value::as_bool).collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Bool(count.into_iter().filter(|b| *b).count() == 1))
        }
        "only_one_false" => {
            let count = vals.iter().map(Value::as_bool).collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Bool(count.into_iter().filter(|b| !*b).count() == 1))
        }
        "max" => reduce_numeric(&vals, f64::max, f64::MIN),
        "min" => reduce_numeric(&vals, f64::min, f64::MAX),
        "sum" => reduce_numeric(&vals, |a, c| a + c, 0.0),
        "len" => Ok(Value::Int(vals.len() as i64)),
        other => Err(MatchError::Generic(format!("unknown builtin '{other}'"))),
    }
}

fn eval_method(
    recv: &Expr,
    method: &str,
    kwargs: &[(String, Expr)],
    b: &Bindings,
) -> Result<Value, MatchError> {
    if method != "contains" {
        return Err(MatchError::Generic(format!("unsupported method '{method}'")));
    }
    let helper_name = match recv {
        Expr::Var(v) => v.clone(),
        _ => {
            return Err(MatchError::Generic(
                "method calls require a plain helper-name receiver".to_string(),
            ))
        }
    };
    let helper = *b
        .helpers
        .get(&helper_name)
        .ok_or_else(|| MatchError::Generic(format!("unbound helper '{helper_name}'")))?;

    let mut argmap = BTreeMap::new();
    for (k, v) in kwargs {
        if let Expr::Var(vn) = v {
            let e = b.entity(vn)?;
            argmap.insert(k.clone(), e.id.clone());
        }
    }
    Ok(Value::Bool(helper.contains(&argmap)))
}
