//! Runtime value type for literal attributes and expression evaluation.

use crate::error::MatchError;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    pub fn as_f64(&self) -> Result<f64, MatchError> {
        match self {
            Value::Int(i) => Ok(*i as f64),
            Value::Float(f) => Ok(*f),
            other => Err(MatchError::Generic(format!("{other:?} is not numeric"))),
        }
    }

    pub fn as_bool(&self) -> Result<bool, MatchError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(MatchError::Generic(format!("{other:?} is not boolean"))),
        }
    }

    pub fn len(&self) -> Option<usize> {
        match self {
            Value::List(v) => Some(v.len()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len().map_or(true, |n| n == 0)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}
