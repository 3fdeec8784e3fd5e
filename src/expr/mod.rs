//! Expression core: a tagged-variant AST shared by `Constraint` and
//! `Computation`, a dependency collector, and an evaluator over bindings.
//! Recursive variants box their children.

pub mod dependency;
pub mod eval;
pub mod parser;

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Var(String),
    Attr(Box<Expr>, String),
    BinOp(ArithOp, Box<Expr>, Box<Expr>),
    Cmp(CmpOp, Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    List(Vec<Expr>),
    Call(String, Vec<Expr>, Vec<(String, Expr)>),
    MethodCall(Box<Expr>, String, Vec<(String, Expr)>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprKind {
    Constraint,
    Computation,
}

/// A parsed, executable line: either a bare boolean (`Constraint`) or a
/// named assignment (`Computation`), sharing one AST shape.
#[derive(Debug, Clone)]
pub struct ExecutableExpression {
    pub name: String,
    pub kind: ExprKind,
    pub declared_variable: Option<String>,
    pub ast: Expr,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EvalOutcome {
    Bound(String, crate::value::Value),
    Bool(bool),
}

use crate::error::MatchError;

impl ExecutableExpression {
    /// Parses `lines` (one expression per nonblank line), trying each as a
    /// `Computation` first (a top-level `v = expr`) then as a bare
    /// `Constraint`. Synthetic constraint names start at `cmax`.
    pub fn initialize_from_strings(lines: &str, cmax: usize) -> Result<Vec<Self>, MatchError> {
        let mut out = Vec::new();
        let mut counter = cmax;
        for line in lines.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            out.push(Self::parse_line(line, &mut counter)?);
        }
        Ok(out)
    }

    fn parse_line(line: &str, counter: &mut usize) -> Result<Self, MatchError> {
        if let Some(eq_pos) = parser::find_top_level_assign(line) {
            let lhs = line[..eq_pos].trim();
            let rhs = line[eq_pos + 1..].trim();
            if parser::is_identifier(lhs) {
                let ast = parser::parse_expr(rhs)?;
                return Ok(ExecutableExpression {
                    name: lhs.to_string(),
                    kind: ExprKind::Computation,
                    declared_variable: Some(lhs.to_string()),
                    ast,
                    source: line.to_string(),
                });
            }
        }
        let ast = parser::parse_expr(line)?;
        let name = format!("_{counter}");
        *counter += 1;
        Ok(ExecutableExpression {
            name,
            kind: ExprKind::Constraint,
            declared_variable: None,
            ast,
            source: line.to_string(),
        })
    }

    pub fn exec(&self, bindings: &eval::Bindings) -> Result<EvalOutcome, MatchError> {
        let v = eval::eval(&self.ast, bindings)?;
        match self.kind {
            ExprKind::Computation => Ok(EvalOutcome::Bound(
                self.declared_variable
                    .clone()
                    .expect("computations always carry a declared variable"),
                v,
            )),
            ExprKind::Constraint => Ok(EvalOutcome::Bool(v.as_bool()?)),
        }
    }
}

/// Highest synthetic index already used among a set of constraints
/// (`_N` names), so a child pattern can keep numbering from its parent.
pub fn highest_synthetic(exprs: &[ExecutableExpression]) -> usize {
    exprs
        .iter()
        .filter_map(|e| e.name.strip_prefix('_').and_then(|n| n.parse::<usize>().ok()))
        .map(|n| n + 1)
        .max()
        .unwrap_or(0)
}

fn visit_acyclic(
    i: usize,
    exprs: &[ExecutableExpression],
    declared: &BTreeMap<&str, usize>,
    visiting: &mut [bool],
    done: &mut [bool],
) -> Result<(), String> {
    if done[i] {
        return Ok(());
    }
    if visiting[i] {
        return Err(format!(
            "cyclic computation dependency involving '{}'",
            exprs[i].name
        ));
    }
    visiting[i] = true;
    let deps = dependency::DependencyCollector::collect(&exprs[i].ast);
    for v in &deps.variables {
        if let Some(&j) = declared.get(v.as_str()) {
            visit_acyclic(j, exprs, declared, visiting, done)?;
        }
    }
    visiting[i] = false;
    done[i] = true;
    Ok(())
}

/// Checks that the dependency graph among computations (x depends on y if
/// x references y) is acyclic.
pub fn check_acyclic(exprs: &[ExecutableExpression]) -> Result<(), String> {
    let declared: BTreeMap<&str, usize> = exprs
        .iter()
        .enumerate()
        .filter_map(|(i, e)| e.declared_variable.as_deref().map(|v| (v, i)))
        .collect();

    let mut visiting = vec![false; exprs.len()];
    let mut done = vec![false; exprs.len()];

    for i in 0..exprs.len() {
        visit_acyclic(i, exprs, &declared, &mut visiting, &mut done)?;
    }
    Ok(())
}
