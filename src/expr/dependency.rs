//! Walks an expression AST and records what it depends on. The sole
//! interface between the constraint language and the canonical-ordering
//! algorithm.

use super::Expr;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default, Clone)]
pub struct DependencyCollector {
    pub declared_variable: Option<String>,
    pub variables: BTreeSet<String>,
    pub attribute_calls: BTreeMap<String, BTreeSet<String>>,
    /// function/method name -> one entry per call site, mapping keyword -> referenced variable name.
    pub function_calls: BTreeMap<String, Vec<BTreeMap<String, String>>>,
    pub builtins: BTreeSet<String>,
    pub subvariables: BTreeSet<(String, String)>,
}

impl DependencyCollector {
    pub fn collect(expr: &Expr) -> Self {
        let mut c = DependencyCollector::default();
        c.visit(expr);
        c
    }

    pub fn collect_with_declared(expr: &Expr, declared_variable: Option<String>) -> Self {
        let mut c = Self::collect(expr);
        c.declared_variable = declared_variable;
        c
    }

    fn visit(&mut self, e: &Expr) {
        match e {
            Expr::Int(_) | Expr::Float(_) | Expr::Bool(_) | Expr::Str(_) => {}
            Expr::Var(v) => {
                self.variables.insert(v.clone());
            }
            Expr::Attr(base, attr) => {
                self.visit(base);
                match base.as_ref() {
                    Expr::Var(v) => {
                        self.attribute_calls
                            .entry(v.clone())
                            .or_default()
                            .insert(attr.clone());
                    }
                    Expr::Attr(inner_base, inner_attr) => {
                        if let Expr::Var(v) = inner_base.as_ref() {
                            self.subvariables.insert((v.clone(), inner_attr.clone()));
                        }
                    }
                    _ => {}
                }
            }
            Expr::BinOp(_, l, r) | Expr::Cmp(_, l, r) | Expr::And(l, r) | Expr::Or(l, r) => {
                self.visit(l);
                self.visit(r);
            }
            Expr::Not(x) => self.visit(x),
            Expr::List(items) => {
                for i in items {
                    self.visit(i);
                }
            }
            Expr::Call(name, args, kwargs) => {
                self.builtins.insert(name.clone());
                for a in args {
                    self.visit(a);
                }
                let mut kwmap = BTreeMap::new();
                for (k, v) in kwargs {
                    self.visit(v);
                    if let Expr::Var(vn) = v {
                        kwmap.insert(k.clone(), vn.clone());
                    }
                }
                self.function_calls.entry(name.clone()).or_default().push(kwmap);
            }
            Expr::MethodCall(recv, method, kwargs) => {
                self.visit(recv);
                let recv_name = if let Expr::Var(v) = recv.as_ref() {
                    v.clone()
                } else {
                    "_".to_string()
                };
                let key = format!("{recv_name}.{method}");
                let mut kwmap = BTreeMap::new();
                for (k, v) in kwargs {
                    self.visit(v);
                    if let Expr::Var(vn) = v {
                        kwmap.insert(k.clone(), vn.clone());
                    }
                }
                self.function_calls.entry(key).or_default().push(kwmap);
            }
        }
    }
}
