//! Hand-rolled recursive-descent parser for the constraint/computation
//! expression language.

use super::{ArithOp, CmpOp, Expr};
use crate::error::MatchError;

/// Positional and keyword arguments of a call site.
type CallArgs = (Vec<Expr>, Vec<(String, Expr)>);

pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Finds a top-level `=` (not part of `==`, `!=`, `<=`, `>=`) outside any
/// parentheses, the signal that a line is a `Computation`.
pub fn find_top_level_assign(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut depth = 0i32;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth -= 1,
            b'=' if depth == 0 => {
                let prev = if i > 0 { bytes[i - 1] } else { 0 };
                let next = if i + 1 < bytes.len() { bytes[i + 1] } else { 0 };
                if prev != b'=' && prev != b'!' && prev != b'<' && prev != b'>' && next != b'=' {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    Sym(String),
    Eof,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Lexer {
            chars: src.chars().peekable(),
        }
    }

    fn next_tok(&mut self) -> Result<Tok, MatchError> {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }
        let c = match self.chars.peek() {
            None => return Ok(Tok::Eof),
            Some(&c) => c,
        };
        if c.is_ascii_digit() {
            let mut s = String::new();
            let mut is_float = false;
            while let Some(&c) = self.chars.peek() {
                if c.is_ascii_digit() {
                    s.push(c);
                    self.chars.next();
                } else if c == '.' && !is_float {
                    is_float = true;
                    s.push(c);
                    self.chars.next();
                } else {
                    break;
                }
            }
            return if is_float {
                s.parse::<f64>()
                    .map(Tok::Float)
                    .map_err(|e| MatchError::ParseExpression(e.to_string()))
            } else {
                s.parse::<i64>()
                    .map(Tok::Int)
                    .map_err(|e| MatchError::ParseExpression(e.to_string()))
            };
        }
        if c.is_alphabetic() || c == '_' {
            let mut s = String::new();
            while let Some(&c) = self.chars.peek() {
                if c.is_alphanumeric() || c == '_' {
                    s.push(c);
                    self.chars.next();
                } else {
                    break;
                }
            }
            return Ok(Tok::Ident(s));
        }
        if c == '"' {
            self.chars.next();
            let mut s = String::new();
            for c in self.chars.by_ref() {
                if c == '"' {
                    return Ok(Tok::Str(s));
                }
                s.push(c);
            }
            return Err(MatchError::ParseExpression("unterminated string".into()));
        }
        // two-char operators
        let two: String = {
            let mut it = self.chars.clone();
            let a = it.next();
            let b = it.next();
            match (a, b) {
                (Some(a), Some(b)) => format!("{a}{b}"),
                _ => String::new(),
            }
        };
        if ["==", "!=", "<=", ">=", "&&", "||"].contains(&two.as_str()) {
            self.chars.next();
            self.chars.next();
            return Ok(Tok::Sym(two));
        }
        self.chars.next();
        Ok(Tok::Sym(c.to_string()))
    }
}

struct Parser {
    toks: Vec<Tok>,
    pos: usize,
}

impl Parser {
    fn new(src: &str) -> Result<Self, MatchError> {
        let mut lexer = Lexer::new(src);
        let mut toks = Vec::new();
        loop {
            let t = lexer.next_tok()?;
            let done = t == Tok::Eof;
            toks.push(t);
            if done {
                break;
            }
        }
        Ok(Parser { toks, pos: 0 })
    }

    fn peek(&self) -> &Tok {
        &self.toks[self.pos]
    }

    fn advance(&mut self) -> Tok {
        let t = self.toks[self.pos].clone();
        if self.pos + 1 < self.toks.len() {
            self.pos += 1;
        }
        t
    }

    fn eat_sym(&mut self, sym: &str) -> bool {
        if matches!(self.peek(), Tok::Sym(s) if s == sym) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_sym(&mut self, sym: &str) -> Result<(), MatchError> {
        if self.eat_sym(sym) {
            Ok(())
        } else {
            Err(MatchError::ParseExpression(format!(
                "expected '{sym}', found {:?}",
                self.peek()
            )))
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, MatchError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, MatchError> {
        let mut lhs = self.parse_and()?;
        loop {
            if self.eat_sym("||") || self.eat_kw("or") {
                let rhs = self.parse_and()?;
                lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
            } else {
                return Ok(lhs);
            }
        }
    }

    fn parse_and(&mut self) -> Result<Expr, MatchError> {
        let mut lhs = self.parse_not()?;
        loop {
            if self.eat_sym("&&") || self.eat_kw("and") {
                let rhs = self.parse_not()?;
                lhs = Expr::And(Box::new(lhs), Box::new(rhs));
            } else {
                return Ok(lhs);
            }
        }
    }

    fn eat_kw(&mut self, kw: &str) -> bool {
        if matches!(self.peek(), Tok::Ident(s) if s == kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn parse_not(&mut self) -> Result<Expr, MatchError> {
        if self.eat_sym("!") || self.eat_kw("not") {
            return Ok(Expr::Not(Box::new(self.parse_not()?)));
        }
        self.parse_cmp()
    }

    fn parse_cmp(&mut self) -> Result<Expr, MatchError> {
        let lhs = self.parse_arith()?;
        let op = match self.peek() {
            Tok::Sym(s) => match s.as_str() {
                "<" => Some(CmpOp::Lt),
                "<=" => Some(CmpOp::Le),
                "==" => Some(CmpOp::Eq),
                "!=" => Some(CmpOp::Ne),
                ">=" => Some(CmpOp::Ge),
                ">" => Some(CmpOp::Gt),
                _ => None,
            },
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let rhs = self.parse_arith()?;
            return Ok(Expr::Cmp(op, Box::new(lhs), Box::new(rhs)));
        }
        Ok(lhs)
    }

    fn parse_arith(&mut self) -> Result<Expr, MatchError> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Tok::Sym(s) if s == "+" => Some(ArithOp::Add),
                Tok::Sym(s) if s == "-" => Some(ArithOp::Sub),
                _ => None,
            };
            match op {
                Some(op) => {
                    self.advance();
                    let rhs = self.parse_term()?;
                    lhs = Expr::BinOp(op, Box::new(lhs), Box::new(rhs));
                }
                None => return Ok(lhs),
            }
        }
    }

    fn parse_term(&mut self) -> Result<Expr, MatchError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Tok::Sym(s) if s == "*" => Some(ArithOp::Mul),
                Tok::Sym(s) if s == "/" => Some(ArithOp::Div),
                _ => None,
            };
            match op {
                Some(op) => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    lhs = Expr::BinOp(op, Box::new(lhs), Box::new(rhs));
                }
                None => return Ok(lhs),
            }
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, MatchError> {
        if self.eat_sym("-") {
            let inner = self.parse_unary()?;
            return Ok(Expr::BinOp(
                ArithOp::Sub,
                Box::new(Expr::Int(0)),
                Box::new(inner),
            ));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, MatchError> {
        let mut base = self.parse_primary()?;
        loop {
            if self.eat_sym(".") {
                let name = match self.advance() {
                    Tok::Ident(s) => s,
                    other => {
                        return Err(MatchError::ParseExpression(format!(
                            "expected identifier after '.', found {other:?}"
                        )))
                    }
                };
                if matches!(self.peek(), Tok::Sym(s) if s == "(") {
                    self.advance();
                    let (args, kwargs) = self.parse_args()?;
                    base = Expr::MethodCall(Box::new(base), name, {
                        // method calls here are keyword-only per spec (`helper.contains(var=x)`)
                        let mut kw = kwargs;
                        kw.extend(args.into_iter().enumerate().map(|(i, a)| (format!("_{i}"), a)));
                        kw
                    });
                } else {
                    base = Expr::Attr(Box::new(base), name);
                }
            } else {
                return Ok(base);
            }
        }
    }

    fn parse_args(&mut self) -> Result<CallArgs, MatchError> {
        let mut args = Vec::new();
        let mut kwargs = Vec::new();
        if self.eat_sym(")") {
            return Ok((args, kwargs));
        }
        loop {
            if let Tok::Ident(name) = self.peek().clone() {
                let save = self.pos;
                self.advance();
                if self.eat_sym("=") {
                    let value = self.parse_expr()?;
                    kwargs.push((name, value));
                    if self.eat_sym(",") {
                        continue;
                    }
                    self.expect_sym(")")?;
                    return Ok((args, kwargs));
                }
                self.pos = save;
            }
            let value = self.parse_expr()?;
            args.push(value);
            if self.eat_sym(",") {
                continue;
            }
            self.expect_sym(")")?;
            return Ok((args, kwargs));
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, MatchError> {
        match self.advance() {
            Tok::Int(i) => Ok(Expr::Int(i)),
            Tok::Float(f) => Ok(Expr::Float(f)),
            Tok::Str(s) => Ok(Expr::Str(s)),
            Tok::Ident(name) => {
                if name == "true" {
                    return Ok(Expr::Bool(true));
                }
                if name == "false" {
                    return Ok(Expr::Bool(false));
                }
                if matches!(self.peek(), Tok::Sym(s) if s == "(") {
                    self.advance();
                    let (args, kwargs) = self.parse_args()?;
                    return Ok(Expr::Call(name, args, kwargs));
                }
                Ok(Expr::Var(name))
            }
            Tok::Sym(s) if s == "(" => {
                let e = self.parse_expr()?;
                self.expect_sym(")")?;
                Ok(e)
            }
            Tok::Sym(s) if s == "[" => {
                let mut items = Vec::new();
                if !self.eat_sym("]") {
                    loop {
                        items.push(self.parse_expr()?);
                        if self.eat_sym(",") {
                            continue;
                        }
                        self.expect_sym("]")?;
                        break;
                    }
                }
                Ok(Expr::List(items))
            }
            other => Err(MatchError::ParseExpression(format!(
                "unexpected token {other:?}"
            ))),
        }
    }
}

pub fn parse_expr(src: &str) -> Result<Expr, MatchError> {
    let mut p = Parser::new(src)?;
    let e = p.parse_expr()?;
    if !matches!(p.peek(), Tok::Eof) {
        return Err(MatchError::ParseExpression(format!(
            "trailing input after expression: {:?}",
            p.peek()
        )));
    }
    Ok(e)
}
