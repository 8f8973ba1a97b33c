//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the ccgen project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// AST for preprocessor guard conditions
//
// Represents the boolean logic of `#if` / `#ifdef` directives so the
// condition solver can analyze and evaluate it per platform.
//

use std::fmt;

use crate::platform::Macros;

/// A guard expression. Trees are immutable after construction and
/// freely cloned; children never form cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// `defined(NAME)`
    Defined(String),
    Not(Box<Expr>),
    /// `a && b`
    And(Box<Expr>, Box<Expr>),
    /// `a || b`
    Or(Box<Expr>, Box<Expr>),
    /// `A op B`
    Compare(Compare),
}

impl Expr {
    pub fn defined(name: impl Into<String>) -> Expr {
        Expr::Defined(name.into())
    }

    pub fn not(expr: Expr) -> Expr {
        Expr::Not(Box::new(expr))
    }

    pub fn and(left: Expr, right: Expr) -> Expr {
        Expr::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Expr, right: Expr) -> Expr {
        Expr::Or(Box::new(left), Box::new(right))
    }

    /// Reports whether the expression holds for the given macro set.
    pub fn eval(&self, macros: &Macros) -> bool {
        match self {
            Expr::Defined(name) => macros.contains_key(name),
            Expr::Not(inner) => !inner.eval(macros),
            Expr::And(left, right) => left.eval(macros) && right.eval(macros),
            Expr::Or(left, right) => left.eval(macros) || right.eval(macros),
            Expr::Compare(compare) => compare.eval(macros),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Defined(name) => write!(f, "defined({name})"),
            Expr::Not(inner) => write!(f, "!({inner})"),
            Expr::And(left, right) => write!(f, "{left} && {right}"),
            Expr::Or(left, right) => write!(f, "{left} || {right}"),
            Expr::Compare(compare) => compare.fmt(f),
        }
    }
}

/// Comparison operator of a `Compare` expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq, // ==
    Ne, // !=
    Lt, // <
    Le, // <=
    Gt, // >
    Ge, // >=
}

impl CompareOp {
    pub fn from_token(token: &str) -> Option<CompareOp> {
        match token {
            "==" => Some(CompareOp::Eq),
            "!=" => Some(CompareOp::Ne),
            "<" => Some(CompareOp::Lt),
            "<=" => Some(CompareOp::Le),
            ">" => Some(CompareOp::Gt),
            ">=" => Some(CompareOp::Ge),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    /// The operator accepting exactly the complementary value pairs.
    pub fn negate(self) -> CompareOp {
        match self {
            CompareOp::Eq => CompareOp::Ne,
            CompareOp::Ne => CompareOp::Eq,
            CompareOp::Lt => CompareOp::Ge,
            CompareOp::Le => CompareOp::Gt,
            CompareOp::Gt => CompareOp::Le,
            CompareOp::Ge => CompareOp::Lt,
        }
    }

    pub fn eval(self, left: i64, right: i64) -> bool {
        match self {
            CompareOp::Eq => left == right,
            CompareOp::Ne => left != right,
            CompareOp::Lt => left < right,
            CompareOp::Le => left <= right,
            CompareOp::Gt => left > right,
            CompareOp::Ge => left >= right,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An integer comparison between two values, e.g. `__GNUC__ >= 9`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compare {
    pub left: Value,
    pub op: CompareOp,
    pub right: Value,
}

impl Compare {
    pub fn eval(&self, macros: &Macros) -> bool {
        let (left, _) = self.left.resolve(macros);
        let (right, _) = self.right.resolve(macros);
        self.op.eval(left, right)
    }

    /// Negates the comparison by flipping the operator, e.g. `==` to `!=`.
    pub fn negate(&self) -> Compare {
        Compare {
            left: self.left.clone(),
            op: self.op.negate(),
            right: self.right.clone(),
        }
    }
}

impl fmt::Display for Compare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op, self.right)
    }
}

/// An operand of a comparison: a macro reference or an integer literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Ident(String),
    Constant(i64),
}

impl Value {
    /// Resolves the value against the macro set. The flag reports
    /// whether the value was actually defined; an undefined macro
    /// resolves to 0.
    pub fn resolve(&self, macros: &Macros) -> (i64, bool) {
        match self {
            Value::Ident(name) => match macros.get(name) {
                Some(value) => (*value, true),
                None => (0, false),
            },
            Value::Constant(value) => (*value, true),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Ident(name) => f.write_str(name),
            Value::Constant(value) => write!(f, "{value}"),
        }
    }
}
