//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the ccgen project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Platform condition solver
//
// Determines for which platforms a guard expression holds, given the
// macros each platform predefines. The expression is converted to
// disjunctive normal form once; macro presence literals are then
// answered with set algebra, while arbitrary integer comparisons fall
// back to per-platform evaluation.
//

use std::collections::BTreeSet;

use crate::parser::expr::{Compare, Expr};
use crate::platform::{Platform, PlatformMacros};

/// Returns the platforms for which `expr` evaluates to true.
///
/// A None expression means "no condition": the result is None and the
/// caller treats the include as used by every platform. Otherwise the
/// matching platforms are returned sorted; an empty list means no
/// enabled platform matches, which the caller typically routes to a
/// default branch.
pub fn platforms_for_expr(
    expr: Option<&Expr>,
    platform_macros: &PlatformMacros,
) -> Option<Vec<Platform>> {
    let expr = expr?;

    // Convert to DNF exactly once; from here on we work with
    // conjunctions of literals.
    let dnf = to_dnf(expr);
    let enabled: BTreeSet<Platform> = platform_macros.keys().copied().collect();

    let mut matched: BTreeSet<Platform> = BTreeSet::new();
    for conjunction in &dnf {
        // start with the full universe for this term
        let mut term_set = enabled.clone();
        for literal in conjunction {
            match literal {
                Literal::Presence { name, negated } => {
                    // Presence/absence of a macro is a set intersection
                    // (defined) or difference (not defined).
                    let macro_set = platforms_for_macro(name, platform_macros);
                    if *negated {
                        term_set = term_set.difference(&macro_set).copied().collect();
                    } else {
                        term_set = term_set.intersection(&macro_set).copied().collect();
                    }
                }
                Literal::Comparison(compare) => {
                    // Generic comparisons (e.g. `__GNUC__ >= 9`) cannot
                    // be solved by set operations; evaluate them for
                    // every remaining platform.
                    term_set.retain(|platform| compare.eval(&platform_macros[platform]));
                }
            }
            // An empty set cannot be revived by further literals in
            // the same conjunction.
            if term_set.is_empty() {
                break;
            }
        }
        matched.extend(term_set);
    }

    Some(matched.into_iter().collect())
}

/// The set of platforms whose macro table defines `name`.
fn platforms_for_macro(name: &str, platform_macros: &PlatformMacros) -> BTreeSet<Platform> {
    platform_macros
        .iter()
        .filter(|(_, macros)| macros.contains_key(name))
        .map(|(platform, _)| *platform)
        .collect()
}

/// A single literal in DNF:
///
///   `MACRO`          -> Presence { negated: false }
///   `!MACRO`         -> Presence { negated: true }
///   `__GNUC__ >= 9`  -> Comparison
///
/// A negated comparison is stored operator-flipped, keeping the
/// negation flag for presence literals only.
#[derive(Debug, Clone)]
enum Literal {
    Presence { name: String, negated: bool },
    Comparison(Compare),
}

/// A conjunction (logical AND) of literals.
type Conjunction = Vec<Literal>;

/// Converts the expression tree into DNF: negation normal form first,
/// then recursive distribution of AND over OR.
fn to_dnf(expr: &Expr) -> Vec<Conjunction> {
    expr_to_dnf(&to_negation_normal_form(expr))
}

/// Pushes logical NOT inward so negation wraps only atomic literals.
///
///   !!A       -> A
///   !(A && B) -> !A || !B
///   !(A || B) -> !A && !B
fn to_negation_normal_form(expr: &Expr) -> Expr {
    match expr {
        Expr::Not(inner) => negate_normal_form(inner),
        Expr::And(left, right) => Expr::and(
            to_negation_normal_form(left),
            to_negation_normal_form(right),
        ),
        Expr::Or(left, right) => Expr::or(
            to_negation_normal_form(left),
            to_negation_normal_form(right),
        ),
        literal => literal.clone(),
    }
}

/// Normal form of the negation of `expr`.
fn negate_normal_form(expr: &Expr) -> Expr {
    match expr {
        Expr::Not(inner) => to_negation_normal_form(inner),
        Expr::And(left, right) => Expr::or(negate_normal_form(left), negate_normal_form(right)),
        Expr::Or(left, right) => Expr::and(negate_normal_form(left), negate_normal_form(right)),
        literal => Expr::not(literal.clone()),
    }
}

/// Distributes AND over OR on an expression already in NNF:
///
///   (l1 || l2) && (r1 || r2) -> l1&&r1 || l1&&r2 || l2&&r1 || l2&&r2
fn expr_to_dnf(expr: &Expr) -> Vec<Conjunction> {
    match expr {
        Expr::And(l, r) => {
            let left = expr_to_dnf(l);
            let right = expr_to_dnf(r);
            let mut out = Vec::with_capacity(left.len() * right.len());
            for lt in &left {
                for rt in &right {
                    let mut combined = Vec::with_capacity(lt.len() + rt.len());
                    combined.extend(lt.iter().cloned());
                    combined.extend(rt.iter().cloned());
                    out.push(combined);
                }
            }
            out
        }
        Expr::Or(l, r) => {
            let mut out = expr_to_dnf(l);
            out.extend(expr_to_dnf(r));
            out
        }
        Expr::Not(inner) => match inner.as_ref() {
            Expr::Compare(compare) => vec![vec![Literal::Comparison(compare.negate())]],
            Expr::Defined(name) => vec![vec![Literal::Presence {
                name: name.clone(),
                negated: true,
            }]],
            other => unreachable!("negation of a non-literal after normalization: {other}"),
        },
        Expr::Compare(compare) => vec![vec![Literal::Comparison(compare.clone())]],
        Expr::Defined(name) => vec![vec![Literal::Presence {
            name: name.clone(),
            negated: false,
        }]],
    }
}
