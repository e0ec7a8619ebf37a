//! The Out expression AST and its parser.
//!
//! The surface syntax is a small S-expression language:
//!
//! ```text
//! expr ::= 'INR' | 'TRM'
//!        | '(' 'lit' ('+'|'-') feature ')'
//!        | '(' 'proj' expr '(' (feature*|'*') ')' ')'
//!        | '(' 'unify' expr expr ')'
//!        | '(' 'subtract' expr expr ')'
//! ```
//!
//! `(bundle (+ F) …)`, `(all X)`, and `(expand X)` are accepted as sugar:
//! `bundle` lowers to a left-biased chain of literals, the other two to
//! `(proj X *)`.

use super::DslError;

/// How a `proj` restricts its operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Keep only the named features.
    Features(Vec<String>),
    /// Keep the entire feature universe (`*`).
    All,
}

/// A parsed Out expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutExpr {
    /// The search-initiator bundle.
    Inr,
    /// The remembered terminator bundle.
    Trm,
    /// A singleton bundle `{feature ↦ polarity}`. The polarity is kept as
    /// its surface form until evaluation resolves the feature.
    Lit(crate::features::Polarity, String),
    /// Restriction of a bundle to a feature set.
    Proj(Box<OutExpr>, Projection),
    /// Left-biased union.
    Unify(Box<OutExpr>, Box<OutExpr>),
    /// Exact-polarity removal.
    Subtract(Box<OutExpr>, Box<OutExpr>),
}

impl OutExpr {
    /// Parse an Out expression from source text.
    pub fn parse(text: &str) -> Result<Self, DslError> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Err(DslError::Empty);
        }
        let (sexpr, next) = parse_sexpr(&tokens, 0)?;
        if next != tokens.len() {
            return Err(DslError::TrailingTokens);
        }
        lower(&sexpr)
    }
}

impl std::fmt::Display for OutExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutExpr::Inr => write!(f, "INR"),
            OutExpr::Trm => write!(f, "TRM"),
            OutExpr::Lit(polarity, feature) => write!(f, "(lit {polarity} {feature})"),
            OutExpr::Proj(expr, Projection::All) => write!(f, "(proj {expr} *)"),
            OutExpr::Proj(expr, Projection::Features(features)) => {
                write!(f, "(proj {expr} ({}))", features.join(" "))
            }
            OutExpr::Unify(a, b) => write!(f, "(unify {a} {b})"),
            OutExpr::Subtract(a, b) => write!(f, "(subtract {a} {b})"),
        }
    }
}

/// Raw S-expression, before shape checking.
enum SExpr {
    Atom(String),
    List(Vec<SExpr>),
}

impl std::fmt::Display for SExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SExpr::Atom(atom) => write!(f, "{atom}"),
            SExpr::List(items) => {
                write!(f, "(")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        match ch {
            '(' | ')' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(ch.to_string());
            }
            _ if ch.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn parse_sexpr(tokens: &[String], start: usize) -> Result<(SExpr, usize), DslError> {
    let token = tokens.get(start).ok_or(DslError::Unclosed)?;
    match token.as_str() {
        "(" => {
            let mut items = Vec::new();
            let mut idx = start + 1;
            while tokens.get(idx).is_some_and(|t| t != ")") {
                let (item, next) = parse_sexpr(tokens, idx)?;
                items.push(item);
                idx = next;
            }
            if tokens.get(idx).is_none() {
                return Err(DslError::Unclosed);
            }
            Ok((SExpr::List(items), idx + 1))
        }
        ")" => Err(DslError::UnexpectedClose),
        _ => Ok((SExpr::Atom(token.clone()), start + 1)),
    }
}

fn lower(sexpr: &SExpr) -> Result<OutExpr, DslError> {
    match sexpr {
        SExpr::Atom(atom) => match atom.as_str() {
            "INR" => Ok(OutExpr::Inr),
            "TRM" => Ok(OutExpr::Trm),
            _ => Err(DslError::UnknownAtom { atom: atom.clone() }),
        },
        SExpr::List(items) => {
            let op = match items.first() {
                Some(SExpr::Atom(op)) => op.as_str(),
                _ => {
                    return Err(DslError::UnknownOperator {
                        op: String::new(),
                        expr: sexpr.to_string(),
                    })
                }
            };
            match op {
                "lit" => lower_lit(items, sexpr),
                "bundle" => lower_bundle(items, sexpr),
                "proj" => lower_proj(items, sexpr),
                "all" | "expand" => lower_all(op, items, sexpr),
                "unify" | "subtract" => lower_binary(op, items, sexpr),
                _ => Err(DslError::UnknownOperator {
                    op: op.to_string(),
                    expr: sexpr.to_string(),
                }),
            }
        }
    }
}

fn lower_lit(items: &[SExpr], whole: &SExpr) -> Result<OutExpr, DslError> {
    if items.len() != 3 {
        return Err(DslError::Arity {
            op: "lit",
            expected: 2,
            expr: whole.to_string(),
        });
    }
    let (polarity, feature) = lower_pair(&items[1], &items[2], whole)?;
    Ok(OutExpr::Lit(polarity, feature))
}

/// `(bundle (+ F) (- G) …)` — one or more `(polarity feature)` pairs,
/// combined left-biased like a `unify` chain.
fn lower_bundle(items: &[SExpr], whole: &SExpr) -> Result<OutExpr, DslError> {
    if items.len() < 2 {
        return Err(DslError::Arity {
            op: "bundle",
            expected: 1,
            expr: whole.to_string(),
        });
    }
    let mut result: Option<OutExpr> = None;
    for item in &items[1..] {
        let pair = match item {
            SExpr::List(pair) if pair.len() == 2 => pair,
            _ => {
                return Err(DslError::Arity {
                    op: "bundle",
                    expected: 2,
                    expr: item.to_string(),
                })
            }
        };
        let (polarity, feature) = lower_pair(&pair[0], &pair[1], item)?;
        let lit = OutExpr::Lit(polarity, feature);
        result = Some(match result {
            None => lit,
            Some(acc) => OutExpr::Unify(Box::new(acc), Box::new(lit)),
        });
    }
    Ok(result.expect("bundle has at least one pair"))
}

fn lower_pair(
    polarity: &SExpr,
    feature: &SExpr,
    whole: &SExpr,
) -> Result<(crate::features::Polarity, String), DslError> {
    let polarity = match polarity {
        SExpr::Atom(atom) => crate::features::Polarity::parse(atom),
        SExpr::List(_) => None,
    }
    .ok_or_else(|| DslError::InvalidPolarity {
        expr: whole.to_string(),
    })?;
    let feature = match feature {
        SExpr::Atom(atom) if !atom.trim().is_empty() => atom.clone(),
        _ => {
            return Err(DslError::EmptyFeature {
                expr: whole.to_string(),
            })
        }
    };
    Ok((polarity, feature))
}

fn lower_proj(items: &[SExpr], whole: &SExpr) -> Result<OutExpr, DslError> {
    if items.len() != 3 {
        return Err(DslError::Arity {
            op: "proj",
            expected: 2,
            expr: whole.to_string(),
        });
    }
    let expr = lower(&items[1])?;
    let projection = match &items[2] {
        SExpr::Atom(atom) if atom == "*" => Projection::All,
        // `(proj X (*))` is accepted alongside the bare-star form.
        SExpr::List(features)
            if matches!(features.as_slice(), [SExpr::Atom(atom)] if atom == "*") =>
        {
            Projection::All
        }
        SExpr::List(features) => {
            let mut names = Vec::with_capacity(features.len());
            for feature in features {
                match feature {
                    SExpr::Atom(name) if !name.trim().is_empty() => names.push(name.clone()),
                    _ => {
                        return Err(DslError::ExpectedFeatureList {
                            expr: whole.to_string(),
                        })
                    }
                }
            }
            Projection::Features(names)
        }
        SExpr::Atom(_) => {
            return Err(DslError::ExpectedFeatureList {
                expr: whole.to_string(),
            })
        }
    };
    Ok(OutExpr::Proj(Box::new(expr), projection))
}

fn lower_all(op: &str, items: &[SExpr], whole: &SExpr) -> Result<OutExpr, DslError> {
    if items.len() != 2 {
        return Err(DslError::Arity {
            op: if op == "all" { "all" } else { "expand" },
            expected: 1,
            expr: whole.to_string(),
        });
    }
    Ok(OutExpr::Proj(Box::new(lower(&items[1])?), Projection::All))
}

fn lower_binary(op: &str, items: &[SExpr], whole: &SExpr) -> Result<OutExpr, DslError> {
    if items.len() != 3 {
        return Err(DslError::Arity {
            op: if op == "unify" { "unify" } else { "subtract" },
            expected: 2,
            expr: whole.to_string(),
        });
    }
    let a = Box::new(lower(&items[1])?);
    let b = Box::new(lower(&items[2])?);
    Ok(if op == "unify" {
        OutExpr::Unify(a, b)
    } else {
        OutExpr::Subtract(a, b)
    })
}
