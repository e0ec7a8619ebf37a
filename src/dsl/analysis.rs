//! Static analysis over Out expressions.
//!
//! Feeds the per-rule dependency analysis: which features an expression can
//! mention, and which of them a `TRM` leaf can influence. The
//! TRM-sensitivity walk is conservative — it may over-approximate the
//! influenced set, never under-approximate it.

use std::collections::BTreeSet;

use super::ast::{OutExpr, Projection};

/// Whether the expression contains a `TRM` leaf anywhere.
pub fn contains_trm(expr: &OutExpr) -> bool {
    match expr {
        OutExpr::Trm => true,
        OutExpr::Inr | OutExpr::Lit(_, _) => false,
        OutExpr::Proj(inner, _) => contains_trm(inner),
        OutExpr::Unify(a, b) | OutExpr::Subtract(a, b) => contains_trm(a) || contains_trm(b),
    }
}

/// Whether the expression contains an `INR` leaf anywhere.
pub fn contains_inr(expr: &OutExpr) -> bool {
    match expr {
        OutExpr::Inr => true,
        OutExpr::Trm | OutExpr::Lit(_, _) => false,
        OutExpr::Proj(inner, _) => contains_inr(inner),
        OutExpr::Unify(a, b) | OutExpr::Subtract(a, b) => contains_inr(a) || contains_inr(b),
    }
}

/// Whether the expression contains any full-universe projection
/// (`proj … *`, `all`, `expand`). Any such projection forces `V = F`.
pub fn contains_all_projection(expr: &OutExpr) -> bool {
    match expr {
        OutExpr::Inr | OutExpr::Trm | OutExpr::Lit(_, _) => false,
        OutExpr::Proj(_, Projection::All) => true,
        OutExpr::Proj(inner, Projection::Features(_)) => contains_all_projection(inner),
        OutExpr::Unify(a, b) | OutExpr::Subtract(a, b) => {
            contains_all_projection(a) || contains_all_projection(b)
        }
    }
}

/// Whether the expression projects a `TRM`-carrying bundle onto the full
/// universe (`proj … *`). Forces `V = F` and `P = F`.
pub fn uses_all_trm(expr: &OutExpr) -> bool {
    match expr {
        OutExpr::Inr | OutExpr::Trm | OutExpr::Lit(_, _) => false,
        OutExpr::Proj(inner, Projection::All) => contains_trm(inner) || uses_all_trm(inner),
        OutExpr::Proj(inner, Projection::Features(_)) => uses_all_trm(inner),
        OutExpr::Unify(a, b) | OutExpr::Subtract(a, b) => uses_all_trm(a) || uses_all_trm(b),
    }
}

/// Whether the expression projects an `INR`-carrying bundle onto the full
/// universe. Forces `V = F` (but not `P = F`).
pub fn uses_all_inr(expr: &OutExpr) -> bool {
    match expr {
        OutExpr::Inr | OutExpr::Trm | OutExpr::Lit(_, _) => false,
        OutExpr::Proj(inner, Projection::All) => contains_inr(inner) || uses_all_inr(inner),
        OutExpr::Proj(inner, Projection::Features(_)) => uses_all_inr(inner),
        OutExpr::Unify(a, b) | OutExpr::Subtract(a, b) => uses_all_inr(a) || uses_all_inr(b),
    }
}

/// Whether the output can observe `TRM` without a finite projection in the
/// way: a bare `TRM` leaf, or `TRM` under `proj … *`. In that case every
/// grammar-visible feature of `TRM` can flow through, so `P = V`.
pub fn uses_full_trm(expr: &OutExpr) -> bool {
    match expr {
        OutExpr::Trm => true,
        OutExpr::Inr | OutExpr::Lit(_, _) => false,
        OutExpr::Proj(inner, Projection::All) => contains_trm(inner),
        // A finite projection confines whatever is underneath to the listed
        // features, which the tainted walk collects instead.
        OutExpr::Proj(_, Projection::Features(_)) => false,
        OutExpr::Unify(a, b) | OutExpr::Subtract(a, b) => uses_full_trm(a) || uses_full_trm(b),
    }
}

/// Every feature name the expression mentions, in `Lit` literals or `proj`
/// feature lists.
pub fn out_features(expr: &OutExpr) -> BTreeSet<String> {
    let mut features = BTreeSet::new();
    collect_features(expr, &mut features);
    features
}

fn collect_features(expr: &OutExpr, features: &mut BTreeSet<String>) {
    match expr {
        OutExpr::Inr | OutExpr::Trm => {}
        OutExpr::Lit(_, feature) => {
            features.insert(feature.clone());
        }
        OutExpr::Proj(inner, projection) => {
            if let Projection::Features(names) = projection {
                features.extend(names.iter().cloned());
            }
            collect_features(inner, features);
        }
        OutExpr::Unify(a, b) | OutExpr::Subtract(a, b) => {
            collect_features(a, features);
            collect_features(b, features);
        }
    }
}

/// Features whose output value a `TRM` leaf can influence.
///
/// Walks the AST carrying a taint flag: a subtree is tainted if it contains
/// `TRM` or is combined (via `unify`/`subtract`) with a sibling that does.
/// Every feature named under a tainted subtree enters the result. The
/// `P = V` fallback for unprojected `TRM` is [`uses_full_trm`]'s job.
pub fn trm_dependent_features(expr: &OutExpr) -> BTreeSet<String> {
    let mut features = BTreeSet::new();
    collect_tainted(expr, false, &mut features);
    features
}

fn collect_tainted(expr: &OutExpr, tainted: bool, features: &mut BTreeSet<String>) {
    match expr {
        OutExpr::Inr | OutExpr::Trm => {}
        OutExpr::Lit(_, feature) => {
            if tainted {
                features.insert(feature.clone());
            }
        }
        OutExpr::Proj(inner, projection) => {
            let tainted = tainted || contains_trm(inner);
            if tainted {
                if let Projection::Features(names) = projection {
                    features.extend(names.iter().cloned());
                }
            }
            collect_tainted(inner, tainted, features);
        }
        OutExpr::Unify(a, b) | OutExpr::Subtract(a, b) => {
            let tainted = tainted || contains_trm(a) || contains_trm(b);
            collect_tainted(a, tainted, features);
            collect_tainted(b, tainted, features);
        }
    }
}
