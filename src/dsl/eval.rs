//! Out expression evaluation.
//!
//! Evaluation is pure and deterministic. The environment binds exactly two
//! bundles, `INR` and `TRM`; nothing else distinguishes them at evaluation
//! time. The reference evaluator and the transducer builder both go through
//! [`eval_out`], so the two application paths cannot drift apart.

use crate::bundle::{Bundle, TernaryTuple};
use crate::features::{FeatureId, FeatureUniverse, Ternary};

use super::ast::{OutExpr, Projection};
use super::DslError;

/// The evaluation environment: the two bound bundles plus the feature
/// universe used to resolve feature names.
#[derive(Debug, Clone, Copy)]
pub struct OutContext<'a> {
    /// The bundle bound to `INR`.
    pub inr: &'a Bundle,
    /// The bundle bound to `TRM`.
    pub trm: &'a Bundle,
    /// Feature-name resolution.
    pub universe: &'a FeatureUniverse,
}

/// Evaluate an Out expression to a bundle.
pub fn eval(expr: &OutExpr, context: &OutContext<'_>) -> Result<Bundle, DslError> {
    match expr {
        OutExpr::Inr => Ok(context.inr.clone()),
        OutExpr::Trm => Ok(context.trm.clone()),
        OutExpr::Lit(polarity, feature) => {
            let id = resolve(feature, context.universe)?;
            Ok(Bundle::singleton(id, *polarity))
        }
        OutExpr::Proj(inner, Projection::All) => {
            // Restriction to the full universe keeps everything.
            eval(inner, context)
        }
        OutExpr::Proj(inner, Projection::Features(features)) => {
            let bundle = eval(inner, context)?;
            let keep = features
                .iter()
                .map(|feature| resolve(feature, context.universe))
                .collect::<Result<Vec<FeatureId>, _>>()?;
            Ok(bundle.project(&keep))
        }
        OutExpr::Unify(a, b) => Ok(eval(a, context)?.unify(&eval(b, context)?)),
        OutExpr::Subtract(a, b) => Ok(eval(a, context)?.subtract(&eval(b, context)?)),
    }
}

/// Evaluate a rule's Out expression on witness tuples.
///
/// `INR` is bound to the bundle for `x_v` over `V`; `TRM` is reconstructed
/// from the machine memory `mem_p` over `P` (features in `V \ P` come out
/// unspecified). The result is projected back onto `V_order`.
pub fn eval_out(
    expr: &OutExpr,
    x_v: &[Ternary],
    v_order: &[FeatureId],
    mem_p: &[Ternary],
    p_order: &[FeatureId],
    universe: &FeatureUniverse,
) -> Result<TernaryTuple, DslError> {
    let inr = Bundle::from_tuple(x_v, v_order);
    let trm = Bundle::from_tuple(mem_p, p_order);
    let context = OutContext {
        inr: &inr,
        trm: &trm,
        universe,
    };
    Ok(eval(expr, &context)?.to_tuple(v_order))
}

fn resolve(feature: &str, universe: &FeatureUniverse) -> Result<FeatureId, DslError> {
    universe.id(feature).ok_or_else(|| DslError::UnknownFeature {
        feature: feature.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Polarity;

    fn universe() -> FeatureUniverse {
        FeatureUniverse::new(vec![
            "Voice".to_string(),
            "Consonantal".to_string(),
            "Continuant".to_string(),
        ])
    }

    fn eval_str(source: &str, inr: &Bundle, trm: &Bundle) -> Result<Bundle, DslError> {
        let universe = universe();
        let expr = OutExpr::parse(source).unwrap();
        eval(
            &expr,
            &OutContext {
                inr,
                trm,
                universe: &universe,
            },
        )
    }

    #[test]
    fn test_complex_expression() {
        // Drop TRM's Voice, then pick up INR's.
        let inr = Bundle::from_entries([(0, Polarity::Plus), (1, Polarity::Minus)]);
        let trm = Bundle::from_entries([(0, Polarity::Minus), (2, Polarity::Plus)]);
        let result = eval_str(
            "(unify (subtract (expand TRM) (proj TRM (Voice))) (proj INR (Voice)))",
            &inr,
            &trm,
        )
        .unwrap();
        assert_eq!(
            result,
            Bundle::from_entries([(0, Polarity::Plus), (2, Polarity::Plus)])
        );
    }

    #[test]
    fn test_empty_projection() {
        let inr = Bundle::singleton(0, Polarity::Plus);
        let result = eval_str("(proj INR ())", &inr, &Bundle::new()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_unknown_feature() {
        let error = eval_str("(lit + Nasal)", &Bundle::new(), &Bundle::new()).unwrap_err();
        assert!(matches!(error, DslError::UnknownFeature { .. }));

        let error = eval_str("(proj INR (Nasal))", &Bundle::new(), &Bundle::new()).unwrap_err();
        assert!(matches!(error, DslError::UnknownFeature { .. }));
    }

    #[test]
    fn test_literal_chains() {
        let result = eval_str(
            "(unify (unify (lit + Voice) (lit - Consonantal)) (lit + Continuant))",
            &Bundle::new(),
            &Bundle::new(),
        )
        .unwrap();
        assert_eq!(
            result,
            Bundle::from_entries([
                (0, Polarity::Plus),
                (1, Polarity::Minus),
                (2, Polarity::Plus)
            ])
        );
    }

    #[test]
    fn test_subtract_literal() {
        let result = eval_str(
            "(subtract (unify (lit + Voice) (lit - Consonantal)) (lit + Voice))",
            &Bundle::new(),
            &Bundle::new(),
        )
        .unwrap();
        assert_eq!(result, Bundle::singleton(1, Polarity::Minus));
    }

    #[test]
    fn test_eval_out_reconstructs_trm_from_memory() {
        let universe = universe();
        // V = {Voice, Continuant}, P = {Voice}.
        let v_order = [0usize, 2];
        let p_order = [0usize];
        let expr = OutExpr::parse("(unify (proj TRM (Voice)) INR)").unwrap();
        let x_v = [Ternary::Plus, Ternary::Minus];
        let mem_p = [Ternary::Minus];
        let out = eval_out(&expr, &x_v, &v_order, &mem_p, &p_order, &universe).unwrap();
        // TRM's Voice wins the left-biased unify; Continuant comes from INR.
        assert_eq!(out.as_slice(), &[Ternary::Minus, Ternary::Minus]);
    }
}
