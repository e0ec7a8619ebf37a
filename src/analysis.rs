//! Per-rule dependency analysis.
//!
//! Extracts from a rule the grammar-visible feature set `V` and the
//! Out-visible terminator set `P ⊆ V`, each ordered by position in the
//! feature universe. These two sets control the size of the compiled
//! machine: `1 + 3^|P|` states and `(1 + 3^|P|) · 3^|V|` arcs, so keeping
//! them minimal is what makes direct construction feasible.

use std::collections::BTreeSet;

use crate::dsl::{analysis as out_analysis, OutExpr};
use crate::features::{FeatureId, FeatureUniverse};
use crate::rules::Rule;
use crate::validate::SchemaError;

/// The dependency sets of one rule, in canonical order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleAnalysis {
    v_order: Vec<FeatureId>,
    p_order: Vec<FeatureId>,
}

impl RuleAnalysis {
    /// Analyse a rule against a feature universe.
    ///
    /// `V` is the union of the class features and the features the Out
    /// expression names, expanding to the full universe if the expression
    /// contains any `proj … *`. `P` is the TRM-sensitive subset (all of
    /// `V` when `TRM` escapes unprojected, all of `F` under `proj TRM *`).
    /// Unknown features in either source are rejected, which is what keeps
    /// `P ⊆ V ⊆ F` an invariant rather than a hope.
    pub fn analyze(
        rule: &Rule,
        out: &OutExpr,
        universe: &FeatureUniverse,
    ) -> Result<Self, SchemaError> {
        let mut issues = Vec::new();
        let mut v: BTreeSet<FeatureId> = BTreeSet::new();

        for (label, class) in [("inr", &rule.inr), ("trm", &rule.trm), ("cnd", &rule.cnd)] {
            for literal in class {
                match universe.id(literal.feature()) {
                    Some(id) => {
                        v.insert(id);
                    }
                    None => issues.push(format!(
                        "rule {} {label} has unknown feature: {:?}",
                        rule.id,
                        literal.feature()
                    )),
                }
            }
        }

        let mut named: BTreeSet<FeatureId> = BTreeSet::new();
        for feature in out_analysis::out_features(out) {
            match universe.id(&feature) {
                Some(id) => {
                    named.insert(id);
                }
                None => issues.push(format!(
                    "rule {} out has unknown feature: {feature:?}",
                    rule.id
                )),
            }
        }
        if let Some(error) = SchemaError::from_issues(issues) {
            return Err(error);
        }
        v.extend(&named);

        let v_order: Vec<FeatureId> = if out_analysis::contains_all_projection(out) {
            universe.all_ids()
        } else {
            v.into_iter().collect()
        };

        let unconfined_trm =
            out_analysis::uses_all_trm(out) || out_analysis::uses_full_trm(out);
        let p: BTreeSet<FeatureId> = if unconfined_trm {
            v_order.iter().copied().collect()
        } else {
            // Named TRM-sensitive features; all of them already sit in V.
            out_analysis::trm_dependent_features(out)
                .iter()
                .filter_map(|feature| universe.id(feature))
                .collect()
        };
        let p_order: Vec<FeatureId> =
            v_order.iter().copied().filter(|id| p.contains(id)).collect();

        Ok(Self { v_order, p_order })
    }

    /// `V` in feature-universe order.
    pub fn v_order(&self) -> &[FeatureId] {
        &self.v_order
    }

    /// `P` as a subsequence of `V_order`.
    pub fn p_order(&self) -> &[FeatureId] {
        &self.p_order
    }

    /// `V` as feature names, in order.
    pub fn v_names<'a>(&self, universe: &'a FeatureUniverse) -> Vec<&'a str> {
        self.v_order.iter().map(|&id| universe.name(id)).collect()
    }

    /// `P` as feature names, in order.
    pub fn p_names<'a>(&self, universe: &'a FeatureUniverse) -> Vec<&'a str> {
        self.p_order.iter().map(|&id| universe.name(id)).collect()
    }

    /// Number of machine states, `1 + 3^|P|`.
    pub fn state_count(&self) -> u128 {
        1 + pow3(self.p_order.len())
    }

    /// Projected arc count, `(1 + 3^|P|) · 3^|V|`.
    pub fn projected_arcs(&self) -> u128 {
        self.state_count().saturating_mul(pow3(self.v_order.len()))
    }
}

/// `3^n` in `u128`, saturating on (absurdly large) exponents.
pub fn pow3(n: usize) -> u128 {
    let mut result: u128 = 1;
    for _ in 0..n {
        result = result.saturating_mul(3);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Polarity;
    use crate::rules::{Direction, FeatureLiteral};

    fn universe() -> FeatureUniverse {
        FeatureUniverse::new(vec![
            "Voice".to_string(),
            "Continuant".to_string(),
            "Nasal".to_string(),
            "Consonantal".to_string(),
        ])
    }

    fn rule(inr: &[(Polarity, &str)], trm: &[(Polarity, &str)], cnd: &[(Polarity, &str)], out: &str) -> (Rule, OutExpr) {
        let class = |literals: &[(Polarity, &str)]| {
            literals
                .iter()
                .map(|&(polarity, feature)| FeatureLiteral::new(polarity, feature))
                .collect()
        };
        let rule = Rule {
            id: "r".to_string(),
            dir: Direction::Left,
            inr: class(inr),
            trm: class(trm),
            cnd: class(cnd),
            out: out.to_string(),
        };
        let expr = OutExpr::parse(out).unwrap();
        (rule, expr)
    }

    #[test]
    fn test_v_includes_classes_and_out() {
        let universe = universe();
        let (rule, out) = rule(
            &[(Polarity::Plus, "Voice")],
            &[(Polarity::Minus, "Continuant")],
            &[(Polarity::Plus, "Nasal")],
            "(proj INR (Continuant Consonantal))",
        );
        let analysis = RuleAnalysis::analyze(&rule, &out, &universe).unwrap();
        assert_eq!(analysis.v_names(&universe), vec!["Voice", "Continuant", "Nasal", "Consonantal"]);
    }

    #[test]
    fn test_p_from_trm_sensitivity() {
        let universe = universe();
        let (rule, out) = rule(&[], &[], &[], "(unify (proj TRM (Voice)) INR)");
        let analysis = RuleAnalysis::analyze(&rule, &out, &universe).unwrap();
        assert_eq!(analysis.p_names(&universe), vec!["Voice"]);
    }

    #[test]
    fn test_all_trm_expands_v_and_p() {
        let universe = universe();
        let (rule, out) = rule(&[(Polarity::Plus, "Voice")], &[], &[], "(proj TRM *)");
        let analysis = RuleAnalysis::analyze(&rule, &out, &universe).unwrap();
        assert_eq!(analysis.v_order(), &[0, 1, 2, 3]);
        assert_eq!(analysis.p_order(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_all_inr_expands_v_only() {
        let universe = universe();
        let (rule, out) = rule(&[(Polarity::Plus, "Voice")], &[], &[], "(proj INR *)");
        let analysis = RuleAnalysis::analyze(&rule, &out, &universe).unwrap();
        assert_eq!(analysis.v_order(), &[0, 1, 2, 3]);
        assert!(analysis.p_order().is_empty());
    }

    #[test]
    fn test_full_trm_falls_back_to_v() {
        let universe = universe();
        let (rule, out) = rule(
            &[(Polarity::Plus, "Voice")],
            &[],
            &[(Polarity::Minus, "Nasal")],
            "(subtract (proj TRM *) (proj TRM (Voice)))",
        );
        let analysis = RuleAnalysis::analyze(&rule, &out, &universe).unwrap();
        assert_eq!(analysis.p_order(), analysis.v_order());
    }

    #[test]
    fn test_identity_rule_is_tiny() {
        let universe = universe();
        let (rule, out) = rule(&[], &[], &[], "INR");
        let analysis = RuleAnalysis::analyze(&rule, &out, &universe).unwrap();
        assert!(analysis.v_order().is_empty());
        assert!(analysis.p_order().is_empty());
        assert_eq!(analysis.state_count(), 2);
        assert_eq!(analysis.projected_arcs(), 2);
    }

    #[test]
    fn test_order_follows_universe_not_alphabetical() {
        let universe = FeatureUniverse::new(vec!["Zeta".to_string(), "Alpha".to_string()]);
        let (rule, out) = rule(&[], &[], &[], "(unify (lit + Alpha) (lit - Zeta))");
        let analysis = RuleAnalysis::analyze(&rule, &out, &universe).unwrap();
        assert_eq!(analysis.v_names(&universe), vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn test_unknown_feature_rejected() {
        let universe = universe();
        let (rule, out) = rule(&[(Polarity::Plus, "Sonorant")], &[], &[], "INR");
        let error = RuleAnalysis::analyze(&rule, &out, &universe).unwrap_err();
        assert!(error.to_string().contains("unknown feature"));
    }

    #[test]
    fn test_pow3() {
        assert_eq!(pow3(0), 1);
        assert_eq!(pow3(4), 81);
    }
}
