//! Property tests for the expression parser and builder.

use proptest::prelude::*;

use penguin_graph::{Cluster, ExpressionParser, Polarity, Registry, GraphBuilder, Mission};

// ─────────────────────────────────────────────────────────────────────────────
// Strategies
// ─────────────────────────────────────────────────────────────────────────────

fn arb_term() -> impl Strategy<Value = String> {
    prop_oneof![
        (0..100_001i32).prop_map(|b| format!("b{b}")),
        (0..100_001i32).prop_map(|b| format!("!b{b}")),
        (128..1128i32).prop_map(|m| format!("s{m}")),
        (128..1128i32).prop_map(|m| format!("a{m}")),
    ]
}

fn arb_expr() -> impl Strategy<Value = String> {
    arb_term().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4).prop_map(|v| v.join(" & ")),
            prop::collection::vec(inner.clone(), 1..4).prop_map(|v| v.join(" | ")),
            inner.clone().prop_map(|e| format!("({e})")),
            inner.prop_map(|e| format!("!({e})")),
        ]
    })
}

fn sorted_pairs(terms: &[penguin_graph::Term]) -> Vec<(i32, Polarity)> {
    let mut pairs: Vec<_> = terms.iter().map(|t| (t.id, t.polarity)).collect();
    pairs.sort();
    pairs
}

// ─────────────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn prop_reparse_yields_same_terms(expr in arb_expr()) {
        let parser = ExpressionParser::default();
        let first = parser.scan(&expr, true).unwrap();
        let second = parser.scan(&first.to_string(), true).unwrap();
        prop_assert_eq!(sorted_pairs(&first.bits), sorted_pairs(&second.bits));
        prop_assert_eq!(sorted_pairs(&first.missions), sorted_pairs(&second.missions));
    }

    #[test]
    fn prop_malformed_expression_writes_nothing(expr in arb_expr(), open in any::<bool>()) {
        let broken = if open { format!("({expr}") } else { format!("{expr})") };
        let mut bits = Cluster::default();
        let mut missions = Cluster::default();
        let parser = ExpressionParser::default();
        prop_assert!(parser.parse(&broken, &mut bits, Some(&mut missions)).is_err());
        prop_assert!(bits.is_empty());
        prop_assert!(missions.is_empty());
    }

    #[test]
    fn prop_builder_keeps_back_references(expr in arb_expr()) {
        let mut registry = Registry::default();
        let mut mission = Mission::new(200, "Prop");
        mission.on_success = expr;
        GraphBuilder::new(&mut registry, ExpressionParser::default()).add_mission(mission).unwrap();

        let built = registry.missions.get(200).unwrap();
        for term in built.b_success.terms() {
            let bit = registry.bits.get(term.id).unwrap();
            prop_assert!(bit.misn_success.side(term.polarity).contains(200).unwrap());
        }
    }
}
