//! Property-based invariant tests for rules and validation tokens.
//!
//! 1. A rule chain reports the message of the first rule that fails on its
//!    own, and passes only when every rule passes on its own.
//! 2. Column-derived rules accept every finite number and blank value.
//! 3. Tokens issued by the coordinator strictly increase, whatever mix of
//!    async, sync, and reset runs produced them.
//! 4. For any completion order, a field's applied token never moves
//!    backwards, nothing stays in flight, and the trace verifies.

use formtable_core::{Column, FieldKind, FieldPath, FieldValue, Record};
use formtable_validation::{AsyncValidationCoordinator, FieldRules, ValidationToken};
use proptest::prelude::*;
use web_time::Instant;

// ── Helpers ─────────────────────────────────────────────────────────────

const RULES: usize = 5;

/// Rule `index` on its own, with its index as the message.
fn single_rule(rules: FieldRules, index: usize) -> FieldRules {
    let message = index.to_string();
    match index {
        0 => rules.required(message),
        1 => rules.number(message),
        2 => rules.min(1.0, message),
        3 => rules.max_length(3, message),
        _ => rules.one_of([FieldValue::from(1), FieldValue::from("a")], message),
    }
}

fn value_strategy() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        Just(FieldValue::Null),
        any::<bool>().prop_map(FieldValue::Bool),
        (-5i32..5).prop_map(FieldValue::from),
        "[a-z ]{0,5}".prop_map(FieldValue::Text),
    ]
}

fn message(rules: &FieldRules, value: &FieldValue) -> Option<String> {
    rules.check(value, &Record::new()).error_message()
}

#[derive(Debug, Clone)]
enum Op {
    Start(usize),
    Sync(usize),
    Invalidate(usize),
    Complete(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..2usize).prop_map(Op::Start),
        1 => (0..2usize).prop_map(Op::Sync),
        1 => (0..2usize).prop_map(Op::Invalidate),
        3 => (0..8usize).prop_map(Op::Complete),
    ]
}

// ═════════════════════════════════════════════════════════════════════════
// 1. First failure wins
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn chain_reports_first_failing_rule(
        order in Just((0..RULES).collect::<Vec<_>>()).prop_shuffle(),
        take in 0..=RULES,
        value in value_strategy(),
    ) {
        let order = &order[..take];
        let chain = order.iter().fold(FieldRules::new(), |rules, i| single_rule(rules, *i));
        prop_assert_eq!(chain.len(), order.len());

        let expected = order
            .iter()
            .copied()
            .find(|i| message(&single_rule(FieldRules::new(), *i), &value).is_some())
            .map(|i| i.to_string());
        prop_assert_eq!(message(&chain, &value), expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Column-derived rules
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn number_column_accepts_numbers_and_blanks(n in -1e9f64..1e9, blank in "[ ]{0,3}") {
        let optional = FieldRules::for_column(
            &Column::new("buy", "price").with_kind(FieldKind::Number),
        );
        prop_assert_eq!(message(&optional, &FieldValue::Number(n)), None);
        prop_assert_eq!(message(&optional, &FieldValue::Null), None);
        prop_assert_eq!(message(&optional, &FieldValue::Text(blank.clone())), None);

        let required = FieldRules::for_column(
            &Column::new("buy", "price").with_kind(FieldKind::Number).required(),
        );
        prop_assert_eq!(message(&required, &FieldValue::Number(n)), None);
        prop_assert!(message(&required, &FieldValue::Text(blank)).is_some());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3 + 4. Token ordering under any interleaving
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn tokens_and_applies_stay_ordered(ops in proptest::collection::vec(op_strategy(), 1..40)) {
        let t0 = Instant::now();
        let fields = [
            FieldPath::new("buy", "quantity").unwrap(),
            FieldPath::new("sell", "quantity").unwrap(),
        ];
        let mut coordinator = AsyncValidationCoordinator::with_origin(t0, 1024);
        let mut issued = ValidationToken::NONE;
        let mut outstanding: Vec<(usize, ValidationToken)> = Vec::new();
        let mut applied = [ValidationToken::NONE; 2];

        for op in ops {
            let token = match op {
                Op::Start(f) => {
                    let token = coordinator.start_validation(&fields[f], t0);
                    outstanding.push((f, token));
                    Some(token)
                }
                Op::Sync(f) => Some(coordinator.apply_sync(&fields[f], true, t0)),
                Op::Invalidate(f) => Some(coordinator.invalidate(&fields[f], t0)),
                Op::Complete(i) => {
                    if !outstanding.is_empty() {
                        let (f, token) = outstanding.remove(i % outstanding.len());
                        let _ = coordinator.try_apply(&fields[f], token, true, true, t0);
                    }
                    None
                }
            };
            if let Some(token) = token {
                prop_assert!(token > issued);
                issued = token;
            }
            for (f, path) in fields.iter().enumerate() {
                let last = coordinator.last_applied(path);
                prop_assert!(last >= applied[f]);
                applied[f] = last;
            }
        }

        for (f, token) in outstanding.drain(..) {
            let _ = coordinator.try_apply(&fields[f], token, true, true, t0);
        }
        prop_assert!(!coordinator.has_in_flight());
        prop_assert!(coordinator.verify_trace().is_ok());
    }
}
