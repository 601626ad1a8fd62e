//! Property-based invariant tests for paths and input translation.
//!
//! 1. Any valid `(form, field)` pair renders to a path that parses back to
//!    the same pair, through both `parse` and `FromStr`.
//! 2. A string with zero or several separators never parses.
//! 3. Number input never yields a non-finite number, and every number it
//!    yields is what the trimmed text parses to.
//! 4. Blank input is `Null` for number and select columns.

use formtable_core::{FieldKind, FieldPath, FieldValue, PATH_SEPARATOR, PathError, SelectOption};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn identifier() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_ -]{0,11}"
}

fn numeric_text() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<f64>().prop_map(|n| n.to_string()),
        any::<i64>().prop_map(|n| format!(" {n} ")),
        Just("NaN".to_string()),
        Just("inf".to_string()),
        Just("-infinity".to_string()),
        Just("1e400".to_string()),
        "[0-9.eE+-]{0,8}",
        ".{0,8}",
    ]
}

fn select_kind() -> FieldKind {
    FieldKind::Select {
        options: vec![SelectOption::new("a", "Alpha"), SelectOption::new(2, "Two")],
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Path round trip
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn path_display_parses_back(form in identifier(), field in identifier()) {
        let path = FieldPath::new(form.clone(), field.clone()).unwrap();
        let rendered = path.to_string();
        prop_assert_eq!(&rendered, &format!("{form}{PATH_SEPARATOR}{field}"));

        let parsed = FieldPath::parse(&rendered).unwrap();
        prop_assert_eq!(parsed.form(), form.as_str());
        prop_assert_eq!(parsed.field(), field.as_str());
        prop_assert_eq!(rendered.parse::<FieldPath>().unwrap(), path);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Separator count
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn path_needs_exactly_one_separator(
        parts in proptest::collection::vec(identifier(), 1..5)
            .prop_filter("two parts is the valid shape", |p| p.len() != 2),
    ) {
        let joined = parts.join(&PATH_SEPARATOR.to_string());
        prop_assert_eq!(FieldPath::parse(&joined), Err(PathError::Malformed(joined.clone())));
    }

    #[test]
    fn identifiers_with_separator_are_rejected(form in identifier(), field in identifier()) {
        let dotted = format!("{form}{PATH_SEPARATOR}x");
        prop_assert!(matches!(
            FieldPath::new(dotted, field),
            Err(PathError::ContainsSeparator(_))
        ));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Number input stays finite
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn number_input_is_finite_or_text(raw in numeric_text()) {
        match FieldKind::Number.parse_input(&raw) {
            FieldValue::Number(n) => {
                prop_assert!(n.is_finite());
                prop_assert_eq!(raw.trim().parse::<f64>().ok(), Some(n));
            }
            FieldValue::Null => prop_assert!(raw.trim().is_empty()),
            FieldValue::Text(text) => {
                prop_assert_eq!(&text, &raw);
                prop_assert!(!raw.trim().parse::<f64>().is_ok_and(f64::is_finite));
            }
            FieldValue::Bool(_) => prop_assert!(false, "number input produced a bool"),
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Blank input
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn blank_input_is_null(raw in "[ \t]{0,6}") {
        prop_assert_eq!(FieldKind::Number.parse_input(&raw), FieldValue::Null);
        prop_assert_eq!(select_kind().parse_input(&raw), FieldValue::Null);
        prop_assert_eq!(FieldKind::Text.parse_input(&raw), FieldValue::Text(raw.clone()));
    }
}
