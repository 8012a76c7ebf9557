//! Validation Invariant Tests
//!
//! The invalid-query grid: every malformed or semantically wrong shape
//! is rejected at parse time, before any record is touched, and the
//! dataset id binding fails fast when no qualified column exists.

use campusdb::query::{QueryEngine, QueryErrorCode, QueryParser};
use campusdb::schema::RecordKind;
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_sections(query: &Value) -> Result<campusdb::query::Query, campusdb::query::QueryError> {
    QueryParser::new("sections", RecordKind::Sections).parse(query)
}

fn assert_invalid(query: Value) {
    let err = parse_sections(&query).expect_err("query should be invalid");
    assert_eq!(err.code(), QueryErrorCode::InvalidQuery);
}

fn assert_valid(query: Value) {
    parse_sections(&query).expect("query should be valid");
}

// =============================================================================
// Dataset Id Binding Tests
// =============================================================================

/// The bound id is the prefix of the first qualified column.
#[test]
fn test_id_binding_from_first_qualified_column() {
    let query = json!({
        "WHERE": {},
        "OPTIONS": {"COLUMNS": ["overallAvg", "courses_dept"]}
    });
    assert_eq!(QueryEngine::extract_dataset_id(&query).unwrap(), "courses");
}

/// Binding fails fast on malformed shapes, before full validation.
#[test]
fn test_id_binding_failures() {
    for query in [
        json!(null),
        json!([1, 2]),
        json!({"WHERE": {}}),
        json!({"OPTIONS": {}}),
        json!({"OPTIONS": {"COLUMNS": []}}),
        json!({"OPTIONS": {"COLUMNS": ["bareword"]}}),
        json!({"OPTIONS": {"COLUMNS": 7}}),
    ] {
        let err = QueryEngine::extract_dataset_id(&query).expect_err("should fail");
        assert_eq!(err.code(), QueryErrorCode::InvalidQuery);
    }
}

// =============================================================================
// Query Shape Tests
// =============================================================================

/// WHERE and OPTIONS are mandatory; nothing else is permitted.
#[test]
fn test_top_level_shape() {
    assert_invalid(json!({"OPTIONS": {"COLUMNS": ["sections_dept"]}}));
    assert_invalid(json!({"WHERE": {}}));
    assert_invalid(json!({
        "WHERE": {},
        "OPTIONS": {"COLUMNS": ["sections_dept"]},
        "LIMIT": 5
    }));
    assert_invalid(json!({
        "WHERE": {},
        "OPTIONS": {"COLUMNS": ["sections_dept"]},
        "TRANSFORMATIONS": {"GROUP": ["sections_dept"], "APPLY": [{"n": {"COUNT": "sections_uuid"}}]},
        "EXTRA": 1
    }));
    assert_valid(json!({"WHERE": {}, "OPTIONS": {"COLUMNS": ["sections_dept"]}}));
}

// =============================================================================
// WHERE Grammar Tests
// =============================================================================

/// Every operator key outside the grammar is rejected.
#[test]
fn test_unknown_operator() {
    assert_invalid(json!({
        "WHERE": {"XOR": [{"GT": {"sections_avg": 70}}]},
        "OPTIONS": {"COLUMNS": ["sections_dept"]}
    }));
}

/// Filters hold exactly one operator.
#[test]
fn test_filter_operator_arity() {
    assert_invalid(json!({
        "WHERE": {"GT": {"sections_avg": 70}, "IS": {"sections_dept": "cpsc"}},
        "OPTIONS": {"COLUMNS": ["sections_dept"]}
    }));
}

/// Logic operators need non-empty arrays of single-operator children.
#[test]
fn test_logic_operator_children() {
    assert_invalid(json!({
        "WHERE": {"AND": []},
        "OPTIONS": {"COLUMNS": ["sections_dept"]}
    }));
    assert_invalid(json!({
        "WHERE": {"OR": {"GT": {"sections_avg": 70}}},
        "OPTIONS": {"COLUMNS": ["sections_dept"]}
    }));
    assert_invalid(json!({
        "WHERE": {"AND": [{}]},
        "OPTIONS": {"COLUMNS": ["sections_dept"]}
    }));
    assert_valid(json!({
        "WHERE": {"AND": [{"GT": {"sections_avg": 70}}, {"LT": {"sections_avg": 90}}]},
        "OPTIONS": {"COLUMNS": ["sections_dept"]}
    }));
}

/// NOT takes exactly one child filter.
#[test]
fn test_not_arity() {
    assert_invalid(json!({
        "WHERE": {"NOT": {}},
        "OPTIONS": {"COLUMNS": ["sections_dept"]}
    }));
    assert_valid(json!({
        "WHERE": {"NOT": {"EQ": {"sections_avg": 70}}},
        "OPTIONS": {"COLUMNS": ["sections_dept"]}
    }));
}

/// Measure comparisons need a measure field and a numeric literal.
#[test]
fn test_measure_comparison_rules() {
    assert_invalid(json!({
        "WHERE": {"GT": {"sections_dept": 70}},
        "OPTIONS": {"COLUMNS": ["sections_dept"]}
    }));
    assert_invalid(json!({
        "WHERE": {"GT": {"sections_avg": "70"}},
        "OPTIONS": {"COLUMNS": ["sections_dept"]}
    }));
    assert_invalid(json!({
        "WHERE": {"GT": {"sections_avg": 70, "sections_pass": 10}},
        "OPTIONS": {"COLUMNS": ["sections_dept"]}
    }));
}

/// String comparisons need a string field and edge-only wildcards.
#[test]
fn test_string_comparison_rules() {
    assert_invalid(json!({
        "WHERE": {"IS": {"sections_avg": "cpsc"}},
        "OPTIONS": {"COLUMNS": ["sections_dept"]}
    }));
    assert_invalid(json!({
        "WHERE": {"IS": {"sections_dept": 7}},
        "OPTIONS": {"COLUMNS": ["sections_dept"]}
    }));
    assert_invalid(json!({
        "WHERE": {"IS": {"sections_dept": "cp*sc"}},
        "OPTIONS": {"COLUMNS": ["sections_dept"]}
    }));
    assert_valid(json!({
        "WHERE": {"IS": {"sections_dept": "*cpsc*"}},
        "OPTIONS": {"COLUMNS": ["sections_dept"]}
    }));
}

/// Schema membership is kind-dependent: rooms fields fail under sections.
#[test]
fn test_cross_kind_fields_rejected() {
    assert_invalid(json!({
        "WHERE": {"GT": {"sections_seats": 100}},
        "OPTIONS": {"COLUMNS": ["sections_dept"]}
    }));
    assert_invalid(json!({
        "WHERE": {},
        "OPTIONS": {"COLUMNS": ["sections_fullname"]}
    }));

    // the same fields are fine when the dataset is a rooms dataset
    let rooms = QueryParser::new("rooms", RecordKind::Rooms);
    let query = json!({
        "WHERE": {"GT": {"rooms_seats": 100}},
        "OPTIONS": {"COLUMNS": ["rooms_fullname"]}
    });
    assert!(rooms.parse(&query).is_ok());
}

/// References to a different dataset id are rejected.
#[test]
fn test_foreign_id_rejected() {
    assert_invalid(json!({
        "WHERE": {"GT": {"other_avg": 70}},
        "OPTIONS": {"COLUMNS": ["sections_dept"]}
    }));
    assert_invalid(json!({
        "WHERE": {},
        "OPTIONS": {"COLUMNS": ["sections_dept", "other_avg"]}
    }));
}

// =============================================================================
// OPTIONS Tests
// =============================================================================

/// COLUMNS must be a non-empty string array of known fields.
#[test]
fn test_columns_rules() {
    assert_invalid(json!({"WHERE": {}, "OPTIONS": {"COLUMNS": []}}));
    assert_invalid(json!({"WHERE": {}, "OPTIONS": {"COLUMNS": [7]}}));
    assert_invalid(json!({"WHERE": {}, "OPTIONS": {"COLUMNS": ["sections_nope"]}}));
    assert_invalid(json!({"WHERE": {}, "OPTIONS": {"COLUMNS": "sections_dept"}}));
}

/// Unknown OPTIONS keys are rejected.
#[test]
fn test_options_keys() {
    assert_invalid(json!({
        "WHERE": {},
        "OPTIONS": {"COLUMNS": ["sections_dept"], "LIMIT": 5}
    }));
}

/// ORDER must reference COLUMNS, whatever its form.
#[test]
fn test_order_rules() {
    assert_invalid(json!({
        "WHERE": {},
        "OPTIONS": {"COLUMNS": ["sections_dept"], "ORDER": "sections_avg"}
    }));
    assert_invalid(json!({
        "WHERE": {},
        "OPTIONS": {"COLUMNS": ["sections_dept"], "ORDER": 7}
    }));
    assert_invalid(json!({
        "WHERE": {},
        "OPTIONS": {
            "COLUMNS": ["sections_dept"],
            "ORDER": {"dir": "UP", "keys": ["sections_avg"]}
        }
    }));
    assert_invalid(json!({
        "WHERE": {},
        "OPTIONS": {
            "COLUMNS": ["sections_dept"],
            "ORDER": {"dir": "DOWN"}
        }
    }));
    assert_invalid(json!({
        "WHERE": {},
        "OPTIONS": {
            "COLUMNS": ["sections_dept"],
            "ORDER": {"dir": "down", "keys": ["sections_dept"]}
        }
    }));
    assert_valid(json!({
        "WHERE": {},
        "OPTIONS": {
            "COLUMNS": ["sections_dept", "sections_avg"],
            "ORDER": {"dir": "UP", "keys": ["sections_avg", "sections_dept"]}
        }
    }));
}

// =============================================================================
// TRANSFORMATIONS Tests
// =============================================================================

/// GROUP and APPLY are both mandatory and non-empty.
#[test]
fn test_transformations_shape() {
    assert_invalid(json!({
        "WHERE": {},
        "OPTIONS": {"COLUMNS": ["sections_dept"]},
        "TRANSFORMATIONS": {"GROUP": ["sections_dept"]}
    }));
    assert_invalid(json!({
        "WHERE": {},
        "OPTIONS": {"COLUMNS": ["sections_dept"]},
        "TRANSFORMATIONS": {"APPLY": [{"n": {"COUNT": "sections_uuid"}}]}
    }));
    assert_invalid(json!({
        "WHERE": {},
        "OPTIONS": {"COLUMNS": ["sections_dept"]},
        "TRANSFORMATIONS": {"GROUP": [], "APPLY": [{"n": {"COUNT": "sections_uuid"}}]}
    }));
    assert_invalid(json!({
        "WHERE": {},
        "OPTIONS": {"COLUMNS": ["sections_dept"]},
        "TRANSFORMATIONS": {"GROUP": ["sections_dept"], "APPLY": []}
    }));
    assert_invalid(json!({
        "WHERE": {},
        "OPTIONS": {"COLUMNS": ["sections_dept"]},
        "TRANSFORMATIONS": {
            "GROUP": ["sections_dept"],
            "APPLY": [{"n": {"COUNT": "sections_uuid"}}],
            "HAVING": {}
        }
    }));
}

/// Apply keys must be unique across rules.
#[test]
fn test_duplicate_apply_keys() {
    assert_invalid(json!({
        "WHERE": {},
        "OPTIONS": {"COLUMNS": ["sections_dept", "n"]},
        "TRANSFORMATIONS": {
            "GROUP": ["sections_dept"],
            "APPLY": [
                {"n": {"MAX": "sections_avg"}},
                {"n": {"MIN": "sections_avg"}}
            ]
        }
    }));
}

/// Non-COUNT tokens aggregate measure fields only.
#[test]
fn test_apply_token_field_rules() {
    for token in ["MAX", "MIN", "AVG", "SUM"] {
        assert_invalid(json!({
            "WHERE": {},
            "OPTIONS": {"COLUMNS": ["sections_dept", "x"]},
            "TRANSFORMATIONS": {
                "GROUP": ["sections_dept"],
                "APPLY": [{"x": {token: "sections_dept"}}]
            }
        }));
    }
    assert_valid(json!({
        "WHERE": {},
        "OPTIONS": {"COLUMNS": ["sections_dept", "x"]},
        "TRANSFORMATIONS": {
            "GROUP": ["sections_dept"],
            "APPLY": [{"x": {"COUNT": "sections_dept"}}]
        }
    }));
    assert_invalid(json!({
        "WHERE": {},
        "OPTIONS": {"COLUMNS": ["sections_dept", "x"]},
        "TRANSFORMATIONS": {
            "GROUP": ["sections_dept"],
            "APPLY": [{"x": {"MEDIAN": "sections_avg"}}]
        }
    }));
}

/// With a transform present, COLUMNS may only expose GROUP or apply keys.
#[test]
fn test_transformed_columns_invariant() {
    assert_invalid(json!({
        "WHERE": {},
        "OPTIONS": {"COLUMNS": ["sections_dept", "sections_avg"]},
        "TRANSFORMATIONS": {
            "GROUP": ["sections_dept"],
            "APPLY": [{"x": {"MAX": "sections_avg"}}]
        }
    }));
    assert_valid(json!({
        "WHERE": {},
        "OPTIONS": {"COLUMNS": ["sections_dept", "x"]},
        "TRANSFORMATIONS": {
            "GROUP": ["sections_dept"],
            "APPLY": [{"x": {"MAX": "sections_avg"}}]
        }
    }));
}

/// GROUP entries must be qualified field references.
#[test]
fn test_group_entries_are_field_refs() {
    assert_invalid(json!({
        "WHERE": {},
        "OPTIONS": {"COLUMNS": ["sections_dept", "x"]},
        "TRANSFORMATIONS": {
            "GROUP": ["sections_dept", "x"],
            "APPLY": [{"x": {"MAX": "sections_avg"}}]
        }
    }));
    assert_invalid(json!({
        "WHERE": {},
        "OPTIONS": {"COLUMNS": ["sections_dept"]},
        "TRANSFORMATIONS": {
            "GROUP": [7],
            "APPLY": [{"x": {"MAX": "sections_avg"}}]
        }
    }));
}
