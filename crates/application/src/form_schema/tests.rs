use std::sync::Arc;

use hirely_core::FieldViolation;
use hirely_domain::{
    FieldDefinition, FieldDefinitionInput, FieldSection, FieldType, ValidationRules,
};
use proptest::prelude::*;
use serde_json::{Map, Value, json};

use super::{SchemaCache, generate_schema, normalize_phone, suggest_email_correction};

fn field(key: &str, field_type: FieldType, required: bool) -> FieldDefinition {
    field_with_rules(key, field_type, required, None)
}

fn field_with_rules(
    key: &str,
    field_type: FieldType,
    required: bool,
    validation_rules: Option<ValidationRules>,
) -> FieldDefinition {
    FieldDefinition::new(FieldDefinitionInput {
        key: key.to_owned(),
        field_type,
        label: key.to_owned(),
        placeholder: None,
        description: None,
        required,
        validation_rules,
        section: FieldSection::Personal,
        display_order: 0,
        active: true,
    })
    .unwrap_or_else(|_| unreachable!())
}

fn record(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), value.clone()))
        .collect()
}

fn violated_rules(
    result: Result<Map<String, Value>, Vec<FieldViolation>>,
) -> Vec<(String, String)> {
    result
        .err()
        .unwrap_or_default()
        .into_iter()
        .map(|violation| (violation.field, violation.rule))
        .collect()
}

#[test]
fn schema_covers_only_active_fields() {
    let inactive = field("legacy_code", FieldType::Text, true).with_active(false);
    let schema = generate_schema(&[field("email", FieldType::Email, true), inactive]);

    assert_eq!(schema.field_keys(), vec!["email"]);
    assert!(schema.validate(&record(&[("email", json!("a@b.com"))])).is_ok());
}

#[test]
fn required_email_rejects_empty_and_malformed_values() {
    let schema = generate_schema(&[field("email", FieldType::Email, true)]);

    assert_eq!(
        violated_rules(schema.validate(&record(&[("email", json!("   "))]))),
        vec![("email".to_owned(), "required".to_owned())]
    );
    assert_eq!(
        violated_rules(schema.validate(&record(&[("email", json!("not-an-email"))]))),
        vec![("email".to_owned(), "format".to_owned())]
    );
}

#[test]
fn optional_email_and_url_accept_empty_strings() {
    let schema = generate_schema(&[
        field("email", FieldType::Email, false),
        field("linkedin", FieldType::Url, false),
    ]);

    let normalized = schema
        .validate(&record(&[("email", json!("")), ("linkedin", json!(""))]))
        .unwrap_or_default();
    assert_eq!(normalized.get("email"), Some(&json!("")));

    let result = schema.validate(&record(&[("linkedin", json!("linkedin/ada"))]));
    assert_eq!(
        violated_rules(result),
        vec![("linkedin".to_owned(), "format".to_owned())]
    );
}

#[test]
fn numbers_are_coerced_and_bounded() {
    let schema = generate_schema(&[field_with_rules(
        "years_experience",
        FieldType::Number,
        true,
        Some(ValidationRules {
            min: Some(0.0),
            max: Some(60.0),
            options: Vec::new(),
        }),
    )]);

    let normalized = schema
        .validate(&record(&[("years_experience", json!(" 12 "))]))
        .unwrap_or_default();
    assert_eq!(normalized.get("years_experience"), Some(&json!(12)));

    assert_eq!(
        violated_rules(schema.validate(&record(&[("years_experience", json!(75))]))),
        vec![("years_experience".to_owned(), "max".to_owned())]
    );
    assert_eq!(
        violated_rules(schema.validate(&record(&[("years_experience", json!("twelve"))]))),
        vec![("years_experience".to_owned(), "type".to_owned())]
    );
}

#[test]
fn optional_number_accepts_absence() {
    let schema = generate_schema(&[field("daily_rate", FieldType::Number, false)]);
    let normalized = schema
        .validate(&record(&[("daily_rate", json!(""))]))
        .unwrap_or_else(|_| unreachable!());
    assert!(normalized.is_empty());
}

#[test]
fn tel_requires_ten_characters() {
    let schema = generate_schema(&[field("phone", FieldType::Tel, true)]);
    assert!(schema.validate(&record(&[("phone", json!("06 12 34 56 78"))])).is_ok());
    assert_eq!(
        violated_rules(schema.validate(&record(&[("phone", json!("12345"))]))),
        vec![("phone".to_owned(), "min_length".to_owned())]
    );
}

#[test]
fn text_length_and_options_are_enforced() {
    let schema = generate_schema(&[
        field_with_rules(
            "summary",
            FieldType::Textarea,
            false,
            Some(ValidationRules {
                min: Some(5.0),
                max: Some(10.0),
                options: Vec::new(),
            }),
        ),
        field_with_rules(
            "availability",
            FieldType::Select,
            true,
            Some(ValidationRules {
                options: vec!["immediate".to_owned(), "one_month".to_owned()],
                ..ValidationRules::default()
            }),
        ),
    ]);

    let result = schema.validate(&record(&[
        ("summary", json!("tiny")),
        ("availability", json!("never")),
    ]));
    assert_eq!(
        violated_rules(result),
        vec![
            ("availability".to_owned(), "options".to_owned()),
            ("summary".to_owned(), "min_length".to_owned()),
        ]
    );
}

#[test]
fn file_fields_accept_any_value() {
    let schema = generate_schema(&[field("cv", FieldType::File, true)]);
    assert!(schema.validate(&Map::new()).is_ok());
    assert!(schema.validate(&record(&[("cv", json!({"name": "cv.pdf"}))])).is_ok());
    assert_eq!(schema.required_keys_of_type(FieldType::File), vec!["cv"]);
}

#[test]
fn keys_outside_the_active_catalog_are_dropped() {
    let schema = generate_schema(&[
        field("first_name", FieldType::Text, true),
        field("linkedin_note", FieldType::Text, false).with_active(false),
    ]);

    let normalized = schema
        .validate(&record(&[
            ("first_name", json!(" Ada ")),
            ("linkedin_note", json!("left over from a draft")),
            ("salary", json!("1")),
        ]))
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(normalized, record(&[("first_name", json!("Ada"))]));
}

#[test]
fn cache_returns_same_schema_for_unchanged_catalog() {
    let cache = SchemaCache::new();
    let fields = vec![
        field("email", FieldType::Email, true),
        field("cv", FieldType::File, true),
    ];

    let first = cache.schema_for(&fields);
    let second = cache.schema_for(&fields);
    assert!(Arc::ptr_eq(&first, &second));

    let changed = vec![field("email", FieldType::Email, false)];
    let third = cache.schema_for(&changed);
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(third.field_keys(), vec!["email"]);
}

#[test]
fn email_typos_get_suggestions() {
    assert_eq!(
        suggest_email_correction("ada@gmial.com"),
        Some("ada@gmail.com".to_owned())
    );
    assert_eq!(suggest_email_correction("ada@example.com"), None);
    assert_eq!(normalize_phone(" +33 (6) 12-34.56 "), "+336123456");
}

fn arbitrary_field_type() -> impl Strategy<Value = FieldType> {
    prop_oneof![
        Just(FieldType::Text),
        Just(FieldType::Number),
        Just(FieldType::Email),
        Just(FieldType::Tel),
        Just(FieldType::Textarea),
        Just(FieldType::Select),
        Just(FieldType::Url),
        Just(FieldType::Date),
    ]
}

fn valid_value(field_type: FieldType) -> Value {
    match field_type {
        FieldType::Number => json!(42),
        FieldType::Email => json!("ada@example.com"),
        FieldType::Tel => json!("+33612345678"),
        FieldType::Url => json!("https://example.com/ada"),
        FieldType::Date => json!("2026-01-31"),
        FieldType::File => json!("cv.pdf"),
        FieldType::Text | FieldType::Textarea | FieldType::Select => json!("Ada Lovelace"),
    }
}

proptest! {
    #[test]
    fn populated_records_pass_and_missing_required_fields_fail(
        specs in proptest::collection::vec((arbitrary_field_type(), any::<bool>()), 1..8),
        removed in any::<proptest::sample::Index>(),
    ) {
        let fields: Vec<FieldDefinition> = specs
            .iter()
            .enumerate()
            .map(|(index, (field_type, required))| {
                field(format!("field_{index}").as_str(), *field_type, *required)
            })
            .collect();
        let schema = generate_schema(&fields);

        let complete: Map<String, Value> = fields
            .iter()
            .map(|field| (field.key().to_owned(), valid_value(field.field_type())))
            .collect();
        prop_assert!(schema.validate(&complete).is_ok());

        let target = &fields[removed.index(fields.len())];
        let mut incomplete = complete.clone();
        incomplete.remove(target.key());
        let result = schema.validate(&incomplete);
        if target.is_required() {
            let violations = result.err().unwrap_or_default();
            let reported = violations
                .iter()
                .any(|violation| violation.field == target.key() && violation.rule == "required");
            prop_assert!(reported, "missing required violation for {}", target.key());
        } else {
            prop_assert!(result.is_ok());
        }
    }
}
