//! The compiled routine must report exactly what the interpreter reports, for
//! arbitrary schemas and arbitrary inputs.

use indexmap::IndexMap;
use proptest::prelude::*;
use serde_json::{json, Value};
use stricture_core::{DateTimeFormat, SchemaDef, TypeDef};
use stricture_runtime::{
    compile, Interpreter, UnionFailureMode, ValidateOptions, DEFAULT_MAX_PROGRAM_OPS,
};

fn bounds() -> impl Strategy<Value = (Option<u64>, Option<u64>)> {
    (prop::option::of(0u64..3), prop::option::of(0u64..3)).prop_map(|(min, extra)| {
        let max = extra.map(|extra| min.unwrap_or(0) + extra);
        (min, max)
    })
}

fn leaf_def() -> impl Strategy<Value = TypeDef> {
    prop_oneof![
        bounds().prop_map(|(min_length, max_length)| TypeDef::String {
            min_length,
            max_length
        }),
        (prop::option::of(-2i64..2), prop::option::of(0i64..200)).prop_map(|(minimum, extra)| {
            TypeDef::Integer {
                minimum,
                maximum: extra.map(|e| minimum.unwrap_or(0) + e),
            }
        }),
        (prop::option::of(-2.0f64..0.0), prop::option::of(0.0f64..2.0)).prop_map(|(minimum, maximum)| {
            TypeDef::Float { minimum, maximum }
        }),
        Just(TypeDef::Boolean),
        Just(TypeDef::Null),
        Just(TypeDef::Undefined),
        Just(TypeDef::Date),
        prop_oneof![Just(DateTimeFormat::Rfc3339), Just(DateTimeFormat::Lenient)]
            .prop_map(|format| TypeDef::DateTime { format }),
        Just(TypeDef::Exact {
            value: "a".to_string()
        }),
        Just(TypeDef::Regex {
            pattern: "^a".to_string()
        }),
        Just(TypeDef::Unknown),
        bounds().prop_map(|(min_length, max_length)| TypeDef::Buffer {
            min_length,
            max_length
        }),
    ]
}

fn with_flags(ty: impl Strategy<Value = TypeDef>) -> impl Strategy<Value = SchemaDef> {
    (ty, any::<bool>(), any::<bool>()).prop_map(|(ty, optional, nullable)| SchemaDef {
        ty,
        optional,
        nullable,
        name: None,
        rename: None,
    })
}

fn schema_def() -> impl Strategy<Value = SchemaDef> {
    with_flags(leaf_def()).prop_recursive(4, 32, 4, |inner| {
        with_flags(prop_oneof![
            prop::collection::vec(
                (prop::sample::select(vec!["a", "b", "c"]), inner.clone()),
                0..4
            )
            .prop_map(|fields| {
                let fields: IndexMap<String, SchemaDef> = fields
                    .into_iter()
                    .map(|(name, def)| (name.to_string(), def))
                    .collect();
                TypeDef::Object { fields }
            }),
            (inner.clone(), bounds()).prop_map(|(items, (min_items, max_items))| {
                TypeDef::Array {
                    items: Box::new(items),
                    min_items,
                    max_items,
                }
            }),
            prop::collection::vec(inner.clone(), 0..3).prop_map(|items| TypeDef::Tuple { items }),
            (inner.clone(), bounds()).prop_map(|(values, (min_keys, max_keys))| {
                TypeDef::Record {
                    values: Box::new(values),
                    min_keys,
                    max_keys,
                }
            }),
            prop::collection::vec(inner, 1..4).prop_map(|any_of| TypeDef::Union { any_of }),
        ])
    })
}

fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        (-3i64..300).prop_map(Value::from),
        (-2.5f64..2.5).prop_map(|f| json!(f)),
        prop::sample::select(vec![
            "",
            "a",
            "abc",
            "2024-02-29",
            "2024-02-29T10:00:00Z",
            "2024-02-29 10:00:00",
        ])
        .prop_map(Value::from),
    ];
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec(
                (prop::sample::select(vec!["a", "b", "c", "d"]), inner),
                0..4
            )
            .prop_map(|entries| {
                Value::Object(
                    entries
                        .into_iter()
                        .map(|(key, value)| (key.to_string(), value))
                        .collect(),
                )
            }),
        ]
    })
}

fn union_mode() -> impl Strategy<Value = UnionFailureMode> {
    prop_oneof![
        Just(UnionFailureMode::Synthesized),
        Just(UnionFailureMode::All)
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn compiled_matches_interpreted(
        def in schema_def(),
        value in json_value(),
        absent in any::<bool>(),
        mode in union_mode(),
    ) {
        let schema = def
            .build()
            .map_err(|err| TestCaseError::fail(err.to_string()))?;
        let program = compile(&schema, mode, DEFAULT_MAX_PROGRAM_OPS)
            .map_err(|err| TestCaseError::fail(err.to_string()))?;
        let interpreter = Interpreter::new(&schema, mode);
        let input = if absent { None } else { Some(&value) };

        for options in [
            ValidateOptions::new(),
            ValidateOptions::new().early_fail(),
            ValidateOptions::new().with_path("ctx"),
        ] {
            prop_assert_eq!(program.run(input, &options), interpreter.run(input, &options));
        }
    }

    #[test]
    fn early_fail_reports_the_first_failure(
        def in schema_def(),
        value in json_value(),
        mode in union_mode(),
    ) {
        let schema = def
            .build()
            .map_err(|err| TestCaseError::fail(err.to_string()))?;
        let interpreter = Interpreter::new(&schema, mode);

        let full = interpreter.run(Some(&value), &ValidateOptions::new());
        let early = interpreter.run(Some(&value), &ValidateOptions::new().early_fail());
        prop_assert!(early.len() <= 1);
        prop_assert_eq!(early.first(), full.first());
    }
}
