use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::{Map, Value};
use variant_stack::core::{
    ColorPool, JoinPolicy, MissingFieldPolicy, OrderingStrategy, PinPolicy, PinPosition,
    ProportionSample, ScaledSample, SortDirection, TotalSample, VariantId, VariantOrder,
    VariantSchema, assign, extract_schema, join, join_with_policy, normalize_proportions,
    order_variants, regenerate, shuffle,
};

fn week(index: usize) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 1, 7, 0, 0, 0).unwrap() + Duration::weeks(index as i64)
}

fn variant_names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("V{i:02}")).collect()
}

fn percentage_strategy() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![Just(None), (0.0f64..100.0).prop_map(Some)]
}

fn proportions_strategy() -> impl Strategy<Value = (usize, Vec<Vec<Option<f64>>>)> {
    (1usize..8).prop_flat_map(|variants| {
        (
            Just(variants),
            prop::collection::vec(prop::collection::vec(percentage_strategy(), variants), 1..20),
        )
    })
}

fn build_proportions(variants: usize, rows: &[Vec<Option<f64>>]) -> Vec<ProportionSample> {
    let names = variant_names(variants);
    rows.iter()
        .enumerate()
        .map(|(i, row)| ProportionSample {
            date: week(i),
            values: names
                .iter()
                .zip(row)
                .map(|(name, value)| (VariantId::new(name.clone()), value.unwrap_or(0.0)))
                .collect(),
        })
        .collect()
}

fn scaled_strategy() -> impl Strategy<Value = (VariantSchema, Vec<ScaledSample>)> {
    (1usize..10).prop_flat_map(|variants| {
        prop::collection::vec(prop::collection::vec(0.0f64..1e6, variants), 0..16).prop_map(
            move |rows| {
                let names = variant_names(variants);
                let mut schema_names = names.clone();
                schema_names.push("Other".to_owned());
                let samples = rows
                    .iter()
                    .enumerate()
                    .map(|(i, row)| ScaledSample {
                        date: week(i),
                        values: names
                            .iter()
                            .zip(row)
                            .map(|(name, value)| (VariantId::new(name.clone()), *value))
                            .chain(std::iter::once((VariantId::new("Other"), 1e9)))
                            .collect(),
                    })
                    .collect();
                (VariantSchema::new(schema_names), samples)
            },
        )
    })
}

fn ordering_strategy() -> impl Strategy<Value = OrderingStrategy> {
    prop_oneof![
        Just(OrderingStrategy::AllTimeMax),
        Just(OrderingStrategy::CurrentMax),
        Just(OrderingStrategy::Range {
            direction: SortDirection::Ascending
        }),
        Just(OrderingStrategy::Range {
            direction: SortDirection::Descending
        }),
    ]
}

proptest! {
    #[test]
    fn null_cells_normalize_to_zero((variants, cells) in proportions_strategy()) {
        let names = variant_names(variants);
        let rows: Vec<Map<String, Value>> = cells
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let mut raw = Map::new();
                raw.insert("week_end".to_owned(), Value::String(week(i).format("%Y-%m-%d").to_string()));
                for (name, cell) in names.iter().zip(row) {
                    let value = cell.map_or(Value::Null, |v| serde_json::json!(v));
                    raw.insert(name.clone(), value);
                }
                raw
            })
            .collect();

        let schema = extract_schema(&rows, "week_end").expect("schema");
        let samples = normalize_proportions(&rows, &schema, "week_end", MissingFieldPolicy::Reject)
            .expect("normalize");
        prop_assert_eq!(samples.len(), cells.len());
        for (sample, row) in samples.iter().zip(&cells) {
            for (name, cell) in names.iter().zip(row) {
                let value = sample.value(name).expect("value present");
                prop_assert!(value.is_finite());
                if cell.is_none() {
                    prop_assert_eq!(value, 0.0);
                }
            }
        }
    }

    #[test]
    fn join_preserves_length_order_and_scaling(
        (variants, cells) in proportions_strategy(),
        totals in prop::collection::vec(0.0f64..1e7, 20),
    ) {
        let proportions = build_proportions(variants, &cells);
        let total_samples: Vec<TotalSample> = totals
            .iter()
            .enumerate()
            .rev()
            .map(|(i, total)| TotalSample::new(week(i), *total))
            .collect();

        let scaled = join(&proportions, &total_samples).expect("join");
        prop_assert_eq!(scaled.len(), proportions.len());
        for (i, (out, input)) in scaled.iter().zip(&proportions).enumerate() {
            prop_assert_eq!(out.date, input.date);
            for (id, percentage) in &input.values {
                let expected = percentage * totals[i] / 100.0;
                let actual = out.value(id.as_str()).expect("scaled value");
                prop_assert!((actual - expected).abs() <= 1e-9 * expected.abs().max(1.0));
            }
        }
    }

    #[test]
    fn join_policies_never_produce_nan(
        (variants, cells) in proportions_strategy(),
        present in prop::collection::vec(any::<bool>(), 20),
    ) {
        let proportions = build_proportions(variants, &cells);
        let totals: Vec<TotalSample> = present
            .iter()
            .enumerate()
            .filter(|(_, keep)| **keep)
            .map(|(i, _)| TotalSample::new(week(i), 1000.0))
            .collect();

        let zero = join_with_policy(&proportions, &totals, JoinPolicy::ZeroFill).expect("zero fill");
        prop_assert_eq!(zero.samples.len(), proportions.len());
        let skip = join_with_policy(&proportions, &totals, JoinPolicy::Skip).expect("skip");
        prop_assert_eq!(skip.samples.len() + skip.unmatched.len(), proportions.len());
        for sample in zero.samples.iter().chain(&skip.samples) {
            prop_assert!(sample.values.values().all(|value| value.is_finite()));
        }
        let rejected = join_with_policy(&proportions, &totals, JoinPolicy::Reject).is_err();
        prop_assert_eq!(rejected, !skip.unmatched.is_empty());
    }

    #[test]
    fn strategies_return_permutations_with_pins_at_the_end(
        (schema, samples) in scaled_strategy(),
        strategy in ordering_strategy(),
        pin_start in any::<bool>(),
    ) {
        let position = if pin_start { PinPosition::Start } else { PinPosition::End };
        let pins = PinPolicy::catch_all("Other").with_position(position);
        let order = order_variants(&samples, &schema, strategy, &pins);

        prop_assert!(order.is_permutation_of(&schema));
        let expected = if pin_start { 0 } else { schema.len() - 1 };
        prop_assert_eq!(order.position("Other"), Some(expected));
    }

    #[test]
    fn shuffle_returns_permutations(variants in 1usize..30, seed in any::<u64>()) {
        let schema = VariantSchema::new(variant_names(variants));
        let current = VariantOrder::from_schema(&schema);
        let shuffled = shuffle(&current, &PinPolicy::none(), &mut StdRng::seed_from_u64(seed));
        prop_assert!(shuffled.is_permutation_of(&schema));
    }

    #[test]
    fn assignment_is_a_bijection_onto_the_pool_prefix(
        variants in 0usize..40,
        extra in 0usize..10,
        seed in any::<u64>(),
    ) {
        let schema = VariantSchema::new(variant_names(variants));
        let pool = regenerate(variants + extra, &mut StdRng::seed_from_u64(seed));
        prop_assert_eq!(pool.len(), variants + extra);

        let colors = assign(&pool, schema.iter()).expect("assign");
        prop_assert_eq!(colors.len(), variants);
        for (index, id) in schema.sorted().iter().enumerate() {
            prop_assert_eq!(colors.get(id.as_str()), Some(&pool.as_slice()[index]));
        }
        prop_assert_eq!(assign(&pool, schema.iter()).expect("assign again"), colors);

        let short = ColorPool::new(pool.as_slice()[..variants.saturating_sub(1)].to_vec());
        prop_assert_eq!(assign(&short, schema.iter()).is_err(), variants > 0);
    }
}
