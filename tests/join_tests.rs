use approx::assert_relative_eq;
use chrono::{DateTime, TimeZone, Utc};
use indexmap::IndexMap;
use serde_json::json;
use variant_stack::StackError;
use variant_stack::core::{
    JoinPolicy, MissingFieldPolicy, ProportionSample, TotalFieldSet, TotalSample, VariantId,
    extract_schema, join, join_with_policy, normalize_proportions, normalize_totals,
};

fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

fn proportion(date: DateTime<Utc>, values: &[(&str, f64)]) -> ProportionSample {
    ProportionSample {
        date,
        values: values
            .iter()
            .map(|(id, value)| (VariantId::new(*id), *value))
            .collect::<IndexMap<_, _>>(),
    }
}

#[test]
fn scales_percentages_by_the_matching_total() {
    let proportions_raw = vec![
        json!({"week_end": "2024-01-01", "A": 60, "B": 40})
            .as_object()
            .cloned()
            .expect("row"),
    ];
    let totals_raw = vec![
        json!({"date": "2024-01-01", "total": 1000})
            .as_object()
            .cloned()
            .expect("row"),
    ];

    let schema = extract_schema(&proportions_raw, "week_end").expect("schema");
    let proportions =
        normalize_proportions(&proportions_raw, &schema, "week_end", MissingFieldPolicy::Reject)
            .expect("proportions");
    let totals = normalize_totals(
        &totals_raw,
        "date",
        &TotalFieldSet::Custom(vec!["total".to_owned()]),
    )
    .expect("totals");

    let scaled = join(&proportions, &totals).expect("join");
    assert_eq!(scaled.len(), 1);
    assert_eq!(scaled[0].date, day(2024, 1, 1));
    assert_relative_eq!(scaled[0].value("A").expect("A"), 600.0);
    assert_relative_eq!(scaled[0].value("B").expect("B"), 400.0);
}

#[test]
fn output_follows_proportion_order_not_total_order() {
    let proportions = vec![
        proportion(day(2024, 1, 13), &[("A", 50.0)]),
        proportion(day(2024, 1, 6), &[("A", 10.0)]),
    ];
    let totals = vec![
        TotalSample::new(day(2024, 1, 6), 200.0),
        TotalSample::new(day(2024, 1, 13), 400.0),
    ];

    let scaled = join(&proportions, &totals).expect("join");
    assert_eq!(scaled[0].date, day(2024, 1, 13));
    assert_relative_eq!(scaled[0].value("A").expect("A"), 200.0);
    assert_eq!(scaled[1].date, day(2024, 1, 6));
    assert_relative_eq!(scaled[1].value("A").expect("A"), 20.0);
}

#[test]
fn first_total_wins_for_duplicate_dates() {
    let proportions = vec![proportion(day(2024, 1, 6), &[("A", 50.0)])];
    let totals = vec![
        TotalSample::new(day(2024, 1, 6), 100.0),
        TotalSample::new(day(2024, 1, 6), 900.0),
    ];
    let scaled = join(&proportions, &totals).expect("join");
    assert_relative_eq!(scaled[0].value("A").expect("A"), 50.0);
}

#[test]
fn dates_must_match_to_the_millisecond() {
    let date = day(2024, 1, 6);
    let proportions = vec![proportion(date, &[("A", 50.0)])];
    let totals = vec![TotalSample::new(
        date + chrono::Duration::milliseconds(1),
        100.0,
    )];
    let err = join(&proportions, &totals).expect_err("no exact match");
    match err {
        StackError::MissingJoinPartner { dates } => assert_eq!(dates, vec!["2024-01-06".to_owned()]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn reject_policy_lists_every_unmatched_date() {
    let proportions = vec![
        proportion(day(2024, 1, 6), &[("A", 50.0)]),
        proportion(day(2024, 1, 13), &[("A", 50.0)]),
        proportion(day(2024, 1, 20), &[("A", 50.0)]),
    ];
    let totals = vec![TotalSample::new(day(2024, 1, 13), 100.0)];
    let err = join_with_policy(&proportions, &totals, JoinPolicy::Reject).expect_err("reject");
    match err {
        StackError::MissingJoinPartner { dates } => {
            assert_eq!(dates, vec!["2024-01-06".to_owned(), "2024-01-20".to_owned()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn skip_policy_drops_and_reports_unmatched_dates() {
    let proportions = vec![
        proportion(day(2024, 1, 6), &[("A", 50.0)]),
        proportion(day(2024, 1, 13), &[("A", 25.0)]),
    ];
    let totals = vec![TotalSample::new(day(2024, 1, 13), 100.0)];
    let report = join_with_policy(&proportions, &totals, JoinPolicy::Skip).expect("skip");
    assert_eq!(report.samples.len(), 1);
    assert_eq!(report.samples[0].date, day(2024, 1, 13));
    assert_eq!(report.unmatched, vec![day(2024, 1, 6)]);
}

#[test]
fn zero_fill_policy_keeps_length_and_never_yields_nan() {
    let proportions = vec![
        proportion(day(2024, 1, 6), &[("A", 50.0), ("B", 50.0)]),
        proportion(day(2024, 1, 13), &[("A", 25.0), ("B", 75.0)]),
    ];
    let totals = vec![TotalSample::new(day(2024, 1, 13), 100.0)];
    let report = join_with_policy(&proportions, &totals, JoinPolicy::ZeroFill).expect("zero fill");
    assert_eq!(report.samples.len(), 2);
    assert_eq!(report.unmatched, vec![day(2024, 1, 6)]);
    assert!(report.samples[0].values.values().all(|value| *value == 0.0));
    assert_relative_eq!(report.samples[1].value("B").expect("B"), 75.0);
}

#[test]
fn empty_proportions_join_to_empty_output() {
    let totals = vec![TotalSample::new(day(2024, 1, 13), 100.0)];
    assert!(join(&[], &totals).expect("join").is_empty());
}
