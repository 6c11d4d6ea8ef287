use indexmap::IndexMap;
use tile_widgets::aggregation::{
    AggregationType, CategoryEntry, GroupByOptions, OTHERS_CATEGORY, OrderBy, TimeStep,
    ValueRange, aggregate, aggregate_feature, aggregate_values, group_by, histogram, scatter_plot,
    time_series, value_range,
};
use tile_widgets::{FeatureRecord, Scalar, UniqueId, WidgetError};

fn record(id: i64, entries: &[(&str, Scalar)]) -> FeatureRecord {
    let properties: IndexMap<String, Scalar> = entries
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect();
    FeatureRecord::new(UniqueId::Int(id), properties)
}

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn stores() -> Vec<FeatureRecord> {
    vec![
        record(
            1,
            &[
                ("kind", "cafe".into()),
                ("revenue", 10.0.into()),
                ("a", 1.0.into()),
                ("b", 3.0.into()),
            ],
        ),
        record(
            2,
            &[
                ("kind", "bar".into()),
                ("revenue", 75.0.into()),
                ("a", 2.0.into()),
                ("b", Scalar::Null),
            ],
        ),
        record(
            3,
            &[
                ("kind", "cafe".into()),
                ("revenue", 150.0.into()),
                ("a", 5.0.into()),
                ("b", 1.0.into()),
            ],
        ),
        record(4, &[("kind", "shop".into()), ("revenue", 250.0.into())]),
        record(5, &[("kind", Scalar::Null), ("revenue", Scalar::Null)]),
    ]
}

#[test]
fn aggregate_values_on_empty_input() {
    assert_eq!(aggregate_values(&[], AggregationType::Count), Some(0.0));
    assert_eq!(aggregate_values(&[], AggregationType::Sum), Some(0.0));
    assert_eq!(aggregate_values(&[], AggregationType::Avg), None);
    assert_eq!(aggregate_values(&[], AggregationType::Min), None);
    assert_eq!(aggregate_values(&[], AggregationType::Max), None);
}

#[test]
fn aggregate_values_basic_operations() {
    let values = [4.0, 1.0, 7.0];
    assert_eq!(aggregate_values(&values, AggregationType::Count), Some(3.0));
    assert_eq!(aggregate_values(&values, AggregationType::Sum), Some(12.0));
    assert_eq!(aggregate_values(&values, AggregationType::Avg), Some(4.0));
    assert_eq!(aggregate_values(&values, AggregationType::Min), Some(1.0));
    assert_eq!(aggregate_values(&values, AggregationType::Max), Some(7.0));
}

#[test]
fn aggregation_type_names() {
    assert_eq!(AggregationType::from_str("AVG"), Some(AggregationType::Avg));
    assert_eq!(AggregationType::from_str("median"), None);
    assert_eq!(AggregationType::Max.as_str(), "max");
}

#[test]
fn feature_join_over_columns() {
    let records = stores();
    let both = columns(&["a", "b"]);
    let joined =
        aggregate_feature(&records[0], &both, Some(AggregationType::Sum)).expect("join");
    assert_eq!(joined, Some(4.0));

    let skips_null =
        aggregate_feature(&records[1], &both, Some(AggregationType::Avg)).expect("join");
    assert_eq!(skips_null, Some(2.0));

    let nothing =
        aggregate_feature(&records[3], &both, Some(AggregationType::Sum)).expect("join");
    assert_eq!(nothing, None);
}

#[test]
fn feature_join_requires_operation() {
    let records = stores();
    let err = aggregate_feature(&records[0], &columns(&["a", "b"]), None).expect_err("no join");
    assert!(matches!(
        err.downcast_ref::<WidgetError>(),
        Some(WidgetError::MissingJoinOperation(2))
    ));
}

#[test]
fn formula_over_records() {
    let records = stores();
    let refs: Vec<&FeatureRecord> = records.iter().collect();
    assert_eq!(
        aggregate(&refs, &[], AggregationType::Count, None).expect("count"),
        Some(5.0)
    );
    assert_eq!(
        aggregate(&refs, &columns(&["revenue"]), AggregationType::Count, None).expect("count"),
        Some(4.0)
    );
    assert_eq!(
        aggregate(&refs, &columns(&["revenue"]), AggregationType::Sum, None).expect("sum"),
        Some(485.0)
    );
    assert_eq!(
        aggregate(&[], &columns(&["revenue"]), AggregationType::Avg, None).expect("avg"),
        None
    );
}

#[test]
fn histogram_places_values_in_half_open_buckets() {
    let records = stores();
    let refs: Vec<&FeatureRecord> = records.iter().collect();
    let buckets = histogram(
        &refs,
        &[50.0, 100.0, 200.0],
        &columns(&["revenue"]),
        AggregationType::Count,
        None,
    )
    .expect("histogram");
    assert_eq!(buckets, vec![1.0, 1.0, 1.0, 1.0]);

    let on_tick = vec![record(9, &[("revenue", 100.0.into())])];
    let refs: Vec<&FeatureRecord> = on_tick.iter().collect();
    let buckets = histogram(
        &refs,
        &[50.0, 100.0],
        &columns(&["revenue"]),
        AggregationType::Count,
        None,
    )
    .expect("histogram");
    assert_eq!(buckets, vec![0.0, 0.0, 1.0]);
}

#[test]
fn histogram_of_nothing_is_zeroes() {
    let buckets = histogram(
        &[],
        &[200.0, 50.0, 100.0],
        &columns(&["revenue"]),
        AggregationType::Sum,
        None,
    )
    .expect("histogram");
    assert_eq!(buckets, vec![0.0, 0.0, 0.0, 0.0]);
}

#[test]
fn group_by_counts_features() {
    let records = stores();
    let refs: Vec<&FeatureRecord> = records.iter().collect();
    let entries = group_by(
        &refs,
        "kind",
        &[],
        AggregationType::Count,
        None,
        &GroupByOptions::default(),
    )
    .expect("group");
    assert_eq!(
        entries[0],
        CategoryEntry {
            name: "cafe".into(),
            value: Some(2.0)
        }
    );
    assert_eq!(entries.len(), 4);
    assert!(entries.iter().any(|entry| entry.name == Scalar::Null));
}

#[test]
fn group_by_sums_and_orders_alphabetically() {
    let records = stores();
    let refs: Vec<&FeatureRecord> = records.iter().collect();
    let options = GroupByOptions {
        others_threshold: None,
        order_by: OrderBy::AlphabeticalAsc,
    };
    let entries = group_by(
        &refs,
        "kind",
        &columns(&["revenue"]),
        AggregationType::Sum,
        None,
        &options,
    )
    .expect("group");
    let names: Vec<Scalar> = entries.iter().map(|entry| entry.name.clone()).collect();
    assert_eq!(
        names,
        vec![
            Scalar::from("bar"),
            Scalar::from("cafe"),
            Scalar::from("shop"),
            Scalar::Null
        ]
    );
    assert_eq!(entries[1].value, Some(160.0));
    assert_eq!(entries[3].value, Some(0.0));
}

#[test]
fn group_by_folds_others() {
    let records = stores();
    let refs: Vec<&FeatureRecord> = records.iter().collect();
    let options = GroupByOptions {
        others_threshold: Some(1),
        order_by: OrderBy::FrequencyDesc,
    };
    let entries = group_by(
        &refs,
        "kind",
        &columns(&["revenue"]),
        AggregationType::Max,
        None,
        &options,
    )
    .expect("group");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, Scalar::from("shop"));
    assert_eq!(entries[0].value, Some(250.0));
    assert_eq!(entries[1].name, Scalar::from(OTHERS_CATEGORY));
    assert_eq!(entries[1].value, Some(150.0));
}

#[test]
fn group_by_of_nothing_is_empty() {
    let entries = group_by(
        &[],
        "kind",
        &[],
        AggregationType::Count,
        None,
        &GroupByOptions::default(),
    )
    .expect("group");
    assert!(entries.is_empty());
}

#[test]
fn scatter_skips_incomplete_pairs() {
    let records = stores();
    let refs: Vec<&FeatureRecord> = records.iter().collect();
    let points =
        scatter_plot(&refs, &columns(&["a"]), None, &columns(&["b"]), None).expect("scatter");
    assert_eq!(points, vec![[1.0, 3.0], [5.0, 1.0]]);
}

#[test]
fn range_of_values() {
    let records = stores();
    let refs: Vec<&FeatureRecord> = records.iter().collect();
    let range = value_range(&refs, &columns(&["revenue"]), None).expect("range");
    assert_eq!(range, Some(ValueRange { min: 10.0, max: 250.0 }));
    let empty = value_range(&[], &columns(&["revenue"]), None).expect("range");
    assert_eq!(empty, None);
}

fn events() -> Vec<FeatureRecord> {
    vec![
        record(
            1,
            &[("at", "2023-01-02T10:00:00Z".into()), ("amount", 5.0.into())],
        ),
        record(
            2,
            &[("at", "2023-01-08 23:59:59".into()), ("amount", 7.0.into())],
        ),
        record(3, &[("at", "2023-01-09".into()), ("amount", 1.0.into())]),
        record(4, &[("at", Scalar::Null), ("amount", 100.0.into())]),
    ]
}

#[test]
fn time_series_by_week() {
    let records = events();
    let refs: Vec<&FeatureRecord> = records.iter().collect();
    let entries = time_series(
        &refs,
        "at",
        TimeStep::Week,
        &columns(&["amount"]),
        AggregationType::Sum,
        None,
    )
    .expect("series");
    // 2023-01-02 and 2023-01-09 are Mondays.
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, 1_672_617_600_000);
    assert_eq!(entries[0].value, Some(12.0));
    assert_eq!(entries[1].name, 1_673_222_400_000);
    assert_eq!(entries[1].value, Some(1.0));
}

#[test]
fn time_series_by_month_counts() {
    let records = events();
    let refs: Vec<&FeatureRecord> = records.iter().collect();
    let entries = time_series(&refs, "at", TimeStep::Month, &[], AggregationType::Count, None)
        .expect("series");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, 1_672_531_200_000);
    assert_eq!(entries[0].value, Some(3.0));
}

#[test]
fn time_series_rejects_bad_dates() {
    let records = vec![record(1, &[("at", "yesterday".into())])];
    let refs: Vec<&FeatureRecord> = records.iter().collect();
    let err = time_series(&refs, "at", TimeStep::Day, &[], AggregationType::Count, None)
        .expect_err("invalid date");
    assert!(matches!(
        err.downcast_ref::<WidgetError>(),
        Some(WidgetError::InvalidDate(_))
    ));
}
