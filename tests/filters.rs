use indexmap::IndexMap;
use serde_json::json;
use tile_widgets::filters::{
    CompiledFilters, FilterKind, FilterSpec, Filters, LogicalOperator, StringSearchParams,
    add_filter, apply_filters, build_binary_filter, build_feature_filter, normalize_text,
};
use tile_widgets::tiles::{BinaryAttributes, BinaryPositions};
use tile_widgets::{FeatureRecord, Scalar, UniqueId, WidgetError};

fn record(id: i64, entries: &[(&str, Scalar)]) -> FeatureRecord {
    let properties: IndexMap<String, Scalar> = entries
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect();
    FeatureRecord::new(UniqueId::Int(id), properties)
}

fn city(id: i64, name: &str, pop: Scalar, country: &str) -> FeatureRecord {
    record(
        id,
        &[("name", name.into()), ("pop", pop), ("country", country.into())],
    )
}

fn cities() -> Vec<FeatureRecord> {
    vec![
        city(1, "Málaga", 570.0.into(), "ES"),
        city(2, "Madrid", 3300.0.into(), "ES"),
        city(3, "Lyon", 520.0.into(), "FR"),
        city(4, "Porto", Scalar::Null, "PT"),
    ]
}

fn kept(filters: &Filters, operator: LogicalOperator) -> Vec<i64> {
    let records = cities();
    let compiled = CompiledFilters::compile(filters, operator, None).expect("compile");
    apply_filters(records.iter(), &compiled)
        .expect("apply")
        .into_iter()
        .filter_map(|record| match record.id {
            UniqueId::Int(id) => Some(id),
            _ => None,
        })
        .collect()
}

#[test]
fn no_filters_keep_everything() {
    assert_eq!(kept(&Filters::new(), LogicalOperator::And), vec![1, 2, 3, 4]);
    assert_eq!(kept(&Filters::new(), LogicalOperator::Or), vec![1, 2, 3, 4]);
}

#[test]
fn in_filters_combine_with_operator() {
    let mut filters = Filters::new();
    add_filter(&mut filters, "country", FilterKind::In, FilterSpec::new(vec![json!("FR")]));
    add_filter(&mut filters, "name", FilterKind::In, FilterSpec::new(vec![json!("Porto")]));

    assert_eq!(kept(&filters, LogicalOperator::And), Vec::<i64>::new());
    assert_eq!(kept(&filters, LogicalOperator::Or), vec![3, 4]);
}

#[test]
fn in_filter_matches_null_only_when_listed() {
    let mut filters = Filters::new();
    add_filter(&mut filters, "pop", FilterKind::In, FilterSpec::new(vec![json!(null)]));
    assert_eq!(kept(&filters, LogicalOperator::And), vec![4]);
}

#[test]
fn between_is_inclusive() {
    let mut filters = Filters::new();
    add_filter(
        &mut filters,
        "pop",
        FilterKind::Between,
        FilterSpec::new(vec![json!([520, 570])]),
    );
    assert_eq!(kept(&filters, LogicalOperator::And), vec![1, 3]);
}

#[test]
fn closed_open_excludes_upper_bound() {
    let mut filters = Filters::new();
    add_filter(
        &mut filters,
        "pop",
        FilterKind::ClosedOpen,
        FilterSpec::new(vec![json!([520, 570]), json!([3000, null])]),
    );
    assert_eq!(kept(&filters, LogicalOperator::And), vec![2, 3]);
}

#[test]
fn kinds_on_one_column_all_apply() {
    let mut filters = Filters::new();
    add_filter(
        &mut filters,
        "pop",
        FilterKind::Between,
        FilterSpec::new(vec![json!(0), json!(1000)]),
    );
    add_filter(
        &mut filters,
        "pop",
        FilterKind::In,
        FilterSpec::new(vec![json!(570), json!(3300)]),
    );
    assert_eq!(kept(&filters, LogicalOperator::Or), vec![1]);
}

#[test]
fn time_filter_reads_dates() {
    let records = vec![
        record(1, &[("at", "2023-03-01".into())]),
        record(2, &[("at", "2023-06-15T12:00:00Z".into())]),
        record(3, &[("at", 1_700_000_000_000.0.into())]),
    ];
    let mut filters = Filters::new();
    add_filter(
        &mut filters,
        "at",
        FilterKind::Time,
        FilterSpec::new(vec![json!(["2023-01-01", "2023-12-31"])]),
    );
    let predicate = build_feature_filter(&filters, LogicalOperator::And).expect("filter");
    let outcomes: Vec<bool> = records
        .iter()
        .map(|record| predicate(record).expect("evaluate"))
        .collect();
    assert_eq!(outcomes, vec![true, true, true]);
}

#[test]
fn time_filter_rejects_unparsable_values() {
    let records = vec![record(1, &[("at", "someday".into())])];
    let mut filters = Filters::new();
    add_filter(
        &mut filters,
        "at",
        FilterKind::Time,
        FilterSpec::new(vec![json!([0, null])]),
    );
    let predicate = build_feature_filter(&filters, LogicalOperator::And).expect("filter");
    let err = predicate(&records[0]).expect_err("invalid date");
    assert!(matches!(
        err.downcast_ref::<WidgetError>(),
        Some(WidgetError::InvalidDate(_))
    ));
}

#[test]
fn string_search_ignores_case_and_accents() {
    let mut filters = Filters::new();
    add_filter(
        &mut filters,
        "name",
        FilterKind::StringSearch,
        FilterSpec::new(vec![json!("MALA")]),
    );
    assert_eq!(kept(&filters, LogicalOperator::And), vec![1]);
    assert_eq!(normalize_text("Málaga", false), "malaga");
}

#[test]
fn string_search_anchors() {
    let mut filters = Filters::new();
    let params = StringSearchParams {
        must_start: true,
        ..Default::default()
    };
    add_filter(
        &mut filters,
        "name",
        FilterKind::StringSearch,
        FilterSpec::new(vec![json!("ma")]).with_params(params),
    );
    assert_eq!(kept(&filters, LogicalOperator::And), vec![1, 2]);

    let mut filters = Filters::new();
    let params = StringSearchParams {
        case_sensitive: true,
        must_end: true,
        ..Default::default()
    };
    add_filter(
        &mut filters,
        "name",
        FilterKind::StringSearch,
        FilterSpec::new(vec![json!("on")]).with_params(params),
    );
    assert_eq!(kept(&filters, LogicalOperator::And), vec![3]);
}

#[test]
fn unknown_filter_kind_is_an_error() {
    let mut filters = Filters::new();
    let mut kinds = IndexMap::new();
    kinds.insert("near".to_string(), FilterSpec::new(vec![json!(1)]).with_owner("map"));
    filters.insert("pop".to_string(), kinds);

    let err = CompiledFilters::compile(&filters, LogicalOperator::And, Some("map"))
        .expect_err("unsupported");
    assert!(matches!(
        err.downcast_ref::<WidgetError>(),
        Some(WidgetError::UnsupportedFilter(kind)) if kind == "near"
    ));
}

#[test]
fn owner_filters_are_skipped() {
    let mut filters = Filters::new();
    add_filter(
        &mut filters,
        "country",
        FilterKind::In,
        FilterSpec::new(vec![json!("ES")]).with_owner("country-widget"),
    );
    let records = cities();

    let own = CompiledFilters::compile(&filters, LogicalOperator::And, Some("country-widget"))
        .expect("compile");
    assert!(own.is_empty());
    assert_eq!(apply_filters(records.iter(), &own).expect("apply").len(), 4);

    let other = CompiledFilters::compile(&filters, LogicalOperator::And, Some("histogram"))
        .expect("compile");
    assert_eq!(apply_filters(records.iter(), &other).expect("apply").len(), 2);
}

fn binary_points() -> BinaryAttributes {
    let mut numeric_props = IndexMap::new();
    numeric_props.insert("pop".to_string(), vec![570.0, 3300.0, 520.0]);
    BinaryAttributes {
        positions: BinaryPositions {
            values: vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0],
            size: 2,
        },
        feature_ids: vec![0, 1, 2],
        numeric_props,
        properties: vec![
            [("country".to_string(), Scalar::from("ES"))].into_iter().collect(),
            [("country".to_string(), Scalar::from("ES"))].into_iter().collect(),
            [("country".to_string(), Scalar::from("FR"))].into_iter().collect(),
        ],
        ..Default::default()
    }
}

#[test]
fn binary_filter_reads_both_buffers() {
    let attributes = binary_points();
    let mut filters = Filters::new();
    add_filter(&mut filters, "country", FilterKind::In, FilterSpec::new(vec![json!("ES")]));
    add_filter(
        &mut filters,
        "pop",
        FilterKind::Between,
        FilterSpec::new(vec![json!(0), json!(1000)]),
    );
    let filter = build_binary_filter(&filters, LogicalOperator::And).expect("filter");
    let outcomes: Vec<bool> = (0..3)
        .map(|vertex| filter.matches(&attributes, vertex).expect("match"))
        .collect();
    assert_eq!(outcomes, vec![true, false, false]);

    let filter = build_binary_filter(&filters, LogicalOperator::Or).expect("filter");
    let outcomes: Vec<bool> = (0..3)
        .map(|vertex| filter.matches(&attributes, vertex).expect("match"))
        .collect();
    assert_eq!(outcomes, vec![true, true, true]);
}
