//! Property tests for generated catalog queries.

use componet::config::CatalogConfig;
use componet::error::ComponetError;
use componet::metadata::{ColumnType, MetadataRegistry};
use componet::query::QueryBuilder;
use proptest::prelude::*;
use std::sync::Arc;

fn builder() -> (QueryBuilder, Vec<String>, Vec<String>) {
    let registry = Arc::new(MetadataRegistry::builtin().unwrap());
    let categories = registry
        .list_by_type(ColumnType::Category)
        .into_iter()
        .map(|c| c.column.clone())
        .collect();
    let attributes = registry
        .list_by_type(ColumnType::Attribute)
        .into_iter()
        .map(|a| a.name.clone())
        .collect();
    (
        QueryBuilder::new(registry, CatalogConfig::default()),
        categories,
        attributes,
    )
}

fn selected_columns(sql: &str) -> Vec<&str> {
    let list = sql
        .strip_prefix("SELECT ")
        .and_then(|rest| rest.split(" FROM ").next())
        .unwrap_or_default();
    list.split(", ").collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_column_and_filter_counts(
        category_index in any::<prop::sample::Index>(),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 0..6),
        year in prop::option::of("20[0-9]{2}"),
    ) {
        let (builder, categories, attributes) = builder();
        let category = category_index.get(&categories);
        let chosen: Vec<&str> = picks.iter().map(|i| i.get(&attributes).as_str()).collect();

        let sql = match &year {
            Some(year) => builder.build_for_year(category, year, &chosen).unwrap(),
            None => builder.build(category, &chosen).unwrap(),
        };

        let columns = selected_columns(&sql);
        prop_assert_eq!(columns.len(), chosen.len() + 2);
        prop_assert_eq!(columns[0], r#""part_mpn""#);
        prop_assert_eq!(columns[1], r#""part_manufacturer_name""#);
        prop_assert_eq!(sql.matches(" IS NOT NULL AND ").count(), chosen.len());
        prop_assert_eq!(sql.matches(" != 'nan'").count(), chosen.len());
        prop_assert_eq!(sql.contains(r#" AND "year" = "#), year.is_some());
    }

    #[test]
    fn prop_year_literal_is_escaped(year in "[ -~]{1,12}") {
        let (builder, _, _) = builder();
        let sql = builder.build_for_year("6331", &year, &["Capacitance"]).unwrap();
        let literal = format!("'{}'", year.replace('\'', "''"));
        let expected_suffix = format!(r#""year" = {literal}"#);
        prop_assert!(sql.ends_with(&expected_suffix));
    }
}

#[test]
fn test_unknown_names_are_rejected() {
    let (builder, _, _) = builder();
    assert!(matches!(
        builder.build("not-a-category", &["Capacitance"]),
        Err(ComponetError::Resolution { .. })
    ));
    assert!(matches!(
        builder.build("6331", &["Flux Capacitance"]),
        Err(ComponetError::Resolution { .. })
    ));
}

#[test]
fn test_identity_only_query() {
    let (builder, _, _) = builder();
    let sql = builder.build::<&str>("Ceramic Capacitors", &[]).unwrap();
    assert_eq!(
        sql,
        r#"SELECT "part_mpn", "part_manufacturer_name" FROM "public"."final" WHERE "part_category_id" = '6332'"#
    );
}
