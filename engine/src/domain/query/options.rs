//! Query options builder
//!
//! Assembles `$select`, `$filter`, `$orderby` and `$top` into one query
//! string, in that order, omitting absent parts.

use crate::data::types::AttributeMap;
use crate::utils::odata::is_property_path;

use super::filter::{TypeResolver, compile_with, resolver_for};
use super::types::{FilterGroup, OrderBy};

/// Everything that goes into one query string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub columns: Vec<String>,
    pub top: Option<u32>,
    pub order_by: Option<OrderBy>,
    pub groups: Vec<FilterGroup>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn top(mut self, top: u32) -> Self {
        self.top = Some(top);
        self
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }

    pub fn filter(mut self, groups: Vec<FilterGroup>) -> Self {
        self.groups = groups;
        self
    }

    /// Render the query string
    ///
    /// With an attribute map the metadata-aware strategy is used; without
    /// one, only conditions typable without metadata reach `$filter`.
    pub fn build(&self, attribute_types: Option<&AttributeMap>) -> String {
        let resolver = resolver_for(attribute_types);
        self.build_with(resolver.as_ref())
    }

    pub fn build_with(&self, resolver: &dyn TypeResolver) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(4);

        let columns: Vec<String> = clean_columns(&self.columns)
            .map(|column| resolver.column(column))
            .collect();
        if !columns.is_empty() {
            parts.push(format!("$select={}", columns.join(",")));
        }

        let filter = compile_with(&self.groups, resolver);
        if !filter.is_empty() {
            parts.push(format!("$filter={}", filter));
        }

        if let Some(order_by) = &self.order_by {
            let attribute = order_by.attribute.trim();
            if is_property_path(attribute) {
                parts.push(format!(
                    "$orderby={} {}",
                    resolver.column(attribute),
                    order_by.direction.keyword()
                ));
            } else if !attribute.is_empty() {
                tracing::debug!(attribute, "Skipping $orderby on a non-property name");
            }
        }

        if let Some(top) = self.top.filter(|top| *top > 0) {
            parts.push(format!("$top={}", top));
        }

        parts.join("&")
    }
}

/// Build a query string from its parts
pub fn build(
    columns: &[String],
    top: Option<u32>,
    order_by: Option<&OrderBy>,
    groups: &[FilterGroup],
    attribute_types: Option<&AttributeMap>,
) -> String {
    QueryOptions {
        columns: columns.to_vec(),
        top,
        order_by: order_by.cloned(),
        groups: groups.to_vec(),
    }
    .build(attribute_types)
}

/// Split user-typed column text on newlines and commas
pub fn parse_columns(text: &str) -> Vec<String> {
    text.split(['\n', ','])
        .map(str::trim)
        .filter(|column| !column.is_empty())
        .map(str::to_string)
        .collect()
}

fn clean_columns(columns: &[String]) -> impl Iterator<Item = &str> {
    columns
        .iter()
        .map(|column| column.trim())
        .filter(|column| !column.is_empty())
        .filter(|column| {
            let valid = is_property_path(column);
            if !valid {
                tracing::debug!(column, "Skipping non-property column");
            }
            valid
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::ValueType;
    use crate::domain::query::types::FilterCondition;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_emission_order() {
        let query = QueryOptions::new()
            .select(["name", "city"])
            .top(50)
            .order_by(OrderBy::desc("createdon"))
            .filter(vec![FilterGroup::and(vec![
                FilterCondition::new("city", "eq", "Oslo").typed(ValueType::String),
            ])])
            .build(Some(&AttributeMap::new()));

        assert_eq!(
            query,
            "$select=name,city&$filter=city eq 'Oslo'&$orderby=createdon desc&$top=50"
        );
    }

    #[test]
    fn test_everything_absent_is_empty() {
        assert_eq!(QueryOptions::new().build(None), "");
    }

    #[test]
    fn test_columns_trimmed_blank_dropped_order_kept() {
        let query = build(&cols(&[" name ", "", "  ", "city", "name"]), None, None, &[], None);
        assert_eq!(query, "$select=name,city,name");
    }

    #[test]
    fn test_non_property_names_never_reach_the_query() {
        let query = build(
            &cols(&["name", "city,revenue", "x&$top=1", "parentaccountid/name"]),
            None,
            Some(&OrderBy::desc("name desc,revenue")),
            &[],
            None,
        );
        assert_eq!(query, "$select=name,parentaccountid/name");

        let order = OrderBy::asc("createdon");
        assert_eq!(
            build(&cols(&["bad name"]), None, Some(&order), &[], None),
            "$orderby=createdon asc"
        );
    }

    #[test]
    fn test_top_zero_omitted() {
        let query = build(&cols(&["name"]), Some(0), None, &[], None);
        assert_eq!(query, "$select=name");
    }

    #[test]
    fn test_blank_order_by_omitted() {
        let order = OrderBy::asc("  ");
        assert_eq!(build(&[], Some(5), Some(&order), &[], None), "$top=5");
    }

    #[test]
    fn test_empty_filter_omitted() {
        let groups = vec![FilterGroup::and(vec![FilterCondition::default()])];
        assert_eq!(build(&cols(&["name"]), None, None, &groups, None), "$select=name");
    }

    #[test]
    fn test_metadata_aware_rewrites_lookups_everywhere() {
        let types = AttributeMap::from([
            ("parentaccountid".to_string(), ValueType::Lookup),
            ("name".to_string(), ValueType::String),
        ]);
        let id = "6f9619ff-8b86-d011-b42d-00c04fc964ff";
        let query = QueryOptions::new()
            .select(["name", "parentaccountid"])
            .order_by(OrderBy::asc("parentaccountid"))
            .filter(vec![FilterGroup::and(vec![FilterCondition::new(
                "parentaccountid",
                "eq",
                id,
            )])])
            .build(Some(&types));

        assert_eq!(
            query,
            format!(
                "$select=name,_parentaccountid_value&$filter=_parentaccountid_value eq {id}\
                 &$orderby=_parentaccountid_value asc"
            )
        );
    }

    #[test]
    fn test_metadata_free_keeps_verbatim_and_reduces_filter() {
        let query = QueryOptions::new()
            .select(["parentaccountid"])
            .top(10)
            .order_by(OrderBy::asc("parentaccountid"))
            .filter(vec![FilterGroup::and(vec![
                FilterCondition::new("name", "eq", "Contoso"),
                FilterCondition::new("name", "contains", "Con"),
            ])])
            .build(None);

        assert_eq!(
            query,
            "$select=parentaccountid&$filter=contains(name,'Con')\
             &$orderby=parentaccountid asc&$top=10"
        );
    }

    #[test]
    fn test_parse_columns() {
        assert_eq!(
            parse_columns("name, city\n\n  accountid ,,\r\nrevenue"),
            cols(&["name", "city", "accountid", "revenue"])
        );
        assert!(parse_columns(" \n , ").is_empty());
    }
}
