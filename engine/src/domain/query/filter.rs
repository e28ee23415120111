//! Filter compiler
//!
//! Turns the UI's filter groups into one `$filter` expression. How each
//! condition is typed (and which property it addresses) is delegated to a
//! `TypeResolver`, so the same compiler serves both the metadata-aware and
//! the metadata-free query paths.

use crate::data::types::{AttributeMap, ValueType};
use crate::utils::odata::{
    boolean_literal, datetime_literal, guid_literal, is_property_path, lookup_value_property,
    number_literal, quote_string,
};

use super::types::{FilterCondition, FilterGroup, FilterType, Operator};

/// Where a condition points and how its value is rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAttribute {
    pub path: String,
    pub value_type: ValueType,
}

/// Decides each condition's effective property path and value type
pub trait TypeResolver: Send + Sync {
    /// `None` drops the condition from the compiled output
    fn resolve(
        &self,
        attribute: &str,
        explicit: Option<ValueType>,
        operator: Operator,
    ) -> Option<ResolvedAttribute>;

    /// Property name for `$select` / `$orderby`
    fn column(&self, attribute: &str) -> String;
}

fn path_for(attribute: &str, value_type: ValueType) -> String {
    if value_type == ValueType::Lookup {
        lookup_value_property(attribute)
    } else {
        attribute.to_string()
    }
}

/// Uses the condition's own type, defaulting to string
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitTypes;

impl TypeResolver for ExplicitTypes {
    fn resolve(
        &self,
        attribute: &str,
        explicit: Option<ValueType>,
        _operator: Operator,
    ) -> Option<ResolvedAttribute> {
        let value_type = explicit.unwrap_or_default();
        Some(ResolvedAttribute {
            path: path_for(attribute, value_type),
            value_type,
        })
    }

    fn column(&self, attribute: &str) -> String {
        attribute.to_string()
    }
}

/// Types from the entity's attribute map; explicit types still win
#[derive(Debug, Clone, Copy)]
pub struct MetadataAware<'a> {
    types: &'a AttributeMap,
}

impl<'a> MetadataAware<'a> {
    pub fn new(types: &'a AttributeMap) -> Self {
        Self { types }
    }

    fn known(&self, attribute: &str) -> Option<ValueType> {
        self.types
            .get(attribute)
            .or_else(|| self.types.get(&attribute.to_ascii_lowercase()))
            .copied()
    }
}

impl TypeResolver for MetadataAware<'_> {
    fn resolve(
        &self,
        attribute: &str,
        explicit: Option<ValueType>,
        _operator: Operator,
    ) -> Option<ResolvedAttribute> {
        let known = self.known(attribute);
        let value_type = explicit.or(known).unwrap_or_default();
        let is_lookup = value_type == ValueType::Lookup || known == Some(ValueType::Lookup);
        let path = if is_lookup {
            lookup_value_property(attribute)
        } else {
            attribute.to_string()
        };
        Some(ResolvedAttribute { path, value_type })
    }

    fn column(&self, attribute: &str) -> String {
        match self.known(attribute) {
            Some(ValueType::Lookup) => lookup_value_property(attribute),
            _ => attribute.to_string(),
        }
    }
}

/// Keeps only conditions that can be typed without metadata
///
/// Explicitly typed conditions, null checks and string functions survive;
/// untyped comparisons are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataFree;

impl TypeResolver for MetadataFree {
    fn resolve(
        &self,
        attribute: &str,
        explicit: Option<ValueType>,
        operator: Operator,
    ) -> Option<ResolvedAttribute> {
        let value_type = match explicit {
            Some(value_type) => value_type,
            None if operator.is_null_check() || operator.is_string_function() => {
                ValueType::String
            }
            None => {
                tracing::debug!(attribute, ?operator, "Dropping untyped comparison without metadata");
                return None;
            }
        };
        Some(ResolvedAttribute {
            path: path_for(attribute, value_type),
            value_type,
        })
    }

    fn column(&self, attribute: &str) -> String {
        attribute.to_string()
    }
}

/// Pick the strategy matching metadata availability
pub fn resolver_for(types: Option<&AttributeMap>) -> Box<dyn TypeResolver + '_> {
    match types {
        Some(types) => Box::new(MetadataAware::new(types)),
        None => Box::new(MetadataFree),
    }
}

/// Compile groups using explicit value types (string when absent)
pub fn compile(groups: &[FilterGroup]) -> String {
    compile_with(groups, &ExplicitTypes)
}

/// Compile groups, typing conditions through `resolver`
///
/// Returns `""` when no condition survives.
pub fn compile_with(groups: &[FilterGroup], resolver: &dyn TypeResolver) -> String {
    let mut out = String::new();
    let mut emitted = 0usize;

    for group in groups {
        let Some(rendered) = render_group(group, resolver) else {
            continue;
        };
        if out.is_empty() {
            out = rendered;
        } else {
            out = format!("{} {} {}", out, group.inter_group_operator, rendered);
        }
        emitted += 1;
    }

    tracing::debug!(groups = groups.len(), emitted, filter = %out, "Compiled filter");
    out
}

/// Attributes of filled-in conditions that `resolver` drops
///
/// Inert rows are not listed. A non-empty result means the compiled filter
/// matches more than the user asked for.
pub fn unapplied_conditions<'a>(
    groups: &'a [FilterGroup],
    resolver: &dyn TypeResolver,
) -> Vec<&'a str> {
    let mut attributes: Vec<&str> = Vec::new();
    for condition in groups.iter().flat_map(|group| &group.conditions) {
        if condition.is_inert() || render_condition(condition, resolver).is_some() {
            continue;
        }
        if let Some(attribute) = condition.attribute_name()
            && !attributes.contains(&attribute)
        {
            attributes.push(attribute);
        }
    }
    attributes
}

fn render_group(group: &FilterGroup, resolver: &dyn TypeResolver) -> Option<String> {
    let parts: Vec<String> = group
        .conditions
        .iter()
        .filter_map(|condition| render_condition(condition, resolver))
        .collect();

    if parts.is_empty() {
        return None;
    }

    let rendered = match group.filter_type {
        FilterType::Not => format!("not ({})", parts.join(" and ")),
        _ if parts.len() == 1 => parts.into_iter().next()?,
        FilterType::And => format!("({})", parts.join(" and ")),
        FilterType::Or => format!("({})", parts.join(" or ")),
    };
    Some(rendered)
}

fn render_condition(condition: &FilterCondition, resolver: &dyn TypeResolver) -> Option<String> {
    if condition.is_inert() {
        return None;
    }
    let attribute = condition.attribute_name()?;
    if !is_property_path(attribute) {
        tracing::debug!(attribute, "Attribute is not a property name");
        return None;
    }
    let operator = condition.parsed_operator()?;
    let ResolvedAttribute { path, value_type } =
        resolver.resolve(attribute, condition.value_type, operator)?;

    match operator {
        Operator::Null => return Some(format!("{} eq null", path)),
        Operator::NotNull => return Some(format!("{} ne null", path)),
        _ => {}
    }

    let raw = condition.value_text()?;

    if let Some((function, negated)) = string_function(operator) {
        if value_type != ValueType::String {
            tracing::debug!(attribute, %value_type, "String function on non-string attribute");
            return None;
        }
        let call = format!("{}({},{})", function, path, quote_string(raw));
        return Some(if negated { format!("not {}", call) } else { call });
    }

    let keyword = comparison_keyword(operator)?;
    let Some(literal) = render_literal(raw, value_type) else {
        tracing::debug!(attribute, %value_type, value = raw, "Value is not a valid literal");
        return None;
    };
    Some(format!("{} {} {}", path, keyword, literal))
}

fn render_literal(raw: &str, value_type: ValueType) -> Option<String> {
    match value_type {
        ValueType::String => Some(quote_string(raw)),
        ValueType::Number => number_literal(raw),
        ValueType::Boolean => boolean_literal(raw).map(str::to_string),
        ValueType::Datetime => datetime_literal(raw),
        ValueType::Guid | ValueType::Lookup => guid_literal(raw),
    }
}

fn comparison_keyword(operator: Operator) -> Option<&'static str> {
    let keyword = match operator {
        Operator::Eq => "eq",
        Operator::Ne => "ne",
        Operator::Gt => "gt",
        Operator::Ge => "ge",
        Operator::Lt => "lt",
        Operator::Le => "le",
        _ => return None,
    };
    Some(keyword)
}

fn string_function(operator: Operator) -> Option<(&'static str, bool)> {
    let function = match operator {
        Operator::Contains => ("contains", false),
        Operator::NotContains => ("contains", true),
        Operator::StartsWith => ("startswith", false),
        Operator::NotStartsWith => ("startswith", true),
        Operator::EndsWith => ("endswith", false),
        Operator::NotEndsWith => ("endswith", true),
        _ => return None,
    };
    Some(function)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::types::GroupOperator;

    fn eq(attribute: &str, value: &str) -> FilterCondition {
        FilterCondition::new(attribute, "eq", value)
    }

    #[test]
    fn test_empty_and_all_inert_compile_to_empty() {
        assert_eq!(compile(&[]), "");

        let groups = vec![
            FilterGroup::and(vec![FilterCondition::default(), eq("", "x")]),
            FilterGroup::or(vec![FilterCondition::new("name", "eq", "")]),
            FilterGroup::not(vec![]),
        ];
        assert_eq!(compile(&groups), "");
    }

    #[test]
    fn test_single_condition_is_not_parenthesized() {
        let groups = vec![FilterGroup::and(vec![eq("name", "Contoso")])];
        assert_eq!(compile(&groups), "name eq 'Contoso'");

        let groups = vec![FilterGroup::or(vec![eq("name", "Contoso"), FilterCondition::default()])];
        assert_eq!(compile(&groups), "name eq 'Contoso'");
    }

    #[test]
    fn test_multiple_conditions_parenthesized_and_joined() {
        let groups = vec![FilterGroup::or(vec![eq("city", "Oslo"), eq("city", "Bergen")])];
        assert_eq!(compile(&groups), "(city eq 'Oslo' or city eq 'Bergen')");

        let groups = vec![FilterGroup::and(vec![
            eq("city", "Oslo"),
            FilterCondition::new("revenue", "gt", "1000").typed(ValueType::Number),
        ])];
        assert_eq!(compile(&groups), "(city eq 'Oslo' and revenue gt 1000)");
    }

    #[test]
    fn test_quotes_are_doubled() {
        let groups = vec![FilterGroup::and(vec![eq("lastname", "O'Brien")])];
        assert_eq!(compile(&groups), "lastname eq 'O''Brien'");
    }

    #[test]
    fn test_not_group_wraps_and_joined_conditions() {
        let groups = vec![FilterGroup::not(vec![eq("city", "Oslo"), eq("country", "NO")])];
        assert_eq!(compile(&groups), "not (city eq 'Oslo' and country eq 'NO')");

        let groups = vec![FilterGroup::not(vec![eq("city", "Oslo")])];
        assert_eq!(compile(&groups), "not (city eq 'Oslo')");
    }

    #[test]
    fn test_inter_group_operator_precedes_its_group() {
        let groups = vec![
            FilterGroup::and(vec![eq("a", "1")]).joined_by(GroupOperator::Or),
            FilterGroup::and(vec![eq("b", "2")]).joined_by(GroupOperator::Or),
            FilterGroup::and(vec![eq("c", "3")]),
        ];
        assert_eq!(compile(&groups), "a eq '1' or b eq '2' and c eq '3'");
    }

    #[test]
    fn test_first_emitted_group_operator_ignored() {
        let groups = vec![
            FilterGroup::and(vec![FilterCondition::default()]),
            FilterGroup::and(vec![eq("a", "1")]).joined_by(GroupOperator::Or),
            FilterGroup::or(vec![eq("b", "2"), eq("c", "3")]).joined_by(GroupOperator::And),
        ];
        assert_eq!(compile(&groups), "a eq '1' and (b eq '2' or c eq '3')");
    }

    #[test]
    fn test_string_functions_and_negations() {
        let groups = vec![FilterGroup::and(vec![
            FilterCondition::new("name", "contains", "corp"),
            FilterCondition::new("name", "not_startswith", "Test"),
            FilterCondition::new("email", "doesnotcontain", "'"),
        ])];
        assert_eq!(
            compile(&groups),
            "(contains(name,'corp') and not startswith(name,'Test') and not contains(email,''''))"
        );
    }

    #[test]
    fn test_null_checks() {
        let groups = vec![FilterGroup::or(vec![
            FilterCondition::unary("phone", "null"),
            FilterCondition::unary("email", "not_null"),
        ])];
        assert_eq!(compile(&groups), "(phone eq null or email ne null)");
    }

    #[test]
    fn test_unknown_operator_dropped() {
        let groups = vec![FilterGroup::and(vec![
            FilterCondition::new("name", "between", "a"),
            eq("city", "Oslo"),
        ])];
        assert_eq!(compile(&groups), "city eq 'Oslo'");
    }

    #[test]
    fn test_typed_literals() {
        let id = "6F9619FF-8B86-D011-B42D-00C04FC964FF";
        let groups = vec![FilterGroup::and(vec![
            FilterCondition::new("donotemail", "eq", "TRUE").typed(ValueType::Boolean),
            FilterCondition::new("createdon", "ge", "2024-01-31").typed(ValueType::Datetime),
            FilterCondition::new("accountid", "eq", id).typed(ValueType::Guid),
            FilterCondition::new("parentaccountid", "eq", id).typed(ValueType::Lookup),
        ])];
        assert_eq!(
            compile(&groups),
            "(donotemail eq true and createdon ge 2024-01-31 and \
             accountid eq 6f9619ff-8b86-d011-b42d-00c04fc964ff and \
             _parentaccountid_value eq 6f9619ff-8b86-d011-b42d-00c04fc964ff)"
        );
    }

    #[test]
    fn test_invalid_typed_value_dropped() {
        let groups = vec![FilterGroup::and(vec![
            FilterCondition::new("revenue", "gt", "lots").typed(ValueType::Number),
            FilterCondition::new("accountid", "eq", "not-a-guid").typed(ValueType::Guid),
            eq("city", "Oslo"),
        ])];
        assert_eq!(compile(&groups), "city eq 'Oslo'");
    }

    #[test]
    fn test_string_function_on_number_dropped() {
        let groups = vec![FilterGroup::and(vec![
            FilterCondition::new("revenue", "contains", "10").typed(ValueType::Number),
        ])];
        assert_eq!(compile(&groups), "");
    }

    #[test]
    fn test_metadata_aware_types_from_map() {
        let types = AttributeMap::from([
            ("revenue".to_string(), ValueType::Number),
            ("primarycontactid".to_string(), ValueType::Lookup),
        ]);
        let id = "6f9619ff-8b86-d011-b42d-00c04fc964ff";
        let groups = vec![FilterGroup::and(vec![
            FilterCondition::new("revenue", "gt", "100"),
            FilterCondition::new("primarycontactid", "eq", id),
            FilterCondition::unary("primarycontactid", "null"),
            eq("name", "x"),
        ])];

        assert_eq!(
            compile_with(&groups, &MetadataAware::new(&types)),
            format!(
                "(revenue gt 100 and _primarycontactid_value eq {id} and \
                 _primarycontactid_value eq null and name eq 'x')"
            )
        );
    }

    #[test]
    fn test_metadata_aware_explicit_type_wins() {
        let types = AttributeMap::from([("code".to_string(), ValueType::Number)]);
        let groups = vec![FilterGroup::and(vec![
            FilterCondition::new("code", "eq", "007").typed(ValueType::String),
        ])];
        assert_eq!(
            compile_with(&groups, &MetadataAware::new(&types)),
            "code eq '007'"
        );
    }

    #[test]
    fn test_metadata_free_drops_untyped_comparisons() {
        let groups = vec![FilterGroup::and(vec![
            eq("name", "Contoso"),
            FilterCondition::new("revenue", "gt", "5").typed(ValueType::Number),
            FilterCondition::new("name", "startswith", "Con"),
            FilterCondition::unary("phone", "not_null"),
        ])];
        assert_eq!(
            compile_with(&groups, &MetadataFree),
            "(revenue gt 5 and startswith(name,'Con') and phone ne null)"
        );
    }

    #[test]
    fn test_metadata_free_can_reduce_to_empty() {
        let groups = vec![FilterGroup::and(vec![eq("name", "Contoso")])];
        assert_eq!(compile_with(&groups, &MetadataFree), "");
    }

    #[test]
    fn test_non_identifier_attribute_dropped() {
        let groups = vec![FilterGroup::and(vec![
            eq("name eq 'x' or true", "y"),
            eq("first name", "Ann"),
            eq("city", "Oslo"),
            FilterCondition::new("parentaccountid/name", "startswith", "Con"),
        ])];
        assert_eq!(
            compile(&groups),
            "(city eq 'Oslo' and startswith(parentaccountid/name,'Con'))"
        );
    }

    #[test]
    fn test_unapplied_conditions_lists_dropped_attributes() {
        let types = AttributeMap::from([("revenue".to_string(), ValueType::Number)]);
        let groups = vec![FilterGroup::and(vec![
            eq("name", "Contoso"),
            FilterCondition::new("revenue", "gt", "1,000"),
            FilterCondition::new("revenue", "lt", "lots"),
            eq("first name", "Ann"),
            FilterCondition::default(),
        ])];

        assert_eq!(
            unapplied_conditions(&groups, &MetadataAware::new(&types)),
            vec!["revenue", "first name"]
        );
        assert_eq!(
            unapplied_conditions(&groups, &MetadataFree),
            vec!["name", "revenue", "first name"]
        );
        assert!(unapplied_conditions(&groups[..0], &ExplicitTypes).is_empty());

        let clean = vec![FilterGroup::and(vec![eq("name", "Contoso"), FilterCondition::default()])];
        assert!(unapplied_conditions(&clean, &ExplicitTypes).is_empty());
    }

    #[test]
    fn test_resolver_for_selects_strategy() {
        let types = AttributeMap::from([("ownerid".to_string(), ValueType::Lookup)]);
        assert_eq!(resolver_for(Some(&types)).column("ownerid"), "_ownerid_value");
        assert_eq!(resolver_for(None).column("ownerid"), "ownerid");
    }

    #[test]
    fn test_compile_is_pure() {
        let groups = vec![FilterGroup::or(vec![eq("a", "1"), eq("b", "2")])];
        assert_eq!(compile(&groups), compile(&groups));
    }
}
