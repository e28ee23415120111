//! Filter tree definitions
//!
//! Shapes the UI assembles and hands to the compiler. Everything is
//! deserializable from the UI's JSON (`filterType`, `interGroupOperator`,
//! `valueType`), and deliberately lenient: a half-filled row is kept in the
//! tree and simply ignored at compile time.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::data::types::ValueType;

/// Comparison or function applied by a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Contains,
    NotContains,
    StartsWith,
    NotStartsWith,
    EndsWith,
    NotEndsWith,
    Null,
    NotNull,
}

impl Operator {
    /// Parse the UI's operator token; unknown tokens yield `None`
    pub fn parse(raw: &str) -> Option<Self> {
        let op = match raw.trim().to_ascii_lowercase().as_str() {
            "eq" => Self::Eq,
            "ne" | "neq" => Self::Ne,
            "gt" => Self::Gt,
            "ge" => Self::Ge,
            "lt" => Self::Lt,
            "le" => Self::Le,
            "contains" => Self::Contains,
            "not_contains" | "doesnotcontain" => Self::NotContains,
            "startswith" => Self::StartsWith,
            "not_startswith" => Self::NotStartsWith,
            "endswith" => Self::EndsWith,
            "not_endswith" => Self::NotEndsWith,
            "null" | "is_null" => Self::Null,
            "not_null" | "notnull" | "is_not_null" => Self::NotNull,
            _ => return None,
        };
        Some(op)
    }

    pub fn requires_value(self) -> bool {
        !matches!(self, Self::Null | Self::NotNull)
    }

    pub fn is_null_check(self) -> bool {
        !self.requires_value()
    }

    /// `contains`/`startswith`/`endswith` and their negations
    pub fn is_string_function(self) -> bool {
        matches!(
            self,
            Self::Contains
                | Self::NotContains
                | Self::StartsWith
                | Self::NotStartsWith
                | Self::EndsWith
                | Self::NotEndsWith
        )
    }
}

/// One row of the filter editor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCondition {
    #[serde(default)]
    pub attribute: Option<String>,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub value: Option<String>,
    #[serde(default)]
    pub value_type: Option<ValueType>,
}

impl FilterCondition {
    pub fn new(
        attribute: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            attribute: Some(attribute.into()),
            operator: Some(operator.into()),
            value: Some(value.into()),
            value_type: None,
        }
    }

    /// Condition without a value (`null` / `not_null`)
    pub fn unary(attribute: impl Into<String>, operator: impl Into<String>) -> Self {
        Self {
            attribute: Some(attribute.into()),
            operator: Some(operator.into()),
            value: None,
            value_type: None,
        }
    }

    pub fn typed(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    /// Trimmed attribute, if present and non-blank
    pub fn attribute_name(&self) -> Option<&str> {
        non_blank(self.attribute.as_deref())
    }

    /// Parsed operator, if present and known
    pub fn parsed_operator(&self) -> Option<Operator> {
        non_blank(self.operator.as_deref()).and_then(Operator::parse)
    }

    /// Value, if present and non-blank (untrimmed)
    pub fn value_text(&self) -> Option<&str> {
        match self.value.as_deref() {
            Some(v) if !v.trim().is_empty() => Some(v),
            _ => None,
        }
    }

    /// Whether this row contributes nothing to the compiled filter
    pub fn is_inert(&self) -> bool {
        if self.attribute_name().is_none() {
            return true;
        }
        match self.parsed_operator() {
            None => true,
            Some(op) => op.requires_value() && self.value_text().is_none(),
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Accept strings, numbers and booleans for `value`
fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "filter value must be a scalar, got {}",
            other
        ))),
    }
}

/// How a group combines its own conditions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    #[default]
    #[serde(alias = "AND")]
    And,
    #[serde(alias = "OR")]
    Or,
    #[serde(alias = "NOT")]
    Not,
}

/// Operator joining a group to the compiled output before it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupOperator {
    #[default]
    #[serde(alias = "AND")]
    And,
    #[serde(alias = "OR")]
    Or,
}

impl GroupOperator {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

impl fmt::Display for GroupOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A set of conditions under one boolean operator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterGroup {
    #[serde(default)]
    pub filter_type: FilterType,
    #[serde(default)]
    pub conditions: Vec<FilterCondition>,
    #[serde(default)]
    pub inter_group_operator: GroupOperator,
}

impl FilterGroup {
    pub fn new(filter_type: FilterType, conditions: Vec<FilterCondition>) -> Self {
        Self {
            filter_type,
            conditions,
            inter_group_operator: GroupOperator::And,
        }
    }

    pub fn and(conditions: Vec<FilterCondition>) -> Self {
        Self::new(FilterType::And, conditions)
    }

    pub fn or(conditions: Vec<FilterCondition>) -> Self {
        Self::new(FilterType::Or, conditions)
    }

    pub fn not(conditions: Vec<FilterCondition>) -> Self {
        Self::new(FilterType::Not, conditions)
    }

    /// Set the operator joining this group to the preceding output
    pub fn joined_by(mut self, operator: GroupOperator) -> Self {
        self.inter_group_operator = operator;
        self
    }
}

/// Sort direction for `$orderby`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// `$orderby` target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub attribute: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn asc(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            direction: SortDirection::Desc,
        }
    }
}
