//! Query building
//!
//! - `types` - filter tree and sort definitions
//! - `filter` - filter compiler and type-resolution strategies
//! - `options` - `$select`/`$filter`/`$orderby`/`$top` assembly

pub mod filter;
pub mod options;
pub mod types;

pub use filter::{
    ExplicitTypes, MetadataAware, MetadataFree, ResolvedAttribute, TypeResolver, compile,
    compile_with, resolver_for, unapplied_conditions,
};
pub use options::{QueryOptions, build, parse_columns};
pub use types::{
    FilterCondition, FilterGroup, FilterType, GroupOperator, Operator, OrderBy, SortDirection,
};
