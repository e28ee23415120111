//! Domain logic
//!
//! - `query` - filter compiler and query options builder
//! - `paging` - cursor-based page accumulation
//! - `batch` - bounded-concurrency write execution
//! - `bulk` - bulk update/delete workflow

pub mod batch;
pub mod bulk;
pub mod paging;
pub mod query;
