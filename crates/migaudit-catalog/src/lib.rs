//! Warehouse adapters for migration audits
//!
//! Each adapter answers the five questions an audit asks of one warehouse:
//! does the table exist, what do a few rows look like, how many rows are
//! there, how are they spread over recent days, and which columns does the
//! table have.
//!
//! ## Features
//!
//! Enable warehouse support via Cargo features:
//! - `snowflake` - Snowflake (migration origin)
//! - `redshift` - Amazon Redshift (migration target, PostgreSQL protocol)
//! - `all-warehouses` - Both adapters
//!
//! ## Example
//!
//! ```rust,ignore
//! use migaudit_catalog::{RedshiftAdapter, SourceAdapter};
//! use migaudit_core::{AuditConfig, SourceKind};
//!
//! let config = AuditConfig::default();
//! let adapter = RedshiftAdapter::new(config.target.clone());
//! let table = config.resolver().resolve("mfs_lending.loans", SourceKind::Target)?;
//! let total = adapter.total_count(&table).await?;
//! ```

pub mod adapter;
pub mod query;
pub mod snowflake;
pub mod redshift;
pub mod mock;

pub use adapter::SourceAdapter;
pub use mock::{MockAdapter, MockAdapterBuilder, MockOperation, MockRequest, MockTable};
pub use redshift::RedshiftAdapter;
pub use snowflake::SnowflakeAdapter;
