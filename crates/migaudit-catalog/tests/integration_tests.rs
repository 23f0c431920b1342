//! Integration tests for warehouse adapters
//!
//! Mock-backed tests need no credentials. Tests against live warehouses are
//! marked with `#[ignore]` and read the same environment variables as the
//! `migaudit` binary.
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all non-ignored tests (no credentials required)
//! cargo test -p migaudit-catalog --test integration_tests
//!
//! # Run Snowflake integration tests
//! ACCOUNT_SNOW=xy12345 USER_SNOW=user PASSWORD_SNOW=pass \
//! DATABASE_SNOW=PROD SCHEMA_SNOW=MFS_LENDING MIGAUDIT_TEST_TABLE=LOANS \
//! cargo test -p migaudit-catalog --features snowflake --test integration_tests -- --ignored
//!
//! # Run Redshift integration tests
//! HOST=cluster.redshift.amazonaws.com PORT=5439 DBNAME=dev \
//! USERNAMERS=user PASSWORD=pass MIGAUDIT_TEST_TABLE=mfs_lending.loans \
//! cargo test -p migaudit-catalog --features redshift --test integration_tests -- --ignored
//! ```

mod fixtures;

use migaudit_catalog::{MockAdapter, MockOperation, MockTable, SourceAdapter};
use migaudit_core::{AuditConfig, DateCount, FetchError, SourceKind, TableNameResolver};
use pretty_assertions::assert_eq;

// =============================================================================
// Helper Functions
// =============================================================================

/// Configuration from the environment, as the binary would load it
#[allow(dead_code)]
fn env_config() -> AuditConfig {
    let mut config = AuditConfig::default();
    config.apply_env().expect("environment variables are valid");
    config
}

/// Table named by MIGAUDIT_TEST_TABLE, if set
#[allow(dead_code)]
fn live_table() -> Option<String> {
    std::env::var("MIGAUDIT_TEST_TABLE").ok()
}

fn resolver() -> TableNameResolver {
    TableNameResolver::new(Some("PROD".to_string()), Some("MFS_LENDING".to_string()))
}

// =============================================================================
// Mock Adapter Tests (No credentials required)
// =============================================================================

#[tokio::test]
async fn test_resolved_names_reach_both_mocks() {
    let origin = fixtures::origin_adapter();
    let target = fixtures::target_adapter();

    let origin_id = resolver().resolve("loans", SourceKind::Origin).unwrap();
    let target_id = resolver().resolve("mfs_lending.loans", SourceKind::Target).unwrap();

    assert!(origin.exists(&origin_id).await.unwrap());
    assert!(target.exists(&target_id).await.unwrap());
    assert_eq!(origin.total_count(&origin_id).await.unwrap(), 1_200);
    assert_eq!(target.total_count(&target_id).await.unwrap(), 1_150);
}

#[tokio::test]
async fn test_target_never_sees_database_segment() {
    let target = fixtures::target_adapter();
    let id = resolver().resolve("DB.mfs_lending.loans", SourceKind::Target).unwrap();

    assert!(target.exists(&id).await.unwrap());

    let requests = target.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].table.database, None);
    assert_eq!(requests[0].table.schema, "mfs_lending");
    assert_eq!(requests[0].table.table, "loans");
}

#[tokio::test]
async fn test_date_counts_are_descending() {
    let origin = fixtures::origin_adapter();
    let id = resolver().resolve("loans", SourceKind::Origin).unwrap();

    let counts = origin.count_by_date(&id, "time_extracted", 5).await.unwrap();
    assert_eq!(
        counts,
        vec![
            DateCount::new(fixtures::day(5), 400),
            DateCount::new(fixtures::day(4), 400),
            DateCount::new(fixtures::day(3), 400),
        ]
    );

    // a one day window only sees today
    let today_only = origin.count_by_date(&id, "time_extracted", 1).await.unwrap();
    assert_eq!(today_only, vec![DateCount::new(fixtures::day(5), 400)]);
}

#[tokio::test]
async fn test_sample_rows_keep_nulls() {
    let target = fixtures::target_adapter();
    let id = resolver().resolve("mfs_lending.loans", SourceKind::Target).unwrap();

    let rows = target
        .sample_rows(&id, "time_extracted", fixtures::day(5), 10)
        .await
        .unwrap();

    assert_eq!(rows.columns, vec!["loan_id".to_string(), "status".to_string()]);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows.rows[2][1], None);
}

#[tokio::test]
async fn test_empty_sample_is_not_an_error() {
    let target = fixtures::target_adapter();
    let id = resolver().resolve("mfs_lending.loans", SourceKind::Target).unwrap();

    let rows = target
        .sample_rows(&id, "time_extracted", fixtures::day(1), 10)
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_columns_keep_ordinal_order() {
    let origin = fixtures::origin_adapter();
    let id = resolver().resolve("loans", SourceKind::Origin).unwrap();

    let names: Vec<String> = origin
        .columns(&id)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["LOAN_ID", "CUSTOMER_ID", "AMOUNT", "STATUS", "TIME_EXTRACTED"]);
}

#[tokio::test]
async fn test_operations_fail_independently() {
    let target = fixtures::target_adapter();
    let id = resolver().resolve("mfs_lending.loans", SourceKind::Target).unwrap();

    target
        .add_error(&id, MockOperation::TotalCount, FetchError::QueryFailure("timeout".to_string()))
        .await;

    assert!(target.exists(&id).await.unwrap());
    assert!(matches!(target.total_count(&id).await, Err(FetchError::QueryFailure(_))));
    assert_eq!(target.columns(&id).await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_mock_adapter_latency_simulation() {
    let adapter = MockAdapter::target().with_latency(50);
    adapter.add_table("public", "events", MockTable::new()).await;
    let id = resolver().resolve("events", SourceKind::Target).unwrap();

    let start = std::time::Instant::now();
    assert!(adapter.exists(&id).await.unwrap());
    assert!(start.elapsed() >= std::time::Duration::from_millis(50));
}

#[tokio::test]
async fn test_adapters_as_trait_objects() {
    let adapters: Vec<Box<dyn SourceAdapter>> = vec![
        Box::new(fixtures::origin_adapter()),
        Box::new(fixtures::target_adapter()),
    ];

    let kinds: Vec<SourceKind> = adapters.iter().map(|a| a.kind()).collect();
    assert_eq!(kinds, vec![SourceKind::Origin, SourceKind::Target]);

    for adapter in &adapters {
        assert!(adapter.test_connection().await.is_ok());
    }
}

// =============================================================================
// Snowflake Integration Tests (require credentials)
// =============================================================================

#[tokio::test]
#[ignore] // Run with: cargo test --features snowflake -- --ignored
async fn test_snowflake_live_audit_queries() {
    #[cfg(feature = "snowflake")]
    {
        use migaudit_catalog::SnowflakeAdapter;

        let config = env_config();
        let adapter = SnowflakeAdapter::new(config.origin.clone());
        if !adapter.missing_settings().is_empty() {
            eprintln!("Skipping Snowflake test: set {}", adapter.missing_settings().join(", "));
            return;
        }

        adapter.test_connection().await.expect("Connection test failed");

        let Some(name) = live_table() else { return };
        let table = config
            .resolver()
            .resolve(&name, SourceKind::Origin)
            .expect("MIGAUDIT_TEST_TABLE resolves");

        assert!(adapter.exists(&table).await.expect("exists query failed"));
        let columns = adapter.columns(&table).await.expect("columns query failed");
        assert!(!columns.is_empty());
        println!("Fetched {} columns from Snowflake", columns.len());
    }

    #[cfg(not(feature = "snowflake"))]
    {
        eprintln!("Snowflake feature not enabled. Rebuild with --features snowflake");
    }
}

// =============================================================================
// Redshift Integration Tests (require credentials)
// =============================================================================

#[tokio::test]
#[ignore] // Run with: cargo test --features redshift -- --ignored
async fn test_redshift_live_audit_queries() {
    #[cfg(feature = "redshift")]
    {
        use migaudit_catalog::RedshiftAdapter;

        let config = env_config();
        let adapter = RedshiftAdapter::new(config.target.clone());
        if !adapter.missing_settings().is_empty() {
            eprintln!("Skipping Redshift test: set {}", adapter.missing_settings().join(", "));
            return;
        }

        adapter.test_connection().await.expect("Connection test failed");

        let Some(name) = live_table() else { return };
        let table = config
            .resolver()
            .resolve(&name, SourceKind::Target)
            .expect("MIGAUDIT_TEST_TABLE resolves");

        assert!(adapter.exists(&table).await.expect("exists query failed"));
        let total = adapter.total_count(&table).await.expect("count query failed");
        let dates = adapter
            .count_by_date(&table, &config.audit.date_column, config.audit.days)
            .await
            .expect("date count query failed");
        assert!(dates.iter().map(|d| d.count).sum::<u64>() <= total);
    }

    #[cfg(not(feature = "redshift"))]
    {
        eprintln!("Redshift feature not enabled. Rebuild with --features redshift");
    }
}
