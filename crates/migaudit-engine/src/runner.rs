//! Fetch runner: drives both adapters and folds failures into results
//!
//! Operations run one after the other, origin first, then target. Each
//! operation resolves the table name for its side, so a name that cannot
//! be resolved shows up as that operation's error. Nothing is cached
//! between calls.

use crate::audit::{AuditResult, BothSides, SideFetch};
use chrono::{Local, NaiveDate, NaiveDateTime};
use migaudit_catalog::SourceAdapter;
use migaudit_core::{
    ColumnDescriptor, CountResult, DateCount, ExistenceResult, FetchError, FetchOutcome, RowSet,
    TableIdentifier, TableNameResolver,
};
use tracing::{info_span, Instrument};

/// Runs audit operations against an origin and a target adapter
pub struct AuditRunner {
    resolver: TableNameResolver,
    origin: Box<dyn SourceAdapter>,
    target: Box<dyn SourceAdapter>,
}

impl AuditRunner {
    pub fn new(
        resolver: TableNameResolver,
        origin: Box<dyn SourceAdapter>,
        target: Box<dyn SourceAdapter>,
    ) -> Self {
        Self {
            resolver,
            origin,
            target,
        }
    }

    pub fn origin(&self) -> &dyn SourceAdapter {
        self.origin.as_ref()
    }

    pub fn target(&self) -> &dyn SourceAdapter {
        self.target.as_ref()
    }

    fn resolve(&self, adapter: &dyn SourceAdapter, full_name: &str) -> Result<TableIdentifier, FetchError> {
        self.resolver.resolve(full_name, adapter.kind())
    }

    async fn exists_on(&self, adapter: &dyn SourceAdapter, full_name: &str) -> ExistenceResult {
        let span = info_span!("exists", source = adapter.name(), table = full_name);
        let result = async {
            let table = self.resolve(adapter, full_name)?;
            adapter.exists(&table).await
        }
        .instrument(span)
        .await;

        logged("exists", adapter, result).into()
    }

    async fn sample_on(
        &self,
        adapter: &dyn SourceAdapter,
        full_name: &str,
        date_column: &str,
        date: NaiveDate,
        limit: u32,
    ) -> FetchOutcome<RowSet> {
        let span = info_span!("sample_rows", source = adapter.name(), table = full_name, %date, limit);
        let result = async {
            let table = self.resolve(adapter, full_name)?;
            adapter.sample_rows(&table, date_column, date, limit).await
        }
        .instrument(span)
        .await;

        logged("sample_rows", adapter, result).into()
    }

    async fn total_on(&self, adapter: &dyn SourceAdapter, full_name: &str) -> CountResult {
        let span = info_span!("total_count", source = adapter.name(), table = full_name);
        let result = async {
            let table = self.resolve(adapter, full_name)?;
            adapter.total_count(&table).await
        }
        .instrument(span)
        .await;

        logged("total_count", adapter, result).into()
    }

    async fn date_counts_on(
        &self,
        adapter: &dyn SourceAdapter,
        full_name: &str,
        date_column: &str,
        days: u32,
    ) -> FetchOutcome<Vec<DateCount>> {
        let span = info_span!("count_by_date", source = adapter.name(), table = full_name, days);
        let result = async {
            let table = self.resolve(adapter, full_name)?;
            adapter.count_by_date(&table, date_column, days).await
        }
        .instrument(span)
        .await;

        logged("count_by_date", adapter, result).into()
    }

    async fn columns_on(&self, adapter: &dyn SourceAdapter, full_name: &str) -> FetchOutcome<Vec<ColumnDescriptor>> {
        let span = info_span!("columns", source = adapter.name(), table = full_name);
        let result = async {
            let table = self.resolve(adapter, full_name)?;
            adapter.columns(&table).await
        }
        .instrument(span)
        .await;

        logged("columns", adapter, result).into()
    }

    /// Does the table exist on each side
    pub async fn check_existence(&self, full_name: &str) -> BothSides<ExistenceResult> {
        BothSides::new(
            self.exists_on(self.origin(), full_name).await,
            self.exists_on(self.target(), full_name).await,
        )
    }

    /// Up to `limit` rows whose date column falls on `date`
    pub async fn check_sample(
        &self,
        full_name: &str,
        date_column: &str,
        date: NaiveDate,
        limit: u32,
    ) -> BothSides<FetchOutcome<RowSet>> {
        BothSides::new(
            self.sample_on(self.origin(), full_name, date_column, date, limit).await,
            self.sample_on(self.target(), full_name, date_column, date, limit).await,
        )
    }

    /// Total row count on each side
    pub async fn check_totals(&self, full_name: &str) -> BothSides<CountResult> {
        BothSides::new(
            self.total_on(self.origin(), full_name).await,
            self.total_on(self.target(), full_name).await,
        )
    }

    /// Per-date counts over the trailing `days` window on each side
    pub async fn check_date_counts(
        &self,
        full_name: &str,
        date_column: &str,
        days: u32,
    ) -> BothSides<FetchOutcome<Vec<DateCount>>> {
        BothSides::new(
            self.date_counts_on(self.origin(), full_name, date_column, days).await,
            self.date_counts_on(self.target(), full_name, date_column, days).await,
        )
    }

    /// Column listing on each side
    pub async fn check_columns(&self, full_name: &str) -> BothSides<FetchOutcome<Vec<ColumnDescriptor>>> {
        BothSides::new(
            self.columns_on(self.origin(), full_name).await,
            self.columns_on(self.target(), full_name).await,
        )
    }

    /// Fetch everything from scratch and assemble the result, stamped now
    pub async fn full_audit(
        &self,
        full_name: &str,
        date_column: &str,
        days: u32,
        analysis_date: NaiveDate,
    ) -> AuditResult {
        self.full_audit_at(full_name, date_column, days, analysis_date, Local::now().naive_local())
            .await
    }

    /// [`Self::full_audit`] with an explicit run timestamp
    pub async fn full_audit_at(
        &self,
        full_name: &str,
        date_column: &str,
        days: u32,
        analysis_date: NaiveDate,
        generated_at: NaiveDateTime,
    ) -> AuditResult {
        tracing::info!(table = full_name, %analysis_date, "running full audit");

        let existence = self.check_existence(full_name).await;
        let totals = self.check_totals(full_name).await;
        let date_counts = self.check_date_counts(full_name, date_column, days).await;
        let columns = self.check_columns(full_name).await;

        let origin = SideFetch {
            source: self.origin().kind(),
            table: self.resolve(self.origin(), full_name).ok(),
            existence: existence.origin,
            total: totals.origin,
            date_counts: date_counts.origin,
            columns: columns.origin,
        };
        let target = SideFetch {
            source: self.target().kind(),
            table: self.resolve(self.target(), full_name).ok(),
            existence: existence.target,
            total: totals.target,
            date_counts: date_counts.target,
            columns: columns.target,
        };

        AuditResult::assemble(full_name, analysis_date, generated_at, date_column, days, origin, target)
    }
}

fn logged<T>(operation: &str, adapter: &dyn SourceAdapter, result: Result<T, FetchError>) -> Result<T, FetchError> {
    match &result {
        Ok(_) => tracing::debug!(operation, source = adapter.name(), "operation succeeded"),
        Err(e) => tracing::warn!(operation, source = adapter.name(), error = %e, "operation failed"),
    }
    result
}
