use std::sync::Arc;

use crate::api::middleware::{AppError, QueryStage};
use crate::models::{Acquisition, AcquisitionsResult, ListingArgs};
use crate::services::database::{DataStore, Row};
use crate::services::query_builder::{build_lookup_statement, build_query_plan, Statement};
use crate::services::result_shaper::{shape_acquisition, shape_metadata};

/// Query engine for acquisition listings and point lookups
#[derive(Clone)]
pub struct AcquisitionService {
    store: Arc<dyn DataStore>,
}

impl AcquisitionService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Run one statement, tagging any failure with its stage
    async fn run(&self, stage: QueryStage, statement: &Statement) -> Result<Vec<Row>, AppError> {
        let rows = self
            .store
            .query(&statement.sql, &statement.params)
            .await
            .map_err(|e| match e {
                // An unreachable database is reported as such, not as a failed statement
                AppError::ConnectionUnavailable(_) => e,
                e => {
                    tracing::error!(stage = %stage, "{}: {}", stage.failure_message(), e);
                    AppError::QueryExecution { stage }
                }
            })?;
        tracing::debug!(stage = %stage, "{} rows returned from DB", rows.len());
        Ok(rows)
    }

    /// Filtered, sorted, paginated listing with aggregate metadata
    ///
    /// The listing statement runs first. The three aggregate statements then run
    /// concurrently over the same predicate; the first failure aborts the whole
    /// operation and no partial metadata is returned.
    pub async fn list_acquisitions(
        &self,
        args: &ListingArgs,
    ) -> Result<AcquisitionsResult, AppError> {
        let plan = build_query_plan(args);

        let listing_rows = self.run(QueryStage::Listing, &plan.listing).await?;
        let rows = listing_rows.iter().map(shape_acquisition).collect();

        let (stats_rows, currency_rows, company_rows) = futures::try_join!(
            self.run(QueryStage::Stats, &plan.stats),
            self.run(QueryStage::Currency, &plan.currency),
            self.run(QueryStage::CompanyCount, &plan.company_counts),
        )?;

        Ok(AcquisitionsResult {
            rows,
            metadata: shape_metadata(&stats_rows, &currency_rows, &company_rows),
        })
    }

    /// Single acquisition by id; `None` when nothing matches
    pub async fn get_acquisition(&self, id: &str) -> Result<Option<Acquisition>, AppError> {
        let raw = id.trim();
        if raw.is_empty() {
            return Err(AppError::Validation("Missing acquisition id".to_string()));
        }

        let Some(id_num) = coerce_id(raw) else {
            // The store could never match a non-numeric id
            tracing::debug!("Acquisition id {:?} is not numeric, nothing to look up", raw);
            return Ok(None);
        };
        tracing::debug!("Query.acquisition - idNum: {}", id_num);

        let rows = self
            .run(QueryStage::Lookup, &build_lookup_statement(id_num))
            .await?;
        Ok(rows.first().map(shape_acquisition))
    }
}

/// Integer form of a lookup id: plain integers, or integral numbers such as `1e3`
fn coerce_id(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}
