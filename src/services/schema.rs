// Query schema shared by the GraphQL endpoint and the natural-language pipeline
//
// Read-only by construction: there is no mutation root, and every resolver goes
// through `AcquisitionService`.
use async_graphql::{Context, EmptyMutation, EmptySubscription, Object, Schema, ID};

use crate::api::middleware::AppError;
use crate::models::{
    Acquisition, AcquisitionFilter, AcquisitionsResult, ListingArgs, SortField, SortOrder,
    Timestamp, DEFAULT_LIMIT, DEFAULT_OFFSET,
};
use crate::services::acquisition_service::AcquisitionService;

pub type AcquisitionSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

const MAX_QUERY_DEPTH: usize = 8;

pub fn build_schema() -> AcquisitionSchema {
    Schema::build(QueryRoot, EmptyMutation, EmptySubscription)
        .limit_depth(MAX_QUERY_DEPTH)
        .finish()
}

pub struct QueryRoot;

fn filter_date(
    value: Option<Timestamp>,
    argument: &str,
) -> Result<Option<chrono::NaiveDate>, AppError> {
    value
        .map(|timestamp| {
            timestamp.date().ok_or_else(|| {
                AppError::Validation(format!("{} must be an ISO-8601 date", argument))
            })
        })
        .transpose()
}

#[Object(rename_args = "snake_case")]
impl QueryRoot {
    /// List acquisitions with optional filters like date range, currency, type of payment and
    /// sorting by acquisition id, acquisition date or price.
    async fn acquisitions(
        &self,
        ctx: &Context<'_>,
        #[graphql(default_with = "Some(DEFAULT_LIMIT as i32)")] limit: Option<i32>,
        #[graphql(default_with = "Some(DEFAULT_OFFSET as i32)")] offset: Option<i32>,
        term_code: Option<String>,
        currency: Option<String>,
        acquired_from: Option<Timestamp>,
        acquired_to: Option<Timestamp>,
        acquiring_object_id: Option<String>,
        acquired_object_id: Option<String>,
        sort_by: Option<SortField>,
        #[graphql(default_with = "Some(SortOrder::Asc)")] sort_order: Option<SortOrder>,
    ) -> async_graphql::Result<AcquisitionsResult> {
        let service = ctx.data::<AcquisitionService>()?;

        let args = ListingArgs {
            filter: AcquisitionFilter {
                term_code,
                currency,
                acquired_from: filter_date(acquired_from, "acquired_from")?,
                acquired_to: filter_date(acquired_to, "acquired_to")?,
                acquiring_object_id,
                acquired_object_id,
            },
            // An explicit null falls back to the default like an omitted argument
            limit: limit.map_or(DEFAULT_LIMIT, i64::from),
            offset: offset.map_or(DEFAULT_OFFSET, i64::from),
            sort_by,
            sort_order: sort_order.unwrap_or_default(),
        };

        Ok(service.list_acquisitions(&args).await?)
    }

    /// Get details about a single acquisition by its ID.
    async fn acquisition(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<Option<Acquisition>> {
        let service = ctx.data::<AcquisitionService>()?;
        Ok(service.get_acquisition(&id).await?)
    }
}
