use std::sync::Arc;

use crate::services::database::StoreProvider;
use crate::services::nl_query_service::NlQueryService;
use crate::services::schema::AcquisitionSchema;

pub mod graphql;
pub mod llm;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub schema: AcquisitionSchema,
    pub provider: Arc<dyn StoreProvider>,
    pub nl_service: Arc<NlQueryService>,
}

impl AppState {
    pub fn new(
        schema: AcquisitionSchema,
        provider: Arc<dyn StoreProvider>,
        nl_service: Arc<NlQueryService>,
    ) -> Self {
        Self {
            schema,
            provider,
            nl_service,
        }
    }
}
