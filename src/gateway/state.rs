use std::sync::Arc;

use crate::pipeline::Teller;
use crate::store::postgres::Database;

/// Shared gateway state.
#[derive(Clone)]
pub struct AppState {
    /// Admission handle into the transaction pipeline.
    pub teller: Teller,
    /// Pool for the account create/list endpoints and the health probe.
    pub db: Arc<Database>,
}

impl AppState {
    pub fn new(teller: Teller, db: Arc<Database>) -> Self {
        Self { teller, db }
    }
}
