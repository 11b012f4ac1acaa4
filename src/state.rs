//! Shared application state for all routes.

use crate::auth::TokenIssuer;
use crate::store::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: TokenIssuer,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, tokens: TokenIssuer) -> Self {
        AppState { store, tokens }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }
}
