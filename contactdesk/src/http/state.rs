use crate::auth::TokenIssuer;
use crate::store::Store;

/// Shared per-process state. Cheap to clone; all records live in the store.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Store,
    pub tokens: TokenIssuer,
}
