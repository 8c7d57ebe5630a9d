use std::sync::Arc;

use howto_shared::{
    comments_store::{CommentStore, IdentityProvider, TokenSession},
    CommentManager,
};

#[derive(Clone)]
pub struct AppState {
    /// Row store shared by every request
    store: Arc<dyn CommentStore>,
    /// Resolves bearer tokens to principals
    identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(store: Arc<dyn CommentStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            store,
            identity,
        }
    }

    /// Manager scoped to one request's bearer token.
    pub fn comments_for(&self, access_token: Option<String>) -> CommentManager {
        let session = TokenSession::new(self.identity.clone(), access_token);
        CommentManager::new(self.store.clone(), Arc::new(session))
    }
}
