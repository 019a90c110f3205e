pub mod config;
pub mod console;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use config::{SessionSettings, Settings};
use dashmap::DashMap;
use models::user::OperatorSession;
use secrecy::Secret;
use services::{auth_client::AuthClient, PayablesApi, PayablesClient};
use std::sync::Arc;

/// Builds the collaborator client for a freshly authenticated operator.
pub type ApiFactory = Arc<dyn Fn(Secret<String>) -> Arc<dyn PayablesApi> + Send + Sync>;

/// Shared application state: the login client and one console per
/// operator session, keyed by the id stored in the session cookie.
#[derive(Clone)]
pub struct AppState {
    pub auth_client: Arc<AuthClient>,
    pub consoles: Arc<DashMap<String, OperatorSession>>,
    pub api_factory: ApiFactory,
    pub session: SessionSettings,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        let collaborator = settings.collaborator.clone();
        let api_factory: ApiFactory = Arc::new(move |token| {
            Arc::new(PayablesClient::new(collaborator.clone(), token)) as Arc<dyn PayablesApi>
        });

        Self::with_api_factory(
            Arc::new(AuthClient::new(settings.collaborator.clone())),
            api_factory,
            settings.session.clone(),
        )
    }

    pub fn with_api_factory(
        auth_client: Arc<AuthClient>,
        api_factory: ApiFactory,
        session: SessionSettings,
    ) -> Self {
        Self {
            auth_client,
            consoles: Arc::new(DashMap::new()),
            api_factory,
            session,
        }
    }
}
