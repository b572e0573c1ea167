//! Application state.

use std::sync::Arc;

use stellar_store::{CatalogRepo, InMemoryImageStore, InMemoryStore, Store};
use stellar_workflow::{AccountService, CatalogService, WorkflowEngine};
use tracing::{info, warn};

use crate::auth::TokenRegistry;
use crate::config::NodeConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The constellation workflow.
    pub engine: WorkflowEngine,

    /// The planet catalog.
    pub catalog: CatalogService,

    /// Registration and login.
    pub accounts: AccountService,

    /// Live bearer sessions.
    pub tokens: Arc<TokenRegistry>,

    /// Largest accepted request body.
    pub body_limit: usize,
}

impl AppState {
    /// Build in-memory stores from configuration and load the seed data.
    pub async fn from_config(config: &NodeConfig) -> anyhow::Result<Self> {
        let store = InMemoryStore::new();
        if !config.seed.planets.is_empty() {
            let mut tx = store.begin().await?;
            for fields in &config.seed.planets {
                tx.create_planet(fields.clone()).await?;
            }
            tx.commit().await?;
            info!(count = config.seed.planets.len(), "seeded planet catalog");
        }

        let store: Arc<dyn Store> = Arc::new(store);
        let images = Arc::new(InMemoryImageStore::new(&config.storage.image_base_url));

        let accounts = AccountService::new(store.clone());
        for user in &config.seed.users {
            accounts.create_account(user.registration(), user.role).await?;
        }
        if !config.seed.users.iter().any(|user| user.role.can_moderate()) {
            warn!("no moderator seeded; submitted constellations cannot be reviewed");
        }

        let engine = WorkflowEngine::new(store.clone()).with_edit_policy(config.workflow.edit_policy);
        let catalog = CatalogService::new(store, images)
            .with_max_image_bytes(config.storage.max_image_bytes);

        Ok(Self {
            engine,
            catalog,
            accounts,
            tokens: Arc::new(TokenRegistry::default()),
            body_limit: config.storage.max_image_bytes,
        })
    }
}
