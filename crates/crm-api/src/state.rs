use std::sync::Arc;

use tracing::warn;

use crm_core::repositories::{LeadRepository, UserRepository};
use crm_core::services::{AuthService, CsvImportService, LeadAuthorization, LeadService, UserService};
use crm_security::JwtService;
use crm_shared::config::AppConfig;

/// Signing key for development setups that leave `jwt.secret` empty.
const DEVELOPMENT_JWT_SECRET: &str = "crm-development-secret-do-not-deploy";

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub leads: Arc<LeadService>,
    pub users: Arc<UserService>,
    pub csv_import: Arc<CsvImportService>,
}

impl AppState {
    pub fn new(config: &AppConfig, users: Arc<dyn UserRepository>, leads: Arc<dyn LeadRepository>) -> Self {
        let secret = if config.jwt.secret.is_empty() {
            warn!("jwt.secret is not set; using the development signing key");
            DEVELOPMENT_JWT_SECRET
        } else {
            config.jwt.secret.as_str()
        };
        let jwt = JwtService::new(secret, config.jwt.access_token_expiry);
        let authz = LeadAuthorization::new(config.access);

        Self {
            auth: Arc::new(AuthService::new(users.clone(), jwt)),
            leads: Arc::new(LeadService::new(leads, users.clone(), authz)),
            users: Arc::new(UserService::new(users, authz)),
            csv_import: Arc::new(CsvImportService::new(&config.upload)),
        }
    }
}
