//! Domain services (business logic)

pub mod auth_service;
pub mod authorization;
pub mod csv_export;
pub mod csv_import;
pub mod lead_service;
pub mod user_service;

pub use auth_service::{AuthService, LoginInput, LoginResult, RegisterInput};
pub use authorization::{LeadAction, LeadAuthorization};
pub use csv_export::render_leads_csv;
pub use csv_import::{CsvImportService, CsvPreview, CsvRow, StagedUpload};
pub use lead_service::LeadService;
pub use user_service::UserService;
