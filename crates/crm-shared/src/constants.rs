//! Application-wide constants

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const DEFAULT_ACCESS_TOKEN_EXPIRY: i64 = 86_400;
pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_PASSWORD_LENGTH: usize = 128;

pub const EXPORT_FILENAME: &str = "leads_export.csv";
pub const EXPORT_HEADER: [&str; 8] = [
    "Name",
    "Email",
    "Phone",
    "Company",
    "Status",
    "Priority",
    "Assigned To",
    "Created At",
];

pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_UPLOAD_MAX_BYTES: u64 = 10 * 1024 * 1024;
