use std::env;

/// Runtime configuration, resolved once at startup. Every variable has
/// a workable default so a bare `cargo run` comes up.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub table_name: String,
    pub dynamodb_endpoint: Option<String>,
    pub storage: StorageKind,
}

/// Which store implementation to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    DynamoDb,
    Memory,
}

impl Config {
    pub fn from_env() -> Self {
        let storage = match env::var("STORAGE").as_deref() {
            Ok("memory") => StorageKind::Memory,
            _ => StorageKind::DynamoDb,
        };

        Config {
            port: env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3000),
            table_name: env::var("TABLE_NAME").unwrap_or_else(|_| "tasks".to_string()),
            dynamodb_endpoint: env::var("DYNAMODB_ENDPOINT").ok(),
            storage,
        }
    }
}
