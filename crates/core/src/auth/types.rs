use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Credentials carried by an incoming indexer request
#[derive(Debug, Clone, Default)]
pub struct AuthRequest {
    /// Lowercased header names.
    pub headers: HashMap<String, String>,
    /// The `apikey` query parameter, as sent by Torznab callers.
    pub query_api_key: Option<String>,
}

/// Authenticated identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub method: String,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self {
            user_id: "anonymous".to_string(),
            method: "none".to_string(),
        }
    }
}
