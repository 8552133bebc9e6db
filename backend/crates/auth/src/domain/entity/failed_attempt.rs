use chrono::{DateTime, Utc};

use crate::domain::value_object::{LookupKey, Role};

/// One failed login, appended to the attempt ledger
#[derive(Debug, Clone)]
pub struct FailedAttempt {
    pub role: Role,
    pub lookup_key: LookupKey,
    pub attempted_at: DateTime<Utc>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
}
