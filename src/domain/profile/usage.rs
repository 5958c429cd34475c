//! API usage accounting.

use crate::domain::foundation::{Timestamp, UserId};

/// Tokens and cost attributed to one metered call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UsageCharge {
    pub tokens_used: u32,
    pub cost_cents: u32,
}

/// Append-only usage log entry. Written, never read back by this service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiUsage {
    pub user_id: UserId,
    pub endpoint: String,
    pub tokens_used: u32,
    pub cost_cents: u32,
    pub created_at: Timestamp,
}

impl ApiUsage {
    pub fn new(user_id: UserId, endpoint: impl Into<String>, charge: UsageCharge) -> Self {
        Self {
            user_id,
            endpoint: endpoint.into(),
            tokens_used: charge.tokens_used,
            cost_cents: charge.cost_cents,
            created_at: Timestamp::now(),
        }
    }
}
