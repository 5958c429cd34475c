//! Profile module - the per-user record kept alongside the auth provider's user.
//!
//! A profile is keyed by the user's id and carries the subscription tier plus
//! the API usage counters that drive quota checks.

mod profile;
mod tier;
mod usage;

pub use profile::{ProfileUpdate, UserProfile, MAX_AVATAR_URL_LEN, MAX_FULL_NAME_LEN};
pub use tier::SubscriptionTier;
pub use usage::{ApiUsage, UsageCharge};
