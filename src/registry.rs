//! Static classification of upstream providers into priority tiers.
//!
//! The registry is fixed at compile time and has no state of its own:
//! it supplies the candidate pool in priority order, while eligibility
//! is decided by the cooldown tracker.

use crate::types::{Provider, Tier};

/// Primary tier: tried first on every attempt.
pub const PRIMARY: &[Provider] = &[Provider::LinkedIn, Provider::Indeed, Provider::Google];

/// Secondary tier: consulted when the primary tier cannot fill the
/// requested breadth.
pub const SECONDARY: &[Provider] = &[
    Provider::ZipRecruiter,
    Provider::Glassdoor,
    Provider::Naukri,
];

/// Backup tier: last resort.
pub const BACKUP: &[Provider] = &[Provider::Bayt, Provider::Bdjobs];

/// All tiers with their providers, in selection priority order.
pub fn tiers_in_priority_order() -> &'static [(Tier, &'static [Provider])] {
    &[
        (Tier::Primary, PRIMARY),
        (Tier::Secondary, SECONDARY),
        (Tier::Backup, BACKUP),
    ]
}
