//! Zone verification state machine
//!
//! Pure transition logic, applied by the orchestrator and persisted by
//! the zone store. Transitions are monotonic: once a zone is active,
//! later observations (including transient NXDOMAIN answers from a racing
//! poll) can never regress it.

use crate::db::models::ZoneStatus;
use crate::dns::NsLookup;

/// Result of applying one nameserver observation to a zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneTransition {
    pub status: ZoneStatus,
    pub attempts: i32,
    /// True exactly when this observation moved the zone to active
    pub newly_activated: bool,
    /// Nameservers seen in the answer, empty on NXDOMAIN
    pub nameservers_seen: Vec<String>,
}

/// Apply one NS observation to the current zone state.
///
/// `max_attempts` is the give-up threshold (policy, from configuration);
/// reaching it on an NXDOMAIN answer marks the zone failed.
pub fn advance(
    current: ZoneStatus,
    attempts: i32,
    observation: &NsLookup,
    provider_suffix: &str,
    max_attempts: i32,
) -> ZoneTransition {
    // Terminal states do not move on observations
    if current == ZoneStatus::Active || current == ZoneStatus::Failed {
        let seen = match observation {
            NsLookup::Nameservers(ns) => ns.clone(),
            NsLookup::NotFound => Vec::new(),
        };
        return ZoneTransition {
            status: current,
            attempts,
            newly_activated: false,
            nameservers_seen: seen,
        };
    }

    let attempts = attempts.saturating_add(1);

    match observation {
        NsLookup::NotFound => {
            let status = if attempts >= max_attempts {
                ZoneStatus::Failed
            } else {
                ZoneStatus::Verifying
            };
            ZoneTransition {
                status,
                attempts,
                newly_activated: false,
                nameservers_seen: Vec::new(),
            }
        }
        NsLookup::Nameservers(nameservers) => {
            let delegated = nameservers
                .iter()
                .any(|ns| ns.to_lowercase().contains(provider_suffix));

            let (status, newly_activated) = if delegated {
                (ZoneStatus::Active, true)
            } else {
                // Answering, but still pointing at the old registrar
                (ZoneStatus::Verifying, false)
            };

            ZoneTransition {
                status,
                attempts,
                newly_activated,
                nameservers_seen: nameservers.clone(),
            }
        }
    }
}
