//! Per-provider cooldown tracking for rotation and penalty windows.
//!
//! Tracks when each provider was last dispatched and any penalty window
//! imposed after a rate-limit signal, and answers "which providers are
//! eligible right now" in tier priority order. Internally synchronised:
//! selection and bookkeeping are atomic with respect to concurrent
//! readers.
//!
//! A provider is *eligible* when its idle time exceeds the cooldown
//! window and any penalty has expired. Unknown providers are eligible
//! by default (treated as never used).

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::registry;
use crate::types::Provider;

/// Cooldown bookkeeping for a single provider.
#[derive(Debug, Clone, Copy, Default)]
struct CooldownState {
    /// When this provider was last selected for a fetch.
    last_used_at: Option<Instant>,
    /// Extended block imposed after a rate-limit failure.
    penalty_until: Option<Instant>,
}

/// Tracks cooldown state for every provider that has been dispatched.
///
/// States are created lazily on first use. All methods take an explicit
/// `now` so callers (and tests) control the clock.
#[derive(Debug)]
pub struct CooldownTracker {
    cooldown: Duration,
    states: Mutex<HashMap<Provider, CooldownState>>,
}

impl CooldownTracker {
    /// Create a tracker with the given base cooldown window.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Whether the provider may be dispatched at `now`.
    pub fn is_eligible(&self, provider: Provider, now: Instant) -> bool {
        let states = self.lock();
        self.eligible(states.get(&provider), now)
    }

    /// Record that the provider was selected for a fetch at `now`.
    pub fn mark_used(&self, provider: Provider, now: Instant) {
        let mut states = self.lock();
        states.entry(provider).or_default().last_used_at = Some(now);
    }

    /// Block the provider until `until`, after a rate-limit failure.
    ///
    /// Monotonic: a later-expiring penalty overwrites an earlier one,
    /// but an earlier one never shortens an existing later penalty.
    pub fn apply_penalty(&self, provider: Provider, until: Instant) {
        let mut states = self.lock();
        let state = states.entry(provider).or_default();
        state.penalty_until = Some(state.penalty_until.map_or(until, |p| p.max(until)));
    }

    /// Eligible providers at `now`, walking tiers in priority order and
    /// stopping at `max_count`.
    ///
    /// If *zero* providers are eligible across all tiers, returns the
    /// primary tier regardless of cooldown — redundant upstream calls
    /// during a cooldown storm beat blocking forever.
    pub fn available_providers(&self, max_count: usize, now: Instant) -> Vec<Provider> {
        let states = self.lock();
        self.collect_eligible(&states, max_count, now)
    }

    /// Select providers for an aggregation attempt and mark them used,
    /// under a single lock so a concurrent request cannot re-select the
    /// same just-dispatched providers.
    pub fn select_for_attempt(&self, max_count: usize, now: Instant) -> Vec<Provider> {
        let mut states = self.lock();
        let selected = self.collect_eligible(&states, max_count, now);
        for provider in &selected {
            states.entry(*provider).or_default().last_used_at = Some(now);
        }
        selected
    }

    /// Seconds-until-eligible for every tracked provider that is still
    /// cooling down or penalised at `now`.
    pub fn remaining(&self, now: Instant) -> Vec<(Provider, Duration)> {
        let states = self.lock();
        let mut out: Vec<(Provider, Duration)> = states
            .iter()
            .filter_map(|(provider, state)| {
                let wait = self.time_until_eligible(state, now);
                (!wait.is_zero()).then_some((*provider, wait))
            })
            .collect();
        out.sort_by_key(|(provider, _)| *provider);
        out
    }

    /// Forget all cooldown and penalty state.
    pub fn reset(&self) {
        self.lock().clear();
    }

    fn eligible(&self, state: Option<&CooldownState>, now: Instant) -> bool {
        let Some(state) = state else {
            return true;
        };
        let cooled = state
            .last_used_at
            .is_none_or(|t| now.saturating_duration_since(t) > self.cooldown);
        let unpenalised = state.penalty_until.is_none_or(|p| now >= p);
        cooled && unpenalised
    }

    fn time_until_eligible(&self, state: &CooldownState, now: Instant) -> Duration {
        let cooldown_end = state.last_used_at.map(|t| t + self.cooldown);
        cooldown_end
            .into_iter()
            .chain(state.penalty_until)
            .map(|end| end.saturating_duration_since(now))
            .max()
            .unwrap_or(Duration::ZERO)
    }

    fn collect_eligible(
        &self,
        states: &HashMap<Provider, CooldownState>,
        max_count: usize,
        now: Instant,
    ) -> Vec<Provider> {
        let mut selected = Vec::new();
        for (_tier, providers) in registry::tiers_in_priority_order() {
            for provider in *providers {
                if self.eligible(states.get(provider), now) {
                    selected.push(*provider);
                    if selected.len() >= max_count {
                        return selected;
                    }
                }
            }
        }
        if selected.is_empty() {
            // Escape valve: never block forever.
            return registry::PRIMARY.iter().copied().take(max_count).collect();
        }
        selected
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Provider, CooldownState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: Duration = Duration::from_secs(60);

    fn make_tracker() -> CooldownTracker {
        CooldownTracker::new(COOLDOWN)
    }

    #[test]
    fn unknown_provider_is_eligible() {
        let tracker = make_tracker();
        let now = Instant::now();
        for p in Provider::all() {
            assert!(tracker.is_eligible(*p, now));
        }
    }

    #[test]
    fn used_provider_ineligible_within_cooldown() {
        let tracker = make_tracker();
        let base = Instant::now();
        tracker.mark_used(Provider::Indeed, base);
        assert!(!tracker.is_eligible(Provider::Indeed, base));
        // Boundary: exactly the cooldown window is still too soon.
        assert!(!tracker.is_eligible(Provider::Indeed, base + COOLDOWN));
        assert!(tracker.is_eligible(Provider::Indeed, base + COOLDOWN + Duration::from_secs(1)));
    }

    #[test]
    fn eligibility_monotonic_in_time() {
        let tracker = make_tracker();
        let base = Instant::now();
        tracker.mark_used(Provider::LinkedIn, base);
        let recovery = base + COOLDOWN + Duration::from_secs(1);
        assert!(tracker.is_eligible(Provider::LinkedIn, recovery));
        // Once eligible, stays eligible at any later time absent new use.
        for extra in [1u64, 60, 3600, 86_400] {
            assert!(tracker.is_eligible(
                Provider::LinkedIn,
                recovery + Duration::from_secs(extra)
            ));
        }
    }

    #[test]
    fn penalty_blocks_after_cooldown_elapsed() {
        let tracker = make_tracker();
        let base = Instant::now();
        tracker.mark_used(Provider::Google, base);
        tracker.apply_penalty(Provider::Google, base + Duration::from_secs(300));
        // Base cooldown elapsed, penalty still in force.
        let after_cooldown = base + Duration::from_secs(120);
        assert!(!tracker.is_eligible(Provider::Google, after_cooldown));
        // Penalty expiry restores eligibility.
        assert!(tracker.is_eligible(Provider::Google, base + Duration::from_secs(301)));
    }

    #[test]
    fn penalty_is_monotonic() {
        let tracker = make_tracker();
        let base = Instant::now();
        let late = base + Duration::from_secs(300);
        let early = base + Duration::from_secs(100);

        tracker.apply_penalty(Provider::Bayt, late);
        tracker.apply_penalty(Provider::Bayt, early);
        assert!(!tracker.is_eligible(Provider::Bayt, base + Duration::from_secs(200)));

        // A later penalty does extend.
        tracker.apply_penalty(Provider::Bayt, base + Duration::from_secs(400));
        assert!(!tracker.is_eligible(Provider::Bayt, base + Duration::from_secs(350)));
        assert!(tracker.is_eligible(Provider::Bayt, base + Duration::from_secs(400)));
    }

    #[test]
    fn available_walks_tiers_in_priority_order() {
        let tracker = make_tracker();
        let now = Instant::now();
        let selected = tracker.available_providers(3, now);
        assert_eq!(
            selected,
            vec![Provider::LinkedIn, Provider::Indeed, Provider::Google]
        );
    }

    #[test]
    fn secondary_fills_when_primary_cooling() {
        let tracker = make_tracker();
        let base = Instant::now();
        for p in registry::PRIMARY {
            tracker.mark_used(*p, base);
        }
        let selected = tracker.available_providers(2, base + Duration::from_secs(1));
        assert_eq!(selected, vec![Provider::ZipRecruiter, Provider::Glassdoor]);
    }

    #[test]
    fn returns_fewer_when_not_enough_eligible() {
        let tracker = make_tracker();
        let base = Instant::now();
        for p in Provider::all() {
            if *p != Provider::Bdjobs {
                tracker.mark_used(*p, base);
            }
        }
        let selected = tracker.available_providers(5, base + Duration::from_secs(1));
        assert_eq!(selected, vec![Provider::Bdjobs]);
    }

    #[test]
    fn escape_valve_returns_primary_when_nothing_eligible() {
        let tracker = make_tracker();
        let base = Instant::now();
        for p in Provider::all() {
            tracker.mark_used(*p, base);
        }
        let now = base + Duration::from_secs(1);
        let selected = tracker.available_providers(5, now);
        assert_eq!(selected.len(), registry::PRIMARY.len());
        assert_eq!(selected, registry::PRIMARY.to_vec());

        // Capped by max_count.
        let capped = tracker.available_providers(2, now);
        assert_eq!(capped, vec![Provider::LinkedIn, Provider::Indeed]);
    }

    #[test]
    fn select_for_attempt_marks_selected_used() {
        let tracker = make_tracker();
        let now = Instant::now();
        let first = tracker.select_for_attempt(3, now);
        assert_eq!(first.len(), 3);
        // The same instant again: the first three are now cooling down.
        let second = tracker.select_for_attempt(3, now);
        assert_eq!(
            second,
            vec![Provider::ZipRecruiter, Provider::Glassdoor, Provider::Naukri]
        );
    }

    #[test]
    fn remaining_reports_cooling_providers_only() {
        let tracker = make_tracker();
        let base = Instant::now();
        tracker.mark_used(Provider::Indeed, base);
        tracker.apply_penalty(Provider::Naukri, base + Duration::from_secs(300));

        let remaining = tracker.remaining(base);
        assert_eq!(remaining.len(), 2);
        let indeed = remaining
            .iter()
            .find(|(p, _)| *p == Provider::Indeed)
            .expect("indeed tracked");
        assert_eq!(indeed.1, COOLDOWN);
        let naukri = remaining
            .iter()
            .find(|(p, _)| *p == Provider::Naukri)
            .expect("naukri tracked");
        assert_eq!(naukri.1, Duration::from_secs(300));

        // Fully recovered providers drop out of the report.
        let later = tracker.remaining(base + Duration::from_secs(400));
        assert!(later.is_empty());
    }

    #[test]
    fn penalty_dominates_cooldown_in_remaining() {
        let tracker = make_tracker();
        let base = Instant::now();
        tracker.mark_used(Provider::Google, base);
        tracker.apply_penalty(Provider::Google, base + Duration::from_secs(300));
        let remaining = tracker.remaining(base);
        assert_eq!(remaining, vec![(Provider::Google, Duration::from_secs(300))]);
    }

    #[test]
    fn reset_restores_full_eligibility() {
        let tracker = make_tracker();
        let base = Instant::now();
        for p in Provider::all() {
            tracker.mark_used(*p, base);
        }
        tracker.apply_penalty(Provider::LinkedIn, base + Duration::from_secs(300));
        tracker.reset();

        assert!(tracker.remaining(base).is_empty());
        for p in Provider::all() {
            assert!(tracker.is_eligible(*p, base));
        }
    }
}
