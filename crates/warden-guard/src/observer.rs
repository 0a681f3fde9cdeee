//! Observation hooks for permitted redirects
//!
//! The shop's challenge tracker wants to know when certain redirects happen.
//! It is told after the decision is made and has no way to change it.

use crate::redirect_guard::{Allowlist, PermittedRedirect};
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// Cryptocurrency address pages that count as the "crypto redirect" decoys
pub const CRYPTO_DECOY_URLS: [&str; 3] = [
    "https://explorer.dash.org/address/Xr556RzuwX6hg5EGpkybbv5RanJoZN17kW",
    "https://blockchain.info/address/1AbKfgvw9psQ41NbLi8kufDQTezwG8DRZm",
    "https://etherscan.io/address/0x0f933ab9fcaaa782d0279c300d73750e1311eae6",
];

/// Challenges a permitted redirect can solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Challenge {
    /// Redirected to one of [`CRYPTO_DECOY_URLS`]
    RedirectCryptoCurrency,
    /// Redirected somewhere no allowlist entry is a prefix of
    Redirect,
}

impl Challenge {
    pub const fn key(self) -> &'static str {
        match self {
            Self::RedirectCryptoCurrency => "redirectCryptoCurrencyChallenge",
            Self::Redirect => "redirectChallenge",
        }
    }
}

/// What a permitted redirect looked like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedirectReport<'a> {
    pub target: &'a str,
    pub crypto_decoy: bool,
    pub outside_allowlist: bool,
}

impl<'a> RedirectReport<'a> {
    pub fn new(permitted: &'a PermittedRedirect, allowlist: &Allowlist) -> Self {
        let target = permitted.target();
        Self {
            target,
            crypto_decoy: CRYPTO_DECOY_URLS.iter().any(|decoy| *decoy == target),
            outside_allowlist: allowlist.is_outside(target),
        }
    }

    /// Challenges this redirect solves
    pub fn solved(&self) -> impl Iterator<Item = Challenge> {
        [
            (self.crypto_decoy, Challenge::RedirectCryptoCurrency),
            (self.outside_allowlist, Challenge::Redirect),
        ]
        .into_iter()
        .filter_map(|(hit, challenge)| hit.then_some(challenge))
    }
}

/// Receives a report for every permitted redirect
pub trait RedirectObserver: Send + Sync {
    fn on_permitted(&self, report: &RedirectReport<'_>);
}

/// Ignores every report
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RedirectObserver for NoopObserver {
    fn on_permitted(&self, _report: &RedirectReport<'_>) {}
}

/// Records solved challenges, logging each one the first time it is solved
#[derive(Debug, Default)]
pub struct ChallengeTracker {
    solved: Mutex<HashSet<Challenge>>,
}

impl ChallengeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_solved(&self, challenge: Challenge) -> bool {
        self.solved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&challenge)
    }

    pub fn solved_count(&self) -> usize {
        self.solved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl RedirectObserver for ChallengeTracker {
    fn on_permitted(&self, report: &RedirectReport<'_>) {
        let mut solved = self.solved.lock().unwrap_or_else(PoisonError::into_inner);
        for challenge in report.solved() {
            if solved.insert(challenge) {
                info!(challenge = challenge.key(), redirect_target = %report.target, "Challenge solved");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redirect_guard::validate_redirect;

    fn allowlist() -> Allowlist {
        Allowlist::new(CRYPTO_DECOY_URLS)
    }

    #[test]
    fn test_decoy_url_reports_crypto_but_not_unintended() {
        let allowlist = allowlist();
        let permitted = validate_redirect(CRYPTO_DECOY_URLS[1], &allowlist).unwrap();
        let report = RedirectReport::new(&permitted, &allowlist);

        assert!(report.crypto_decoy);
        assert!(!report.outside_allowlist);
        assert_eq!(
            report.solved().collect::<Vec<_>>(),
            vec![Challenge::RedirectCryptoCurrency]
        );
    }

    #[test]
    fn test_same_origin_non_prefix_is_unintended() {
        let allowlist = allowlist();
        let permitted = validate_redirect("https://etherscan.io/token/other", &allowlist).unwrap();
        let report = RedirectReport::new(&permitted, &allowlist);

        assert!(!report.crypto_decoy);
        assert!(report.outside_allowlist);
    }

    #[test]
    fn test_tracker_records_each_challenge_once() {
        let allowlist = allowlist();
        let tracker = ChallengeTracker::new();
        let permitted = validate_redirect(CRYPTO_DECOY_URLS[0], &allowlist).unwrap();

        tracker.on_permitted(&RedirectReport::new(&permitted, &allowlist));
        tracker.on_permitted(&RedirectReport::new(&permitted, &allowlist));

        assert!(tracker.is_solved(Challenge::RedirectCryptoCurrency));
        assert!(!tracker.is_solved(Challenge::Redirect));
        assert_eq!(tracker.solved_count(), 1);
    }

    #[test]
    fn test_challenge_keys() {
        assert_eq!(Challenge::Redirect.key(), "redirectChallenge");
        assert_eq!(
            Challenge::RedirectCryptoCurrency.key(),
            "redirectCryptoCurrencyChallenge"
        );
    }
}
