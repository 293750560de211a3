//! Test-only helpers for building verifiers over a stub client.

use metrc::test_support::StubMetrc;

use crate::clock::FixedClock;
use crate::config::EvalConfig;
use crate::verify::Verifier;

pub const LICENSE: &str = "C12-1000006-LIC";

/// Default config pointed at a local base URL so no row references the sandbox.
pub fn test_config() -> EvalConfig {
    EvalConfig {
        base_url: "http://metrc.test".to_string(),
        ..EvalConfig::default()
    }
}

/// Verifier with [`test_config`] and names stamped `2021.01.01 12:00:00`.
pub fn verifier(stub: &StubMetrc) -> Verifier<'_, StubMetrc, FixedClock> {
    Verifier::new(stub, test_config(), FixedClock::new_year_noon())
}
