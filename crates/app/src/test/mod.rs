//! Shared helpers for service tests.

use std::sync::Arc;

use jiff::{civil::date, tz::TimeZone};
use larder::fixtures::{Fixture, FixtureError};

use crate::clock::FixedClock;

/// The default fixture set shipped with the core crate.
pub fn fixture_set() -> Result<Fixture, FixtureError> {
    Fixture::from_set_in(
        concat!(env!("CARGO_MANIFEST_DIR"), "/../core/fixtures"),
        "default",
    )
}

pub fn fixture() -> Result<Arc<Fixture>, FixtureError> {
    fixture_set().map(Arc::new)
}

/// A clock stopped at 09:00 UTC on Wednesday 14 October 2026.
pub fn fixed_clock() -> Result<FixedClock, jiff::Error> {
    let at = date(2026, 10, 14).at(9, 0, 0, 0).to_zoned(TimeZone::UTC)?;

    Ok(FixedClock::new(at))
}
