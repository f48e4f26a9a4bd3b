// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power-to-energy integration.
//!
//! Energy between two samples is accrued with the power that was held at the
//! start of the interval (left-rectangle rule). When power rises between
//! polls the total lags the true value, when it falls the total runs ahead.
//! Controllers that sample frequently keep this error small.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::state::ChannelState;
use crate::types::ChannelSample;

const WATTS_PER_KILOWATT: f64 = 1000.0;
const SECONDS_PER_HOUR: f64 = 3600.0;

/// Folds a new power sample into a channel's state.
///
/// The first sample for a channel starts the series at 0 kWh. Later samples
/// add `prior.power_watts` held for the elapsed time. A clock that steps
/// backwards yields zero elapsed time rather than negative energy.
///
/// # Examples
///
/// ```
/// use chrono::{TimeDelta, Utc};
/// use niko_energy::energy::integrate;
/// use niko_energy::types::ChannelSample;
///
/// let t0 = Utc::now();
/// let first = integrate(None, &ChannelSample::new(1, 500.0), t0);
/// assert_eq!(first.energy_kwh, 0.0);
///
/// let next = integrate(
///     Some(&first),
///     &ChannelSample::new(1, 1000.0),
///     t0 + TimeDelta::hours(1),
/// );
/// assert!((next.energy_kwh - 0.5).abs() < 1e-9);
/// assert_eq!(next.power_watts, 1000.0);
/// ```
#[must_use]
pub fn integrate(
    prior: Option<&ChannelState>,
    sample: &ChannelSample,
    now: DateTime<Utc>,
) -> ChannelState {
    let energy_kwh = match prior {
        Some(prior) => prior.energy_kwh + accrued_kwh(prior, now),
        None => 0.0,
    };

    ChannelState {
        power_watts: sample.watts,
        energy_kwh,
        last_sample_at: Some(now),
    }
}

/// Energy accrued by `prior` from its last sample up to `now`.
fn accrued_kwh(prior: &ChannelState, now: DateTime<Utc>) -> f64 {
    let Some(since) = prior.last_sample_at else {
        return 0.0;
    };

    // Negative deltas fail the conversion.
    let elapsed = (now - since).to_std().unwrap_or(Duration::ZERO);

    (prior.power_watts / WATTS_PER_KILOWATT) * (elapsed.as_secs_f64() / SECONDS_PER_HOUR)
}
