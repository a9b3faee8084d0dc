//! Building the size-limited departure list shown for a stop.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::debug;

use crate::normalize::{Departure, normalize};
use crate::raw::RawDeparture;

/// Upcoming departures in estimated order. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartureBoard {
    departures: Vec<Departure>,
    built_at: DateTime<Utc>,
}

impl DepartureBoard {
    pub fn departures(&self) -> &[Departure] {
        &self.departures
    }

    pub fn first(&self) -> Option<&Departure> {
        self.departures.first()
    }

    pub fn len(&self) -> usize {
        self.departures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.departures.is_empty()
    }

    /// The reference instant the board was normalized against.
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }
}

/// Normalizes a raw batch into a board of at most `max_departures` entries.
///
/// Records that fail to normalize are skipped. Entries sharing an estimated
/// instant keep their batch order.
pub fn build_board(
    raw_batch: &[RawDeparture],
    now: DateTime<Utc>,
    max_departures: usize,
    tz: Tz,
) -> DepartureBoard {
    let mut departures: Vec<Departure> = raw_batch
        .iter()
        .filter_map(|raw| normalize(raw, now, tz))
        .collect();

    let dropped = raw_batch.len() - departures.len();
    departures.sort_by_key(|d| d.estimated);
    departures.truncate(max_departures);

    debug!(
        received = raw_batch.len(),
        dropped,
        kept = departures.len(),
        "Board built"
    );

    DepartureBoard {
        departures,
        built_at: now,
    }
}
