//! Text and JSON renderings of departure boards for the display layer.

use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::board::DepartureBoard;
use crate::coordinator::PollState;
use crate::normalize::Departure;

/// Shown when a fetch succeeded but no departures are upcoming.
pub const NO_DEPARTURES: &str = "No departures";

/// Minimum LINE column width; longer labels widen the column instead of being cut.
pub const LINE_WIDTH: usize = 5;
pub const HEADSIGN_WIDTH: usize = 24;
pub const TIME_WIDTH: usize = 5;
pub const MINUTES_WIDTH: usize = 4;

/// Renders the board as a fixed-width table.
///
/// ```text
/// LINE  HEADSIGN                 TIME   MIN  STATUS
/// 12    Oliwa PKP                08:05    3  DELAYED
/// ```
///
/// Times are local to `tz`. An empty board renders as [`NO_DEPARTURES`].
/// Only the headsign is truncated.
pub fn render_table(board: &DepartureBoard, tz: Tz) -> String {
    if board.is_empty() {
        return NO_DEPARTURES.to_string();
    }

    let line_width = line_column_width(board);
    let mut out = row(line_width, "LINE", "HEADSIGN", "TIME", "MIN", "STATUS");
    for departure in board.departures() {
        let time = departure.estimated.with_timezone(&tz).format("%H:%M").to_string();
        out.push('\n');
        out.push_str(&row(
            line_width,
            &departure.line,
            &fit(&departure.headsign, HEADSIGN_WIDTH),
            &time,
            &departure.minutes_until.to_string(),
            departure.status.as_str(),
        ));
    }
    out
}

/// One-line state of the next departure, e.g. `12 → Oliwa PKP in 3 min`.
pub fn summary(board: &DepartureBoard) -> String {
    match board.first() {
        Some(d) if d.headsign.is_empty() => format!("{} in {} min", d.line, d.minutes_until),
        Some(d) => format!("{} → {} in {} min", d.line, d.headsign, d.minutes_until),
        None => NO_DEPARTURES.to_string(),
    }
}

/// Renders whatever the coordinator currently holds.
///
/// A board kept through a failed fetch is labelled stale; with no board at all
/// the error is shown instead of the empty-board sentinel.
pub fn render_state(state: &PollState, tz: Tz) -> String {
    match (&state.last_good_board, &state.last_error) {
        (Some(board), None) => render_table(board, tz),
        (Some(board), Some(err)) => {
            let since = state
                .last_success
                .map(|t| t.with_timezone(&tz).format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "?".to_string());
            format!("Stale since {since} ({err})\n{}", render_table(board, tz))
        }
        (None, Some(err)) => format!("Departures unavailable: {err}"),
        (None, None) => "Waiting for first update".to_string(),
    }
}

/// Read-only attributes published for one stop.
#[derive(Debug, Serialize)]
pub struct BoardAttributes<'a> {
    pub stop_id: &'a str,
    pub stop_name: Option<&'a str>,
    pub summary: String,
    pub last_success: Option<DateTime<Utc>>,
    pub upstream_last_update: Option<DateTime<Utc>>,
    pub stale: bool,
    pub last_error: Option<String>,
    pub departures: &'a [Departure],
}

impl<'a> BoardAttributes<'a> {
    pub fn new(stop_id: &'a str, stop_name: Option<&'a str>, state: &'a PollState) -> Self {
        let board = state.last_good_board.as_deref();
        Self {
            stop_id,
            stop_name,
            summary: match (board, &state.last_error) {
                (Some(board), _) => summary(board),
                (None, Some(err)) => format!("Departures unavailable: {err}"),
                (None, None) => "Waiting for first update".to_string(),
            },
            last_success: state.last_success,
            upstream_last_update: state.upstream_last_update,
            stale: state.is_stale(),
            last_error: state.last_error.as_ref().map(|e| e.to_string()),
            departures: board.map(DepartureBoard::departures).unwrap_or(&[]),
        }
    }
}

/// Serializes attributes as pretty-printed JSON.
pub fn attributes_json(attributes: &BoardAttributes<'_>) -> Result<String> {
    Ok(serde_json::to_string_pretty(attributes)?)
}

/// Width of the LINE column for `board`, in characters.
pub fn line_column_width(board: &DepartureBoard) -> usize {
    board
        .departures()
        .iter()
        .map(|d| d.line.chars().count())
        .max()
        .unwrap_or(0)
        .max(LINE_WIDTH)
}

fn row(lw: usize, line: &str, headsign: &str, time: &str, minutes: &str, status: &str) -> String {
    format!(
        "{line:<lw$} {headsign:<hw$} {time:<tw$} {minutes:>mw$}  {status}",
        hw = HEADSIGN_WIDTH,
        tw = TIME_WIDTH,
        mw = MINUTES_WIDTH,
    )
}

/// Cuts `text` to `width` characters, marking the cut with an ellipsis.
fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
