use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use reqwest::{Request, Response};
use std::time::Duration;
use stop_departures::board::build_board;
use stop_departures::classify::DelayStatus;
use stop_departures::coordinator::{PollCoordinator, PollPhase, PollSettings};
use stop_departures::fetch::HttpClient;
use stop_departures::infra::ztm::{DEFAULT_DEPARTURES_URL, ZtmClient};
use stop_departures::output::{BoardAttributes, render_state, render_table, summary};
use stop_departures::parser::parse_payload;

const FIXTURE: &str = include_str!("fixtures/departures.json");

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 5, 7, 7, 0).unwrap()
}

struct Fixture {
    status: u16,
}

#[async_trait]
impl HttpClient for Fixture {
    async fn execute(&self, _req: Request) -> reqwest::Result<Response> {
        let resp = http::Response::builder()
            .status(self.status)
            .body(FIXTURE)
            .unwrap();
        Ok(Response::from(resp))
    }
}

#[test]
fn test_full_pipeline() {
    let payload = parse_payload(FIXTURE.as_bytes()).expect("Failed to parse payload");
    assert_eq!(payload.departures.len(), 6);

    let board = build_board(&payload.departures, now(), 6, Tz::UTC);
    let lines: Vec<&str> = board.departures().iter().map(|d| d.line.as_str()).collect();
    // 112 has left, 199 has an unreadable estimate.
    assert_eq!(lines, vec!["6", "8", "12", "158"]);

    let tram = &board.departures()[0];
    assert_eq!(tram.minutes_until, 1);
    assert_eq!(tram.delay_seconds, 185);
    assert_eq!(tram.status, DelayStatus::Delayed);
    assert!(tram.realtime);

    // Empty estimate falls back to the timetable.
    let stogi = &board.departures()[1];
    assert_eq!(stogi.minutes_until, 4);
    assert_eq!(stogi.status, DelayStatus::OnTime);
    assert!(!stogi.realtime);

    let bus = &board.departures()[3];
    assert_eq!(bus.delay_seconds, -95);
    assert_eq!(bus.status, DelayStatus::Early);
    assert_eq!(bus.minutes_until, 13);
}

#[test]
fn test_rendered_board_in_local_time() {
    let payload = parse_payload(FIXTURE.as_bytes()).unwrap();
    let board = build_board(&payload.departures, now(), 3, Tz::UTC);

    let expected = "\
LINE  HEADSIGN                 TIME   MIN  STATUS
6     Jelitkowo                08:08    1  DELAYED
8     Stogi                    08:11    4  ON_TIME
12    Oliwa                    08:15    8  ON_TIME";
    assert_eq!(render_table(&board, chrono_tz::Europe::Warsaw), expected);
    assert_eq!(summary(&board), "6 → Jelitkowo in 1 min");
}

#[tokio::test]
async fn test_coordinator_over_http() {
    let settings = PollSettings {
        stop_id: "1752".into(),
        max_departures: 2,
        request_timeout: Duration::from_secs(5),
        timezone: chrono_tz::Europe::Warsaw,
    };
    let api = ZtmClient::new(Fixture { status: 200 }, DEFAULT_DEPARTURES_URL).unwrap();
    let coordinator = PollCoordinator::new(api, settings).with_clock(now);

    let board = coordinator.refresh().await.unwrap();
    assert_eq!(board.len(), 2);

    let state = coordinator.snapshot().await;
    assert_eq!(state.phase(), PollPhase::Ready);
    assert_eq!(
        state.upstream_last_update,
        Some(Utc.with_ymd_and_hms(2026, 3, 5, 7, 6, 52).unwrap())
    );

    let attributes = BoardAttributes::new("1752", Some("Brama Oliwska"), &state);
    assert_eq!(attributes.summary, "6 → Jelitkowo in 1 min");
    assert_eq!(attributes.departures.len(), 2);
    assert!(!attributes.stale);
}

#[tokio::test]
async fn test_outage_shows_stale_board() {
    let settings = PollSettings {
        stop_id: "1752".into(),
        max_departures: 6,
        request_timeout: Duration::from_secs(5),
        timezone: Tz::UTC,
    };
    let healthy = PollCoordinator::new(
        ZtmClient::new(Fixture { status: 200 }, DEFAULT_DEPARTURES_URL).unwrap(),
        settings.clone(),
    )
    .with_clock(now);
    healthy.refresh().await.unwrap();
    let good = healthy.snapshot().await;

    let failing = PollCoordinator::new(
        ZtmClient::new(Fixture { status: 500 }, DEFAULT_DEPARTURES_URL).unwrap(),
        settings,
    )
    .with_clock(now);
    assert!(failing.refresh().await.is_err());
    let failed = failing.snapshot().await;
    assert!(render_state(&failed, Tz::UTC).starts_with("Departures unavailable: upstream returned status 500"));

    // A board kept through an outage is labelled, not hidden.
    let stale = stop_departures::coordinator::PollState {
        last_error: failed.last_error.clone(),
        ..good
    };
    let rendered = render_state(&stale, Tz::UTC);
    assert!(rendered.starts_with("Stale since 07:07:00"));
    assert!(rendered.contains("Jelitkowo"));
}
