//! Stop and ETA fetching for one route
//!
//! A board fetch loads the route's stop sequence, then each stop's metadata
//! and predictions in order. A stop that fails to load is left out rather
//! than failing the whole board.

use chrono::{DateTime, Local};

use busboard::i18n::Language;
use busboard::transit::{stop_etas, Route, RouteBoard, StopEta};

use crate::error::Result;
use crate::providers::TransitProvider;

/// Fetch every stop of `route` with its current ETAs
///
/// `on_stop` is called with the stop's position in the route sequence as
/// soon as that stop is ready. `now` supplies the clock the ETAs are
/// measured against.
pub fn fetch_board<P, N, F>(
    provider: &P,
    route: &Route,
    lang: Language,
    now: N,
    mut on_stop: F,
) -> Result<RouteBoard>
where
    P: TransitProvider + ?Sized,
    N: Fn() -> DateTime<Local>,
    F: FnMut(usize, &StopEta),
{
    let route_stops = provider.fetch_route_stops(route)?;
    log::debug!("Route {} has {} stops", route.key(), route_stops.len());

    let mut stops = Vec::with_capacity(route_stops.len());
    let mut failed = 0;

    for (index, rs) in route_stops.iter().enumerate() {
        let info = match provider.fetch_stop(&rs.stop) {
            Ok(info) => info,
            Err(e) => {
                log::warn!("Stop {} (seq {}) unavailable: {e}", rs.stop, rs.seq);
                failed += 1;
                continue;
            }
        };

        let entries = match provider.fetch_etas(&rs.stop, route) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("ETA for stop {} (seq {}) unavailable: {e}", rs.stop, rs.seq);
                failed += 1;
                continue;
            }
        };

        let stop = StopEta {
            eta: stop_etas(&entries, rs.seq, route.bound, &now(), lang),
            info,
            seq: rs.seq,
        };
        log::debug!("Stop {} ready with {} ETAs", stop.info.stop, stop.eta.len());

        on_stop(index, &stop);
        stops.push(stop);
    }

    Ok(RouteBoard {
        route: route.clone(),
        stops,
        fetched_at: now(),
        failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::mock::MockProvider;
    use crate::error::AppError;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Local> {
        Local.timestamp_opt(1_709_265_600, 0).unwrap()
    }

    #[test]
    fn test_fetch_board_in_order() {
        let provider = MockProvider::sample(fixed_now());
        let route = provider.routes[0].clone();
        let mut seen = Vec::new();

        let board = fetch_board(&provider, &route, Language::En, fixed_now, |i, s| {
            seen.push((i, s.info.stop.clone()))
        })
        .unwrap();

        assert_eq!(board.failed, 0);
        assert_eq!(board.stops.len(), 3);
        assert_eq!(board.stops[0].info.stop, "S1");
        assert_eq!(board.stops[0].eta, vec!["2 mins", "12 mins"]);
        assert_eq!(board.stops[1].eta, vec!["Arriving soon"]);
        assert!(board.stops[2].eta.is_empty());
        assert_eq!(
            seen,
            vec![(0, "S1".to_string()), (1, "S2".to_string()), (2, "S3".to_string())]
        );
        assert_eq!(board.fetched_at, fixed_now());
    }

    #[test]
    fn test_fetch_board_renders_language() {
        let provider = MockProvider::sample(fixed_now());
        let route = provider.routes[0].clone();
        let board = fetch_board(&provider, &route, Language::Zh, fixed_now, |_, _| {}).unwrap();
        assert_eq!(board.stops[0].eta, vec!["2 分鐘", "12 分鐘"]);
        assert_eq!(board.stops[1].eta, vec!["即將到達"]);
    }

    #[test]
    fn test_failed_stop_omitted_and_counted() {
        let provider = MockProvider::sample(fixed_now()).failing_stop("S2");
        let route = provider.routes[0].clone();
        let mut calls = 0;

        let board = fetch_board(&provider, &route, Language::En, fixed_now, |_, _| calls += 1)
            .unwrap();

        assert_eq!(board.failed, 1);
        assert_eq!(board.stops.len(), 2);
        assert_eq!(board.stops[1].info.stop, "S3");
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_stop_list_failure_is_error() {
        let provider = MockProvider::sample(fixed_now()).failing_list();
        let route = provider.routes[0].clone();
        let result = fetch_board(&provider, &route, Language::En, fixed_now, |_, _| {});
        assert!(matches!(result, Err(AppError::Api(_))));
    }
}
