//! In-memory provider for fetcher and controller tests

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Local};

use busboard::transit::{Bound, EtaEntry, Route, RouteStop, StopInfo};

use crate::error::{AppError, Result};
use crate::providers::TransitProvider;

pub struct MockProvider {
    pub routes: Vec<Route>,
    stops: HashMap<String, Vec<RouteStop>>,
    infos: HashMap<String, StopInfo>,
    etas: HashMap<String, Vec<EtaEntry>>,
    failing_stops: Mutex<HashSet<String>>,
    fail_list: bool,
    delay: Duration,
    list_calls: AtomicUsize,
}

fn eta(seq: u32, eta_seq: u32, at: Option<DateTime<Local>>) -> EtaEntry {
    EtaEntry {
        seq,
        bound: Bound::Outbound,
        eta_seq,
        eta: at.map(|t| t.fixed_offset()),
        dest_en: "SAU MAU PING".to_string(),
        dest_tc: "秀茂坪".to_string(),
        rmk_en: String::new(),
        rmk_tc: String::new(),
    }
}

fn info(id: &str, lat: f64) -> StopInfo {
    StopInfo {
        stop: id.to_string(),
        name_en: format!("STOP {id}"),
        name_tc: format!("站{id}"),
        lat,
        long: 114.17,
    }
}

impl MockProvider {
    /// Two routes: 1A outbound with stops S1..S3, 2 outbound with T1
    ///
    /// S1 has buses 2 and 12 minutes after `now`, S2 one just leaving,
    /// S3 only an entry without a timestamp.
    pub fn sample(now: DateTime<Local>) -> Self {
        let route_a = Route::new("1A", Bound::Outbound, "1")
            .with_origin("STAR FERRY", "尖沙咀碼頭")
            .with_destination("SAU MAU PING", "秀茂坪");
        let route_b = Route::new("2", Bound::Outbound, "1")
            .with_origin("STAR FERRY", "尖沙咀碼頭")
            .with_destination("CHEUNG SHA WAN", "長沙灣");

        let rs = |stop: &str, seq: u32| RouteStop {
            stop: stop.to_string(),
            seq,
            bound: Bound::Outbound,
            service_type: "1".to_string(),
        };

        let mut stops = HashMap::new();
        stops.insert(route_a.key(), vec![rs("S1", 1), rs("S2", 2), rs("S3", 3)]);
        stops.insert(route_b.key(), vec![rs("T1", 1)]);

        let mut infos = HashMap::new();
        for (id, lat) in [("S1", 22.29), ("S2", 22.30), ("S3", 22.31), ("T1", 22.33)] {
            infos.insert(id.to_string(), info(id, lat));
        }

        let mut etas = HashMap::new();
        etas.insert(
            "S1".to_string(),
            vec![
                eta(1, 2, Some(now + chrono::Duration::seconds(720))),
                eta(1, 1, Some(now + chrono::Duration::seconds(120))),
                // Prediction for another stop position in the same response
                eta(2, 1, Some(now + chrono::Duration::seconds(60))),
            ],
        );
        etas.insert(
            "S2".to_string(),
            vec![eta(2, 1, Some(now - chrono::Duration::seconds(20)))],
        );
        etas.insert("S3".to_string(), vec![eta(3, 1, None)]);
        etas.insert(
            "T1".to_string(),
            vec![eta(1, 1, Some(now + chrono::Duration::seconds(300)))],
        );

        Self {
            routes: vec![route_a, route_b],
            stops,
            infos,
            etas,
            failing_stops: Mutex::new(HashSet::new()),
            fail_list: false,
            delay: Duration::ZERO,
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_stop(self, stop_id: &str) -> Self {
        self.set_stop_failing(stop_id, true);
        self
    }

    /// Make a stop fail (or recover) from the next request on
    pub fn set_stop_failing(&self, stop_id: &str, failing: bool) {
        let mut stops = self.failing_stops.lock().unwrap();
        if failing {
            stops.insert(stop_id.to_string());
        } else {
            stops.remove(stop_id);
        }
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    /// Sleep this long before answering each stop-list request
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of stop-list requests served so far
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

impl TransitProvider for MockProvider {
    fn name(&self) -> &'static str {
        "Mock"
    }

    fn id(&self) -> &'static str {
        "mock"
    }

    fn fetch_routes(&self) -> Result<Vec<Route>> {
        Ok(self.routes.clone())
    }

    fn fetch_route_stops(&self, route: &Route) -> Result<Vec<RouteStop>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if self.fail_list {
            return Err(AppError::Api("stop list unavailable".to_string()));
        }
        self.stops
            .get(&route.key())
            .cloned()
            .ok_or_else(|| AppError::NotFound(route.key()))
    }

    fn fetch_stop(&self, stop_id: &str) -> Result<StopInfo> {
        if self.failing_stops.lock().unwrap().contains(stop_id) {
            return Err(AppError::Api(format!("stop {stop_id} timed out")));
        }
        self.infos
            .get(stop_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(stop_id.to_string()))
    }

    fn fetch_etas(&self, stop_id: &str, _route: &Route) -> Result<Vec<EtaEntry>> {
        Ok(self.etas.get(stop_id).cloned().unwrap_or_default())
    }
}
