//! KMB open data provider
//!
//! Implementation of `TransitProvider` for the Kowloon Motor Bus ETA API
//! (<https://data.etabus.gov.hk/>). Every response wraps its payload in a
//! `{"data": ...}` envelope.

use crate::config::providers::KMB_ID;
use crate::error::{AppError, Result};
use crate::network::HttpClient;
use busboard::config::api::KMB_BASE_URL;
use busboard::transit::{Bound, EtaEntry, Route, RouteStop, StopInfo};
use chrono::DateTime;
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use super::traits::TransitProvider;

// =============================================================================
// Internal API response types (serde)
// =============================================================================

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct KmbRoute {
    route: String,
    bound: Bound,
    #[serde(deserialize_with = "lenient_string")]
    service_type: String,
    #[serde(default)]
    orig_en: String,
    #[serde(default)]
    orig_tc: String,
    #[serde(default)]
    dest_en: String,
    #[serde(default)]
    dest_tc: String,
}

#[derive(Debug, Deserialize)]
struct KmbRouteStop {
    bound: Bound,
    #[serde(deserialize_with = "lenient_string")]
    service_type: String,
    #[serde(deserialize_with = "lenient_u32")]
    seq: u32,
    stop: String,
}

#[derive(Debug, Default, Deserialize)]
struct KmbStop {
    #[serde(default)]
    stop: String,
    #[serde(default)]
    name_en: String,
    #[serde(default)]
    name_tc: String,
    #[serde(deserialize_with = "lenient_f64")]
    lat: f64,
    #[serde(deserialize_with = "lenient_f64")]
    long: f64,
}

#[derive(Debug, Deserialize)]
struct KmbEta {
    dir: Bound,
    #[serde(deserialize_with = "lenient_u32")]
    seq: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    eta_seq: u32,
    #[serde(default)]
    eta: Option<String>,
    #[serde(default)]
    dest_en: String,
    #[serde(default)]
    dest_tc: String,
    #[serde(default)]
    rmk_en: String,
    #[serde(default)]
    rmk_tc: String,
}

/// Number or numeric string
#[derive(Deserialize)]
#[serde(untagged)]
enum Numeric {
    Int(u64),
    Float(f64),
    Text(String),
}

fn lenient_u32<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<u32, D::Error> {
    use serde::de::Error;
    match Numeric::deserialize(d)? {
        Numeric::Int(n) => u32::try_from(n).map_err(D::Error::custom),
        Numeric::Float(f) if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => Ok(f as u32),
        Numeric::Float(f) => Err(D::Error::custom(format!("invalid sequence number {f}"))),
        Numeric::Text(s) => s.trim().parse().map_err(D::Error::custom),
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<f64, D::Error> {
    use serde::de::Error;
    match Numeric::deserialize(d)? {
        Numeric::Int(n) => Ok(n as f64),
        Numeric::Float(f) => Ok(f),
        Numeric::Text(s) => s.trim().parse().map_err(D::Error::custom),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    Ok(match Numeric::deserialize(d)? {
        Numeric::Int(n) => n.to_string(),
        Numeric::Float(f) => f.to_string(),
        Numeric::Text(s) => s,
    })
}

// =============================================================================
// Wire -> domain conversion
// =============================================================================

impl From<KmbRoute> for Route {
    fn from(k: KmbRoute) -> Self {
        Route::new(k.route, k.bound, k.service_type)
            .with_origin(k.orig_en, k.orig_tc)
            .with_destination(k.dest_en, k.dest_tc)
    }
}

impl From<KmbRouteStop> for RouteStop {
    fn from(k: KmbRouteStop) -> Self {
        RouteStop {
            stop: k.stop,
            seq: k.seq,
            bound: k.bound,
            service_type: k.service_type,
        }
    }
}

impl From<KmbStop> for StopInfo {
    fn from(k: KmbStop) -> Self {
        StopInfo {
            stop: k.stop,
            name_en: k.name_en,
            name_tc: k.name_tc,
            lat: k.lat,
            long: k.long,
        }
    }
}

impl From<KmbEta> for EtaEntry {
    fn from(k: KmbEta) -> Self {
        let eta = k
            .eta
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .and_then(|s| match DateTime::parse_from_rfc3339(s) {
                Ok(t) => Some(t),
                Err(e) => {
                    log::debug!("Unparseable ETA timestamp {s:?}: {e}");
                    None
                }
            });

        EtaEntry {
            seq: k.seq,
            bound: k.dir,
            eta_seq: k.eta_seq,
            eta,
            dest_en: k.dest_en,
            dest_tc: k.dest_tc,
            rmk_en: k.rmk_en,
            rmk_tc: k.rmk_tc,
        }
    }
}

/// Unwrap a list envelope, skipping rows that don't parse
fn parse_list<T: DeserializeOwned>(envelope: Envelope<Value>, what: &str) -> Result<Vec<T>> {
    let items = match envelope.data {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(AppError::Api(format!("{what}: data is not a list"))),
        None => return Err(AppError::Api(format!("{what}: response has no data"))),
    };

    let total = items.len();
    let parsed: Vec<T> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(v) => Some(v),
            Err(e) => {
                log::debug!("Skipping malformed {what} row: {e}");
                None
            }
        })
        .collect();

    if parsed.len() < total {
        log::warn!("{what}: skipped {} of {} rows", total - parsed.len(), total);
    }
    Ok(parsed)
}

fn parse_stop(envelope: Envelope<Value>, stop_id: &str) -> Result<StopInfo> {
    let data = match envelope.data {
        Some(Value::Object(map)) if !map.is_empty() => Value::Object(map),
        _ => return Err(AppError::NotFound(format!("Stop {stop_id}"))),
    };
    let stop: KmbStop = serde_json::from_value(data)
        .map_err(|e| AppError::Api(format!("Stop {stop_id}: {e}")))?;
    let mut info = StopInfo::from(stop);
    if info.stop.is_empty() {
        info.stop = stop_id.to_string();
    }
    Ok(info)
}

// =============================================================================
// KmbProvider
// =============================================================================

/// KMB ETA API provider
pub struct KmbProvider {
    client: HttpClient,
    base_url: String,
}

impl KmbProvider {
    /// Create a provider using the public endpoint
    pub fn new() -> Result<Self> {
        Self::with_base_url(KMB_BASE_URL)
    }

    /// Create a provider with a custom base URL (for testing or mirrors)
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

impl TransitProvider for KmbProvider {
    fn name(&self) -> &'static str {
        "KMB"
    }

    fn id(&self) -> &'static str {
        KMB_ID
    }

    fn fetch_routes(&self) -> Result<Vec<Route>> {
        let envelope: Envelope<Value> = self.client.get_json(&self.url("route/"))?;
        let rows: Vec<KmbRoute> = parse_list(envelope, "Route list")?;
        log::info!("Fetched {} routes", rows.len());
        Ok(rows.into_iter().map(Route::from).collect())
    }

    fn fetch_route_stops(&self, route: &Route) -> Result<Vec<RouteStop>> {
        let url = self.url(&format!(
            "route-stop/{}/{}/{}",
            route.route,
            route.bound.path_segment(),
            route.service_type
        ));
        let envelope: Envelope<Value> = self.client.get_json(&url)?;
        let rows: Vec<KmbRouteStop> = parse_list(envelope, "Route stops")?;

        let mut stops: Vec<RouteStop> = rows.into_iter().map(RouteStop::from).collect();
        stops.sort_by_key(|s| s.seq);
        Ok(stops)
    }

    fn fetch_stop(&self, stop_id: &str) -> Result<StopInfo> {
        let url = self.url(&format!("stop/{stop_id}"));
        let envelope: Envelope<Value> = self.client.get_json(&url)?;
        parse_stop(envelope, stop_id)
    }

    fn fetch_etas(&self, stop_id: &str, route: &Route) -> Result<Vec<EtaEntry>> {
        let url = self.url(&format!(
            "eta/{}/{}/{}",
            stop_id, route.route, route.service_type
        ));
        let envelope: Envelope<Value> = self.client.get_json(&url)?;
        let rows: Vec<KmbEta> = parse_list(envelope, "ETA")?;
        Ok(rows.into_iter().map(EtaEntry::from).collect())
    }
}
