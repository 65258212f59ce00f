//! Map document generation
//!
//! Builds a self-contained Leaflet page for a route's stops. The page is
//! regenerated from scratch whenever the stop list or selection changes.

use serde::Serialize;

use crate::config::map::{
    INIT_DELAY_MS, LEAFLET_VERSION, MAX_ZOOM, OVERVIEW_ZOOM, STOP_ZOOM, TILE_ATTRIBUTION, TILE_URL,
};
use crate::error::{BusError, Result};
use crate::i18n::Language;
use crate::transit::StopEta;

// =============================================================================
// Embedded data
// =============================================================================

#[derive(Debug, Serialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Serialize)]
struct StopName<'a> {
    en: &'a str,
    tc: &'a str,
}

/// One stop as embedded in the document
#[derive(Debug, Serialize)]
struct MapStop<'a> {
    location: LatLng,
    name: StopName<'a>,
    eta: &'a [String],
}

impl<'a> From<&'a StopEta> for MapStop<'a> {
    fn from(stop: &'a StopEta) -> Self {
        Self {
            location: LatLng {
                lat: stop.info.lat,
                lng: stop.info.long,
            },
            name: StopName {
                en: &stop.info.name_en,
                tc: &stop.info.name_tc,
            },
            eta: &stop.eta,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Labels {
    lang: &'static str,
    stop: &'static str,
    eta: &'static str,
    no_eta: &'static str,
}

/// JSON for inline `<script>` use; `</` cannot close the script element
fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// =============================================================================
// MapDocument
// =============================================================================

/// Builder for a route map page
pub struct MapDocument<'a> {
    stops: &'a [StopEta],
    selected: Option<usize>,
    language: Language,
    title: String,
}

impl<'a> MapDocument<'a> {
    /// Start a document for the given ordered stops
    pub fn new(stops: &'a [StopEta]) -> Self {
        Self {
            stops,
            selected: None,
            language: Language::default(),
            title: String::new(),
        }
    }

    /// Highlight a stop (ignored if out of range)
    pub fn selected(mut self, index: Option<usize>) -> Self {
        self.selected = index.filter(|&i| i < self.stops.len());
        self
    }

    /// Language for names and popup labels
    pub fn language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Page title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Render the HTML page
    pub fn render(&self) -> Result<String> {
        let center_stop = match self.selected {
            Some(i) => &self.stops[i],
            None => self
                .stops
                .first()
                .ok_or_else(|| BusError::Map("Route has no stops to draw".to_string()))?,
        };
        let zoom = if self.selected.is_some() {
            STOP_ZOOM
        } else {
            OVERVIEW_ZOOM
        };

        let stops: Vec<MapStop<'_>> = self.stops.iter().map(MapStop::from).collect();
        let strings = self.language.strings();
        let labels = Labels {
            lang: self.language.code(),
            stop: strings.stop,
            eta: strings.eta,
            no_eta: strings.no_eta,
        };
        let selected = self.selected.map(|i| i as i64).unwrap_or(-1);

        let html = TEMPLATE
            .replace("{{LANG}}", self.language.code())
            .replace("{{LEAFLET_VERSION}}", LEAFLET_VERSION)
            .replace("{{TILE_URL}}", &script_json(TILE_URL)?)
            .replace("{{ATTRIBUTION}}", &script_json(TILE_ATTRIBUTION)?)
            .replace("{{MAX_ZOOM}}", &MAX_ZOOM.to_string())
            .replace(
                "{{CENTER}}",
                &format!("[{}, {}]", center_stop.info.lat, center_stop.info.long),
            )
            .replace("{{ZOOM}}", &zoom.to_string())
            .replace("{{STOP_ZOOM}}", &STOP_ZOOM.to_string())
            .replace("{{OVERVIEW_ZOOM}}", &OVERVIEW_ZOOM.to_string())
            .replace("{{SELECTED}}", &selected.to_string())
            .replace("{{LABELS}}", &script_json(&labels)?)
            .replace("{{INIT_DELAY}}", &INIT_DELAY_MS.to_string())
            // last: stop names and the title are user data and must not be re-scanned
            .replace("{{STOPS}}", &script_json(&stops)?)
            .replace("{{TITLE}}", &escape_html(&self.title));

        Ok(html)
    }
}

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="{{LANG}}">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0, maximum-scale=1.0, user-scalable=no" />
  <title>{{TITLE}}</title>
  <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/leaflet/{{LEAFLET_VERSION}}/leaflet.css" />
  <script src="https://cdnjs.cloudflare.com/ajax/libs/leaflet/{{LEAFLET_VERSION}}/leaflet.js"></script>
  <style>
    html, body { height: 100%; margin: 0; padding: 0; }
    #map { height: 100%; width: 100%; }
    .custom-marker {
      display: flex;
      align-items: center;
      justify-content: center;
      color: white;
      font-weight: bold;
      width: 30px;
      height: 30px;
      border-radius: 50%;
      background-color: #2196F3;
      border: 2px solid white;
      box-shadow: 0 2px 5px rgba(0, 0, 0, 0.5);
    }
    .custom-marker.active { background-color: #f44336; width: 36px; height: 36px; z-index: 1000; }
    .custom-marker.passed { background-color: #9e9e9e; }
  </style>
</head>
<body>
  <div id="map"></div>
  <script>
    let map;
    const markers = [];
    const popups = [];
    const stops = {{STOPS}};
    const selectedStopIndex = {{SELECTED}};
    const labels = {{LABELS}};

    function postToHost(payload) {
      const text = JSON.stringify(payload);
      if (window.ReactNativeWebView) {
        window.ReactNativeWebView.postMessage(text);
      } else if (window.parent && window.parent !== window) {
        window.parent.postMessage(text, '*');
      }
    }

    function escapeHtml(s) {
      return String(s).replace(/[&<>"']/g, function (c) {
        return { '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;' }[c];
      });
    }

    function stopName(stop) {
      return labels.lang === 'zh' ? stop.name.tc : stop.name.en;
    }

    function popupContent(index, eta) {
      let html = '<b>' + labels.stop + ' ' + (index + 1) + ': ' + escapeHtml(stopName(stops[index])) + '</b><br>';
      if (eta && eta.length > 0) {
        html += labels.eta + ': ' + escapeHtml(eta[0]);
      } else {
        html += labels.noEta;
      }
      return html;
    }

    function initMap() {
      try {
        map = L.map('map').setView({{CENTER}}, {{ZOOM}});
        L.tileLayer({{TILE_URL}}, {
          maxZoom: {{MAX_ZOOM}},
          attribution: {{ATTRIBUTION}}
        }).addTo(map);

        L.polyline(stops.map(function (s) { return [s.location.lat, s.location.lng]; }), {
          color: '#2196F3',
          weight: 4,
          opacity: 0.7
        }).addTo(map);

        stops.forEach(function (stop, index) {
          const markerEl = document.createElement('div');
          markerEl.className = 'custom-marker';
          if (index === selectedStopIndex) {
            markerEl.classList.add('active');
          }
          if (index < selectedStopIndex) {
            markerEl.classList.add('passed');
          }
          markerEl.innerText = (index + 1).toString();

          const marker = L.marker([stop.location.lat, stop.location.lng], {
            icon: L.divIcon({
              html: markerEl,
              className: 'marker-container',
              iconSize: [36, 36],
              iconAnchor: [18, 18]
            })
          }).addTo(map);
          markers.push(marker);
          popups.push(marker.bindPopup(popupContent(index, stop.eta)));

          marker.on('click', function () {
            postToHost({ action: 'stopSelected', index: index });
          });
        });

        if (selectedStopIndex >= 0) {
          map.setView([stops[selectedStopIndex].location.lat, stops[selectedStopIndex].location.lng], {{STOP_ZOOM}});
        } else if (stops.length > 0) {
          map.setView([stops[0].location.lat, stops[0].location.lng], {{OVERVIEW_ZOOM}});
        }

        window.handleMessage = function (message) {
          const data = typeof message === 'string' ? JSON.parse(message) : message;
          if (data.action === 'centerStop' && data.index >= 0 && data.index < stops.length) {
            map.setView([stops[data.index].location.lat, stops[data.index].location.lng], {{STOP_ZOOM}});
          } else if (data.action === 'updateETA' && data.index >= 0 && data.index < markers.length) {
            stops[data.index].eta = data.eta || [];
            popups[data.index].setPopupContent(popupContent(data.index, stops[data.index].eta));
          }
        };
        window.addEventListener('message', function (event) { window.handleMessage(event.data); });
        document.addEventListener('message', function (event) { window.handleMessage(event.data); });
      } catch (error) {
        document.body.innerHTML = '<div style="color: red; padding: 20px;"><p>Error loading map: ' + escapeHtml(error.message) + '</p></div>';
        postToHost({ action: 'error', message: error.message });
      }
    }

    document.addEventListener('DOMContentLoaded', function () {
      setTimeout(initMap, {{INIT_DELAY}});
    });
  </script>
</body>
</html>
"#;
