//! HTML fragments for the web dashboard.
//!
//! Panels are rendered server-side and swapped in by HTMX; the only
//! client-side rendering is the Leaflet tile map on the index page.

use std::fmt::Write as _;

use crate::chart;
use crate::models::{Prediction, Quake};
use crate::predictions::{self, ProvinceRisk};
use crate::projection::{LAND, MapFrame};
use crate::provinces;
use crate::sidebar::{self, Classification};
use crate::styling::{MagnitudeBucket, RiskLevel, Severity, pin_radius};
use crate::view::ViewState;

/// Escape text for element content and attribute values.
#[must_use]
pub fn escape(s: &str) -> String {
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

fn error_box(message: &str) -> String {
    format!(
        r#"<div class="error-box"><strong>Error</strong><p>{}</p></div>"#,
        escape(message)
    )
}

fn muted(text: &str) -> String {
    format!(r#"<p class="muted">{}</p>"#, escape(text))
}

/// One event card for the sidebar list (also pushed over SSE).
#[must_use]
pub fn quake_card(quake: &Quake) -> String {
    let color = MagnitudeBucket::from_magnitude(quake.magnitude).css_color();
    format!(
        r#"<div class="quake-card" id="quake-{id}">
  <span class="dot" style="background:{color}"></span>
  <div>
    <h3>{province}</h3>
    <p class="muted small">{time}</p>
    <div class="quake-meta"><span>Mag: <b>{mag}</b></span><span>Depth: <b>{depth}</b></span></div>
  </div>
</div>"#,
        id = escape(&urlencoding::encode(&quake.id)),
        province = escape(quake.province_label()),
        time = escape(&quake.time_label()),
        mag = escape(&sidebar::magnitude_text(quake)),
        depth = escape(&sidebar::depth_text(quake)),
    )
}

fn classification_grid(counts: &Classification) -> String {
    let mut html = String::from(r#"<div class="class-grid">"#);
    for severity in Severity::ALL {
        let _ = write!(
            html,
            r#"<div><div class="class-count" style="color:{}">{}</div><div class="muted small">{} ({})</div></div>"#,
            severity.css_color(),
            counts.count(severity),
            severity.label(),
            escape(severity.range()),
        );
    }
    html.push_str("</div>");
    html
}

/// Sidebar panel: classification and recent list.
#[must_use]
pub fn recent_panel(state: &ViewState<Vec<Quake>>) -> String {
    match state {
        ViewState::Loading => muted("Loading data..."),
        ViewState::Error(message) => format!(r#"<p class="error-text">{}</p>"#, escape(message)),
        ViewState::Ready(quakes) => {
            let mut html = String::from("<h2>Earthquake classes</h2>");
            html.push_str(&classification_grid(&Classification::from_quakes(quakes)));
            html.push_str("<h2>Recent earthquakes</h2>");
            if quakes.is_empty() {
                html.push_str(&muted(sidebar::EMPTY_MESSAGE));
            }
            for quake in quakes {
                html.push_str(&quake_card(quake));
            }
            html
        }
    }
}

/// History chart panel as horizontal bars.
#[must_use]
pub fn chart_panel(state: &ViewState<Vec<(String, usize)>>, limit: usize) -> String {
    let counts = match state {
        ViewState::Loading => return muted("Loading chart..."),
        ViewState::Error(_) => return muted(chart::FAILED_MESSAGE),
        ViewState::Ready(counts) => counts,
    };

    let mut html = format!(
        r#"<h2>Earthquake history</h2><p class="muted small">{}</p><div class="bars">"#,
        escape(&chart::dataset_label(limit))
    );
    let max = counts.iter().map(|(_, n)| *n).max().unwrap_or(0);
    for (province, count) in counts {
        let width = chart::bar_len(*count, max, 100);
        let _ = write!(
            html,
            r#"<div class="bar-row"><span class="bar-label">{name}</span><span class="bar" style="width:{width}%"></span><span class="bar-value">{count}</span></div>"#,
            name = escape(province),
        );
    }
    if counts.is_empty() {
        html.push_str(&muted("No data."));
    }
    html.push_str("</div>");
    html
}

/// Popup body for a quake marker.
#[must_use]
pub fn popup_panel(name: &str, state: &ViewState<f64>) -> String {
    let body = match state {
        ViewState::Loading => "<p>Loading prediction...</p>".to_string(),
        ViewState::Error(message) => format!(r#"<p class="error-text">{}</p>"#, escape(message)),
        ViewState::Ready(p) => format!(
            r#"<p>Earthquake probability: <b>{:.0}%</b></p>"#,
            p * 100.0
        ),
    };
    format!(r#"<div class="popup"><h3>{}</h3>{body}</div>"#, escape(name))
}

/// Prediction detail card.
#[must_use]
pub fn prediction_panel(state: &ViewState<Prediction>) -> String {
    let prediction = match state {
        ViewState::Loading => return muted("Predicting..."),
        ViewState::Error(message) => return error_box(message),
        ViewState::Ready(p) => p,
    };

    let level = if prediction.is_likely() {
        RiskLevel::Likely
    } else {
        RiskLevel::Unlikely
    };
    let mut html = format!(
        r#"<div class="card detail">
  <h2>Prediction detail: <span class="accent">{province}</span></h2>
  <p class="headline" style="color:{color}">{headline}</p>
  <p>Probability (next 30 days): <b>{percent:.2}%</b> <span class="muted">({raw:.4})</span></p>"#,
        province = escape(&prediction.province),
        color = level.css_color(),
        headline = predictions::headline(prediction),
        percent = prediction.probability * 100.0,
        raw = prediction.probability,
    );
    if let Some(message) = &prediction.message {
        let _ = write!(html, r#"<p class="muted small">{}</p>"#, escape(message));
    }
    html.push_str("</div>");
    html
}

/// SVG width for a frame 100 units tall.
fn svg_width() -> f64 {
    (MapFrame::INDONESIA.aspect() * 100.0).round()
}

fn land_svg(width: f64) -> String {
    let frame = MapFrame::INDONESIA;
    let mut html = String::new();
    for ring in LAND {
        let points: Vec<String> = ring
            .iter()
            .filter_map(|&(lat, lon)| frame.project(lat, lon))
            .map(|(x, y)| format!("{:.1},{:.1}", x * width / 100.0, y))
            .collect();
        let _ = write!(html, r#"<polygon class="land" points="{}"/>"#, points.join(" "));
    }
    html
}

/// Risk map panel: province pins over the base map, or the failure state.
#[must_use]
pub fn risk_panel(state: &ViewState<Vec<ProvinceRisk>>) -> String {
    let width = svg_width();
    let open = format!(r#"<svg class="risk-map" viewBox="0 0 {width} 100" preserveAspectRatio="xMidYMid meet">"#);
    let land = land_svg(width);

    let entries = match state {
        ViewState::Loading => return muted("Loading map data..."),
        ViewState::Error(message) => {
            return format!(
                r#"{open}{land}</svg><p class="error-text overlay">Failed to load pin data.</p>{}"#,
                error_box(message)
            );
        }
        ViewState::Ready(entries) if entries.is_empty() => {
            return format!(r#"{open}{land}</svg>{}"#, muted("No prediction data for the map."));
        }
        ViewState::Ready(entries) => entries,
    };

    let mut html = format!("{open}{land}");
    for entry in entries {
        let Some((x, y)) = entry.province.pin() else {
            continue;
        };
        let probability = entry.probability();
        let title = match probability {
            Some(p) => format!("{} ({:.1}%)", entry.province.name, p * 100.0),
            None => entry.province.name.to_string(),
        };
        let _ = write!(
            html,
            r#"<circle id="{id}" class="pin" cx="{cx:.1}" cy="{cy:.1}" r="{r:.2}" fill="{fill}" onclick="showPrediction('{query}')"><title>{title}</title></circle>"#,
            id = entry.province.id,
            cx = x * width / 100.0,
            cy = y,
            r = pin_radius(probability),
            fill = entry.level().css_color(),
            query = urlencoding::encode(entry.province.name),
            title = escape(&title),
        );
    }
    html.push_str("</svg>");
    html
}

/// Magnitude legend overlay for the tile map.
#[must_use]
pub fn legend() -> String {
    let mut html = String::from(r#"<div class="legend"><h4>Magnitude legend</h4>"#);
    for bucket in MagnitudeBucket::LEGEND {
        let _ = write!(
            html,
            r#"<div><span class="swatch" style="background:{}"></span>{}</div>"#,
            bucket.css_color(),
            escape(bucket.legend_label()),
        );
    }
    html.push_str("</div>");
    html
}

fn province_options() -> String {
    let mut html = String::from(r#"<option value="">-- Select province --</option>"#);
    for name in provinces::names() {
        let _ = write!(html, r#"<option value="{0}">{0}</option>"#, escape(name));
    }
    html
}

const STYLE: &str = r"
:root { --bg:#0f1117; --surface:#181b24; --border:#2a2f3d; --text:#e5e7eb; --muted:#9ca3af; --accent:#f97316; --danger:#f87171; }
* { box-sizing:border-box; }
body { margin:0; font-family:system-ui,sans-serif; background:var(--bg); color:var(--text); }
a { color:var(--accent); }
.layout { display:flex; height:100vh; overflow:hidden; }
.main { flex:1; display:flex; flex-direction:column; padding:1rem; gap:1rem; min-width:0; }
.map-wrap { position:relative; flex:2; border-radius:8px; overflow:hidden; border:1px solid var(--border); }
#map { width:100%; height:100%; }
.chart-wrap { flex:1; overflow:auto; background:var(--surface); border:1px solid var(--border); border-radius:8px; padding:1rem; }
.sidebar { width:24rem; padding:1.5rem; background:var(--surface); border-left:1px solid var(--border); overflow-y:auto; }
.sidebar header { border-bottom:1px solid var(--border); margin-bottom:1rem; padding-bottom:1rem; }
h1 { margin:0; font-size:1.5rem; } h2 { font-size:1.05rem; margin:1rem 0 .5rem; } h3 { margin:0; font-size:.95rem; }
.muted { color:var(--muted); } .small { font-size:.75rem; } .accent { color:var(--accent); }
.error-text { color:var(--danger); }
.error-box { border:1px solid var(--danger); color:var(--danger); border-radius:6px; padding:.75rem; margin-top:1rem; }
.class-grid { display:grid; grid-template-columns:1fr 1fr; gap:.75rem; background:var(--bg); padding:1rem; border-radius:6px; }
.class-count { font-size:1.75rem; font-weight:700; }
.quake-card { display:flex; gap:.75rem; background:var(--bg); border-radius:6px; padding:.75rem; margin-bottom:.5rem; }
.quake-meta { display:flex; justify-content:space-between; gap:1rem; font-size:.75rem; margin-top:.25rem; }
.dot { width:.75rem; height:.75rem; border-radius:50%; margin-top:.25rem; flex-shrink:0; border:1px solid #000; }
.bars { display:flex; flex-direction:column; gap:.25rem; }
.bar-row { display:grid; grid-template-columns:12rem 1fr 3rem; align-items:center; gap:.5rem; font-size:.8rem; }
.bar-label { text-align:right; white-space:nowrap; overflow:hidden; text-overflow:ellipsis; }
.bar { display:block; height:.8rem; background:rgba(54,162,235,.6); border:1px solid rgba(54,162,235,1); }
.legend { position:absolute; bottom:1.25rem; right:1.25rem; z-index:1000; background:rgba(255,255,255,.85); color:#1f2937; padding:1rem; border-radius:6px; font-size:.75rem; }
.legend h4 { margin:0 0 .5rem; text-align:center; }
.swatch { display:inline-block; width:1rem; height:1rem; margin-right:.5rem; border:1px solid #9ca3af; vertical-align:middle; }
.map-error { position:absolute; top:1.25rem; left:50%; transform:translateX(-50%); z-index:1000; background:#dc2626; color:#fff; padding:.75rem; border-radius:6px; }
.status-pill { display:inline-flex; gap:.4rem; align-items:center; font-size:.75rem; }
.status-dot { width:.5rem; height:.5rem; border-radius:50%; background:#22c55e; }
.status-paused .status-dot { background:var(--muted); }
.btn { background:var(--accent); color:#fff; border:0; border-radius:6px; padding:.5rem 1rem; cursor:pointer; }
.btn-ghost { background:transparent; color:var(--muted); border:1px solid var(--border); }
.page { max-width:64rem; margin:0 auto; padding:2rem 1rem; text-align:center; }
.risk-map { width:100%; height:auto; background:#dbeafe; border-radius:8px; }
.land { fill:#e5e7eb; stroke:#9ca3af; stroke-width:.2; }
.pin { stroke:#fff; stroke-width:.3; cursor:pointer; opacity:.85; }
.pin:hover { opacity:1; }
.card { background:var(--surface); border:1px solid var(--border); border-radius:8px; padding:1.5rem; max-width:28rem; margin:1rem auto; }
.headline { font-size:1.15rem; font-weight:700; }
select { width:100%; padding:.5rem; margin:.5rem 0 1rem; background:var(--bg); color:var(--text); border:1px solid var(--border); border-radius:6px; }
";

/// Status pill for the live feed.
#[must_use]
pub fn feed_status(active: bool) -> &'static str {
    if active {
        r#"<div id="feed-status" class="status-pill"><span class="status-dot"></span><span>Live</span></div>"#
    } else {
        r#"<div id="feed-status" class="status-pill status-paused"><span class="status-dot"></span><span>Paused</span></div>"#
    }
}

/// The single-page layout: tile map and chart on the left, sidebar on the right.
#[must_use]
pub fn index_page() -> String {
    let (lat, lon) = MapFrame::CENTER;
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Earthquake Map</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<script src="https://unpkg.com/htmx.org@2.0.3"></script>
<script src="https://unpkg.com/htmx-ext-sse@2.2.2/sse.js"></script>
<style>{STYLE}</style>
</head>
<body>
<div class="layout">
  <div class="main">
    <div class="map-wrap">
      <div id="map"></div>
      {legend}
    </div>
    <div class="chart-wrap" hx-get="/panel/chart" hx-trigger="load">{chart_loading}</div>
  </div>
  <aside class="sidebar">
    <header>
      <h1>Earthquake Map</h1>
      <p class="muted small">Prediction &amp; Information · <a href="/risk">Province risk map</a></p>
      <div hx-get="/feed/status" hx-trigger="load">{status}</div>
      <button class="btn btn-ghost" hx-post="/feed/stop" hx-target="#feed-status" hx-swap="outerHTML">Pause</button>
      <button class="btn" hx-post="/feed/start" hx-target="#feed-status" hx-swap="outerHTML">Resume</button>
    </header>
    <div hx-ext="sse" sse-connect="/stream">
      <h2>Live</h2>
      <div id="live-feed" sse-swap="earthquake" hx-swap="afterbegin"></div>
    </div>
    <div hx-get="/panel/recent" hx-trigger="load">{recent_loading}</div>
  </aside>
</div>
<script>
(function() {{
  var map = L.map('map', {{ scrollWheelZoom: true }}).setView([{lat}, {lon}], 5);
  L.tileLayer('https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
    attribution: '&copy; <a href="https://www.openstreetmap.org/copyright">OpenStreetMap</a> contributors'
  }}).addTo(map);

  function showError(message) {{
    var el = document.createElement('div');
    el.className = 'map-error';
    el.textContent = 'Error: ' + message;
    document.querySelector('.map-wrap').appendChild(el);
  }}

  fetch('/api/quakes')
    .then(function(r) {{ return r.json().then(function(body) {{ return {{ ok: r.ok, body: body }}; }}); }})
    .then(function(res) {{
      if (!res.ok) {{ showError(res.body.error || 'Could not load location data.'); return; }}
      res.body.forEach(function(loc) {{
        var marker = L.circleMarker([loc.lat, loc.lng], {{
          radius: 7, color: 'black', weight: 1, fillColor: loc.color, fillOpacity: 0.8
        }}).addTo(map);
        marker.bindPopup('<div class="popup"><h3></h3><p>Loading prediction...</p></div>');
        marker.on('popupopen', function(e) {{
          var url = '/panel/popup?provinsi=' + encodeURIComponent(loc.province) + '&name=' + encodeURIComponent(loc.name);
          fetch(url).then(function(r) {{ return r.text(); }}).then(function(html) {{ e.popup.setContent(html); }});
        }});
      }});
    }})
    .catch(function(err) {{ showError(err.message || 'Could not load location data.'); }});
}})();
</script>
</body>
</html>
"##,
        legend = legend(),
        chart_loading = chart_panel(&ViewState::Loading, chart::CHART_LIMIT),
        recent_loading = recent_panel(&ViewState::Loading),
        status = feed_status(true),
    )
}

/// Province risk page: pin map, refresh button and prediction form.
#[must_use]
pub fn risk_page() -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Indonesia Earthquake Probability Map</title>
<script src="https://unpkg.com/htmx.org@2.0.3"></script>
<style>{STYLE}</style>
</head>
<body>
<div class="page">
  <h1 class="accent">Indonesia Earthquake Probability Map</h1>
  <p class="muted">Click a province pin for its prediction. Pin color and size show the earthquake potential. <a href="/">Back to the map</a></p>
  <button class="btn" hx-get="/panel/risk" hx-target="#risk-map" hx-indicator="#risk-map">Refresh map data</button>
  <div id="risk-map" hx-get="/panel/risk" hx-trigger="load">{risk_loading}</div>
  <div id="prediction-detail">{hint}</div>
  <form class="card" hx-post="/predict" hx-target="#prediction-detail">
    <h2>Predict one province</h2>
    <label for="province-select" class="muted small">Province</label>
    <select id="province-select" name="provinsi" required>{options}</select>
    <button class="btn" type="submit">Predict probability</button>
  </form>
</div>
<script>
function showPrediction(provinsi) {{
  htmx.ajax('GET', '/panel/prediction?provinsi=' + provinsi, '#prediction-detail');
}}
</script>
</body>
</html>
"##,
        risk_loading = risk_panel(&ViewState::Loading),
        hint = muted("Select a pin on the map to see the province prediction."),
        options = province_options(),
    )
}
