extern crate chrono;
extern crate chrono_tz;

use crate::render;
use crate::vehicle::ViewState;

pub const FOOTER: &'static str = "Segui GTT – tracking realtime of public transport | &copy; 2025 | v1.0";

#[derive(Debug, Serialize)]
pub struct StateSnapshot {
    pub line: String,
    pub last_update: Option<String>,
    pub markers: Vec<render::Marker>,
}

pub fn snapshot(state: &ViewState) -> StateSnapshot {
    return StateSnapshot{
        line: state.line.clone(),
        last_update: state.last_update.map(|t| t.to_rfc3339()),
        markers: render::project(&state.vehicles),
    };
}

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    return escaped;
}

fn badge_class(style: render::BadgeStyle) -> &'static str {
    match style {
        render::BadgeStyle::Success => "badge bg-success",
        render::BadgeStyle::Secondary => "badge bg-secondary",
        render::BadgeStyle::Info => "badge bg-info",
    }
}

fn badge(badge: &render::Badge) -> String {
    return format!("<span class='{}'>{}</span>", badge_class(badge.style), escape(&badge.text));
}

fn popup(marker: &render::Marker) -> String {
    let p = &marker.popup;
    return format!(
        "<details class='vehicle' id='vehicle-{key}' data-lat='{lat}' data-lon='{lon}'>\
         <summary>{title}</summary>\
         <div>{accessibility}</div>\
         <div>{last_update}</div>\
         <div>Occupazione: {occupancy}</div>\
         <div>Fermata: {stop}</div>\
         </details>",
        key = escape(&marker.key),
        lat = marker.lat,
        lon = marker.lon,
        title = escape(&p.title),
        accessibility = badge(&p.accessibility),
        last_update = escape(&p.last_update),
        occupancy = badge(&p.occupancy),
        stop = badge(&p.nearest_stop));
}

/// The whole view. While a line is tracked the page reloads itself every
/// `refresh_secs` so the map follows the poller.
pub fn render_page(state: &ViewState, markers: &[render::Marker], refresh_secs: u64) -> String {
    let mut body = "<!DOCTYPE html><html><head><meta charset='utf-8'><title>Segui GTT</title>".to_string();
    if state.is_tracking() {
        body.push_str(&format!("<meta http-equiv='refresh' content='{}'>", std::cmp::max(1, refresh_secs)));
    }
    body.push_str("<style>body{font-family:sans-serif;background:#f8f9fa;margin:2em}\
                   .badge{padding:2px 6px;border-radius:4px;color:#fff}\
                   .bg-success{background:#198754}.bg-secondary{background:#6c757d}.bg-info{background:#0dcaf0;color:#000}\
                   details.vehicle{margin:4px 0}</style></head><body>");

    body.push_str("<h1>Segui GTT</h1>");
    body.push_str(&format!(
        "<form method='get' action='/'><input type='text' name='line' placeholder='Inserisci linea...' value='{}'/>\
         <button type='submit'>Cerca</button></form>",
        escape(&state.line)));

    if state.is_tracking() {
        let updated = match state.last_update {
            Some(ts) => ts.with_timezone(&chrono_tz::Europe::Rome).format("%H:%M:%S").to_string(),
            None => "-".to_string(),
        };
        body.push_str(&format!("<div>Linea {}: {} vetture (aggiornato {})</div>",
                               escape(&state.line), markers.len(), updated));
    }

    let cache_buster = state.last_update.map(|t| t.timestamp_millis()).unwrap_or(0);
    body.push_str(&format!("<div><img style='border: 1px solid black;' src='/map.png?t={}' /></div>", cache_buster));

    body.push_str("<div>");
    for marker in markers {
        body.push_str(&popup(marker));
    }
    body.push_str("</div>");

    body.push_str(&format!("<footer><small>{}</small></footer>", FOOTER));
    body.push_str("</body></html>");
    return body;
}

#[cfg(test)]
mod tests {
    use crate::render;
    use crate::vehicle;

    fn tracking_state() -> vehicle::ViewState {
        let mut state = vehicle::ViewState::empty();
        state.line = "16".to_string();
        state.vehicles = vehicle::parse_vehicles(
            r#"[{"id":1,"lat":45.07,"lon":7.68,"disabili":true,"aggiornamento":"12:00","occupazione":"low","fermata_vicina":{"stopName":"Porta Nuova"}},
                {"id":2,"lat":45.06,"lon":7.67,"disabili":false,"aggiornamento":"12:01","occupazione":"high","fermata_vicina":{"stopName":"Re Umberto"}}]"#)
            .expect("parse_vehicles");
        return state;
    }

    #[test]
    fn idle_page_has_form_and_no_refresh() {
        let state = vehicle::ViewState::empty();
        let html = super::render_page(&state, &[], 2);

        assert!(html.contains("placeholder='Inserisci linea...'"));
        assert!(html.contains(">Cerca</button>"));
        assert!(!html.contains("http-equiv='refresh'"));
        assert!(!html.contains("<details"));
        assert!(html.contains("Segui GTT – tracking realtime of public transport"));
    }

    #[test]
    fn tracking_page_has_one_popup_per_vehicle() {
        let state = tracking_state();
        let markers = render::project(&state.vehicles);
        let html = super::render_page(&state, &markers, 2);

        assert_eq!(2, html.matches("<details").count());
        assert!(html.contains("<meta http-equiv='refresh' content='2'>"));
        assert!(html.contains("<summary>Vettura 1</summary>"));
        assert!(html.contains("<span class='badge bg-success'>Accessibile</span>"));
        assert!(html.contains("<span class='badge bg-secondary'>Non accessibile</span>"));
        assert!(html.contains("Fermata: <span class='badge bg-info'>Porta Nuova</span>"));
        assert!(html.contains("value='16'"));
    }

    #[test]
    fn text_is_escaped() {
        let mut state = vehicle::ViewState::empty();
        state.line = "<script>'".to_string();
        let html = super::render_page(&state, &[], 2);

        assert!(!html.contains("<script>"));
        assert!(html.contains("value='&lt;script&gt;&#39;'"));
    }

    #[test]
    fn snapshot_serializes_markers() {
        let snapshot = super::snapshot(&tracking_state());
        let json = serde_json::to_value(&snapshot).expect("to_value");

        assert_eq!("16", json["line"]);
        assert_eq!(serde_json::Value::Null, json["last_update"]);
        assert_eq!(2, json["markers"].as_array().expect("markers").len());
        assert_eq!("success", json["markers"][0]["popup"]["accessibility"]["style"]);
    }
}
