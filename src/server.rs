extern crate reqwest;
extern crate std;
extern crate tiny_http;

use std::sync::Arc;

use crate::config::Viewport;
use crate::controller::QueryController;
use crate::map;
use crate::page;
use crate::render;
use crate::result;

type HttpResponse = tiny_http::Response<std::io::Cursor<Vec<u8>>>;

#[derive(Debug, PartialEq)]
pub enum Route {
    Page,
    Submit(String),
    MapImage,
    State,
    NotFound,
}

pub struct WebView {
    pub controller: Arc<QueryController>,
    pub viewport: Viewport,
    pub styles: map::Styles,
    pub refresh_secs: u64,
}

pub fn run_server(port: u16, view: WebView) -> result::SeguiResult<()> {
    let server = tiny_http::Server::http(("0.0.0.0", port))
        .map_err(|e| result::make_error(&format!("Listening on port {}: {}", port, e)))?;

    info!("Serving on http://0.0.0.0:{}/", port);
    for mut request in server.incoming_requests() {
        let mut form_body = String::new();
        if *request.method() == tiny_http::Method::Post {
            use std::io::Read;
            if let Err(err) = request.as_reader().read_to_string(&mut form_body) {
                warn!("Reading request body: {}", err);
            }
        }

        let route = route(&request.method().to_string(), request.url(), &form_body);
        debug!("{} {} -> {:?}", request.method(), request.url(), route);

        let response = view.respond(route);
        if let Err(err) = request.respond(response) {
            warn!("Writing response: {}", err);
        }
    }
    return Ok(());
}

pub fn route(method: &str, url: &str, form_body: &str) -> Route {
    let (path, query) = match url.find('?') {
        Some(i) => (&url[..i], &url[i + 1..]),
        None => (url, ""),
    };

    match (method, path) {
        ("GET", "/") => {
            match form_value(query, "line") {
                Some(line) => Route::Submit(line),
                None => Route::Page,
            }
        },
        ("POST", "/") => Route::Submit(form_value(form_body, "line").unwrap_or("".to_string())),
        ("GET", "/map.png") => Route::MapImage,
        ("GET", "/state.json") => Route::State,
        (_, _) => Route::NotFound,
    }
}

// application/x-www-form-urlencoded, decoded by the url crate.
fn form_value(encoded: &str, key: &str) -> Option<String> {
    let mut url = reqwest::Url::parse("http://localhost/").ok()?;
    url.set_query(Some(encoded));
    return url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned());
}

impl WebView {
    pub fn respond(&self, route: Route) -> HttpResponse {
        match route {
            Route::Page => {
                let state = self.controller.state();
                let markers = render::project(&state.vehicles);
                let html = page::render_page(&state, &markers, self.refresh_secs);
                return with_header(tiny_http::Response::from_string(html),
                                   "Content-Type", "text/html; charset=utf-8");
            },
            Route::Submit(line) => {
                if let Err(err) = self.controller.submit_line(&line) {
                    error!("Submitting line {}: {}", line, err);
                    return tiny_http::Response::from_string("<h1>500</h1>").with_status_code(500);
                }
                return with_header(tiny_http::Response::from_string("").with_status_code(303),
                                   "Location", "/");
            },
            Route::MapImage => {
                let state = self.controller.state();
                let markers = render::project(&state.vehicles);
                let imgbuf = map::generate_image(&markers, &self.viewport, &self.styles);
                match map::encode_png(&imgbuf) {
                    Ok(png) => {
                        let response = with_header(tiny_http::Response::from_data(png),
                                                   "Content-Type", "image/png");
                        return with_header(response, "Cache-Control", "no-store");
                    },
                    Err(err) => {
                        error!("Encoding map: {}", err);
                        return tiny_http::Response::from_string("<h1>500</h1>").with_status_code(500);
                    },
                }
            },
            Route::State => {
                let snapshot = page::snapshot(&self.controller.state());
                match serde_json::to_string(&snapshot) {
                    Ok(json) => {
                        return with_header(tiny_http::Response::from_string(json),
                                           "Content-Type", "application/json");
                    },
                    Err(err) => {
                        error!("Serializing state: {}", err);
                        return tiny_http::Response::from_string("<h1>500</h1>").with_status_code(500);
                    },
                }
            },
            Route::NotFound => {
                return with_header(
                    tiny_http::Response::from_string("<h1>404</h1><p>Not found!<p>").with_status_code(404),
                    "Content-Type", "text/html; charset=utf-8");
            },
        }
    }
}

fn with_header(response: HttpResponse, name: &str, value: &str) -> HttpResponse {
    match tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()) {
        Ok(header) => return response.with_header(header),
        Err(_) => {
            warn!("Invalid header {}: {}", name, value);
            return response;
        },
    }
}
