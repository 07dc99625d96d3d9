extern crate reqwest;

use crate::result;
use crate::vehicle;

pub trait VehicleSource: Send + Sync {
    fn fetch_vehicles(&self, line: &str) -> result::SeguiResult<Vec<vehicle::Vehicle>>;
}

pub struct HttpVehicleSource {
    client: reqwest::blocking::Client,
    api_base: String,
}

impl HttpVehicleSource {
    pub fn new(api_base: &str, timeout: std::time::Duration) -> result::SeguiResult<HttpVehicleSource> {
        // Fail at startup on a bad base rather than on every tick.
        line_url(api_base, "0")?;

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        return Ok(HttpVehicleSource{
            client: client,
            api_base: api_base.to_string(),
        });
    }
}

impl VehicleSource for HttpVehicleSource {
    fn fetch_vehicles(&self, line: &str) -> result::SeguiResult<Vec<vehicle::Vehicle>> {
        let url = line_url(&self.api_base, line)?;
        debug!("Fetching {}", url);

        let response = self.client.get(url.as_str())
            .header(reqwest::header::USER_AGENT, "seguigtt")
            .header(reqwest::header::ACCEPT, "application/json")
            .send()?
            .error_for_status()?;
        let response_body = response.text()?;

        return vehicle::parse_vehicles(&response_body);
    }
}

// The line is one path segment, so "/" and spaces in it get percent-encoded.
pub fn line_url(api_base: &str, line: &str) -> result::SeguiResult<reqwest::Url> {
    let mut url = reqwest::Url::parse(api_base)
        .map_err(|e| result::SeguiError::UrlError(format!("{}: {}", api_base, e)))?;
    {
        let mut segments = url.path_segments_mut()
            .map_err(|_| result::SeguiError::UrlError(format!("{}: cannot be a base", api_base)))?;
        segments.pop_if_empty();
        segments.extend(["api", "lines", line].iter());
    }
    return Ok(url);
}
