extern crate anyhow;
extern crate getopts;
extern crate serde;
extern crate serde_json;

use anyhow::Context;
use crate::result;

pub const DEFAULT_API_BASE: &'static str = "http://localhost:8000";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 5000;

// Piazza Castello, Torino.
pub const DEFAULT_CENTER: (f64, f64) = (45.0703, 7.6869);
pub const DEFAULT_ZOOM: u32 = 13;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Viewport {
        return Viewport{
            center_lat: DEFAULT_CENTER.0,
            center_lon: DEFAULT_CENTER.1,
            zoom: DEFAULT_ZOOM,
            width: 800,
            height: 600,
        };
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base: String,
    pub port: u16,
    pub poll_interval: std::time::Duration,
    pub fetch_timeout: std::time::Duration,
    pub viewport: Viewport,

    pub initial_line: Option<String>,
    pub save_image: Option<String>,
    pub one_shot: bool,
    pub log_dir: Option<String>,
}

impl Default for Config {
    fn default() -> Config {
        return Config{
            api_base: DEFAULT_API_BASE.to_string(),
            port: DEFAULT_PORT,
            poll_interval: std::time::Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            fetch_timeout: std::time::Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS),
            viewport: Viewport::default(),
            initial_line: None,
            save_image: None,
            one_shot: false,
            log_dir: None,
        };
    }
}

// Everything optional: a config file only overrides what it names.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub api_base: Option<String>,
    pub port: Option<u16>,
    pub poll_interval_ms: Option<u64>,
    pub fetch_timeout_ms: Option<u64>,
    pub viewport: Option<Viewport>,
    pub line: Option<String>,
    pub log_dir: Option<String>,
}

pub fn config_file_from_path<P: AsRef<std::path::Path>>(path: P) -> result::SeguiResult<ConfigFile> {
    let debug_path = path.as_ref().to_str().map(|x| x.to_string());
    let file = std::fs::File::open(path)
        .with_context(|| format!("Opening config from '{:?}'", debug_path))?;
    let reader = std::io::BufReader::new(file);
    let config: ConfigFile = serde_json::from_reader(reader)
        .with_context(|| format!("while parsing config"))?;
    return Ok(config);
}

impl Config {
    pub fn apply_file(&mut self, file: ConfigFile) -> result::SeguiResult<()> {
        if let Some(api_base) = file.api_base {
            self.api_base = api_base;
        }
        if let Some(port) = file.port {
            self.port = port;
        }
        if let Some(ms) = file.poll_interval_ms {
            self.poll_interval = positive_millis("Poll interval", ms)?;
        }
        if let Some(ms) = file.fetch_timeout_ms {
            self.fetch_timeout = positive_millis("Fetch timeout", ms)?;
        }
        if let Some(viewport) = file.viewport {
            self.viewport = viewport;
        }
        if file.line.is_some() {
            self.initial_line = file.line;
        }
        if file.log_dir.is_some() {
            self.log_dir = file.log_dir;
        }
        return Ok(());
    }

    pub fn apply_matches(&mut self, matches: &getopts::Matches) -> result::SeguiResult<()> {
        if let Some(api_base) = matches.opt_str("api-base") {
            self.api_base = api_base;
        }
        if let Some(port) = matches.opt_str("port") {
            self.port = port.parse::<u16>().map_err(|_| result::make_error(
                &format!("Invalid port: {}", port)))?;
        }
        if let Some(ms) = matches.opt_str("interval-ms") {
            let ms = ms.parse::<u64>().map_err(|_| result::make_error(
                &format!("Invalid interval: {}", ms)))?;
            self.poll_interval = positive_millis("Poll interval", ms)?;
        }
        if let Some(line) = matches.opt_str("line") {
            self.initial_line = Some(line);
        }
        if let Some(path) = matches.opt_str("save-image") {
            self.save_image = Some(path);
        }
        if matches.opt_present("one-shot") {
            self.one_shot = true;
        }
        if let Some(dir) = matches.opt_str("log-dir") {
            self.log_dir = Some(dir);
        }
        return Ok(());
    }
}

// A zero period would make the poller spin against the backend.
fn positive_millis(what: &str, ms: u64) -> result::SeguiResult<std::time::Duration> {
    if ms == 0 {
        return Err(result::make_error(&format!("{} must be positive", what)));
    }
    return Ok(std::time::Duration::from_millis(ms));
}

pub fn options() -> getopts::Options {
    let mut opts = getopts::Options::new();
    opts.optopt("p", "port", "Port for the web view.", "PORT");
    opts.optopt("a", "api-base", "Base URL of the vehicle API.", "URL");
    opts.optopt("l", "line", "Start tracking this line right away.", "LINE");
    opts.optopt("n", "interval-ms", "Refresh period in milliseconds.", "MILLIS");
    opts.optopt("c", "config", "JSON config file.", "FILENAME");
    opts.optopt("i", "save-image", "Where to put a png.", "FILENAME");
    opts.optflag("o", "one-shot", "Fetch once, render, and exit.");
    opts.optopt("", "log-dir", "Also write logs to files in this directory.", "DIR");
    opts.optflag("h", "help", "Print this help.");
    return opts;
}

// Defaults, then the config file, then flags.
pub fn load(matches: &getopts::Matches) -> result::SeguiResult<Config> {
    let mut config = Config::default();
    if let Some(path) = matches.opt_str("config") {
        config.apply_file(config_file_from_path(&path)?)?;
    }
    config.apply_matches(matches)?;
    return Ok(config);
}

#[cfg(test)]
mod tests {
    use super::{Config, ConfigFile};

    fn parse(args: &[&str]) -> getopts::Matches {
        return super::options().parse(args).expect("parse opts");
    }

    #[test]
    fn defaults_match_turin_map() {
        let config = super::load(&parse(&[])).expect("load");

        assert_eq!("http://localhost:8000", config.api_base);
        assert_eq!(std::time::Duration::from_secs(2), config.poll_interval);
        assert_eq!(45.0703, config.viewport.center_lat);
        assert_eq!(7.6869, config.viewport.center_lon);
        assert_eq!(13, config.viewport.zoom);
        assert_eq!(None, config.initial_line);
    }

    #[test]
    fn flags_override_file() {
        let file: ConfigFile = serde_json::from_str(
            r#"{"api_base": "http://gtt.example", "port": 9000, "line": "4"}"#)
            .expect("Error parsing JSON");

        let mut config = Config::default();
        config.apply_file(file).expect("apply_file");
        config.apply_matches(&parse(&["--port", "9100", "-n", "500", "-o"])).expect("apply");

        assert_eq!("http://gtt.example", config.api_base);
        assert_eq!(9100, config.port);
        assert_eq!(std::time::Duration::from_millis(500), config.poll_interval);
        assert_eq!(Some("4".to_string()), config.initial_line);
        assert!(config.one_shot);
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let mut config = Config::default();
        assert!(config.apply_matches(&parse(&["--port", "eighty"])).is_err());
        assert!(config.apply_matches(&parse(&["--interval-ms", "0"])).is_err());
    }

    #[test]
    fn zero_durations_in_file_are_rejected() {
        let file: ConfigFile = serde_json::from_str(r#"{"poll_interval_ms": 0}"#)
            .expect("Error parsing JSON");
        let mut config = Config::default();
        assert!(config.apply_file(file).is_err());
        assert_eq!(std::time::Duration::from_secs(2), config.poll_interval);

        let file: ConfigFile = serde_json::from_str(r#"{"fetch_timeout_ms": 0}"#)
            .expect("Error parsing JSON");
        assert!(config.apply_file(file).is_err());
        assert_eq!(std::time::Duration::from_secs(5), config.fetch_timeout);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        assert!(super::config_file_from_path("testdata/does-not-exist.json").is_err());
    }
}
