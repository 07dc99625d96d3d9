extern crate anyhow;
extern crate chrono;
extern crate chrono_tz;
extern crate flexi_logger;
extern crate getopts;
extern crate image;
extern crate imageproc;
extern crate reqwest;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

mod api;
mod config;
mod controller;
mod map;
mod page;
mod render;
mod result;
mod server;
mod vehicle;

use std::sync::Arc;

fn init_logging(log_dir: Option<&str>) -> result::SeguiResult<flexi_logger::LoggerHandle> {
    let mut logger = flexi_logger::Logger::try_with_env_or_str("info")
        .map_err(|e| result::make_error(&format!("Invalid log level: {}", e)))?
        .format(flexi_logger::detailed_format);

    if let Some(dir) = log_dir {
        logger = logger
            .log_to_file(flexi_logger::FileSpec::default().directory(dir).basename("seguigtt"))
            .duplicate_to_stderr(flexi_logger::Duplicate::Info);
    }

    return logger.start().map_err(|e| result::make_error(&format!("Starting logger: {}", e)));
}

fn refresh_secs(interval: std::time::Duration) -> u64 {
    let millis = interval.as_millis() as u64;
    return std::cmp::max(1, (millis + 999) / 1000);
}

fn one_shot(controller: &controller::QueryController, config: &config::Config) -> result::SeguiResult<()> {
    let line = config.initial_line.as_ref().ok_or(
        result::make_error("--one-shot needs a line (--line or config file)"))?;
    controller.submit_line(line)?;
    controller.shutdown();

    let state = controller.state();
    let markers = render::project(&state.vehicles);
    info!("Line {}: {} vehicles", state.line, markers.len());
    for marker in &markers {
        info!("{} at ({}, {}): {}, {}, occupazione {}, fermata {}",
              marker.popup.title, marker.lat, marker.lon,
              marker.popup.accessibility.text, marker.popup.last_update,
              marker.popup.occupancy.text, marker.popup.nearest_stop.text);
    }

    if let Some(ref png_out) = config.save_image {
        let imgbuf = map::generate_image(&markers, &config.viewport, &map::Styles::default());
        imgbuf.save(png_out)?;
        info!("Wrote {}", png_out);
    }

    return Ok(());
}

fn run(matches: &getopts::Matches) -> result::SeguiResult<()> {
    let config = config::load(matches)?;
    let _logger = init_logging(config.log_dir.as_ref().map(String::as_str))?;

    info!("Running. api_base={} port={} interval={:?} one-shot={}",
          config.api_base, config.port, config.poll_interval, config.one_shot);

    let source = Arc::new(api::HttpVehicleSource::new(&config.api_base, config.fetch_timeout)?);
    let controller = Arc::new(controller::QueryController::new(source, config.poll_interval));

    if config.one_shot {
        return one_shot(&controller, &config);
    }

    if let Some(ref line) = config.initial_line {
        controller.submit_line(line)?;
    }

    let result = server::run_server(config.port, server::WebView{
        controller: controller.clone(),
        viewport: config.viewport.clone(),
        styles: map::Styles::default(),
        refresh_secs: refresh_secs(config.poll_interval),
    });
    controller.shutdown();
    return result;
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let opts = config::options();
    let brief = format!("Usage: {} [options]", args[0]);

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(err) => {
            eprintln!("{}\n{}", err, opts.usage(&brief));
            std::process::exit(2);
        },
    };

    if matches.opt_present("help") {
        print!("{}", opts.usage(&brief));
        return;
    }

    if let Err(err) = run(&matches) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn refresh_rounds_up_to_whole_seconds() {
        assert_eq!(2, super::refresh_secs(std::time::Duration::from_millis(2000)));
        assert_eq!(2, super::refresh_secs(std::time::Duration::from_millis(1500)));
        assert_eq!(1, super::refresh_secs(std::time::Duration::from_millis(20)));
    }
}
