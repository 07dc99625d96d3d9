extern crate chrono;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::api;
use crate::result;
use crate::vehicle::{Vehicle, ViewState};

/// Owns the selected line and the vehicles last fetched for it.
///
/// A line is fetched once when submitted and then once per `interval` on a
/// background worker until a different line is submitted or the controller
/// is shut down. At most one worker exists at a time.
pub struct QueryController {
    source: Arc<dyn api::VehicleSource>,
    state: Arc<Mutex<ViewState>>,
    poller: Mutex<Option<Poller>>,
    interval: std::time::Duration,
    active_pollers: Arc<AtomicUsize>,
}

impl QueryController {
    pub fn new(source: Arc<dyn api::VehicleSource>, interval: std::time::Duration) -> QueryController {
        return QueryController{
            source: source,
            state: Arc::new(Mutex::new(ViewState::empty())),
            poller: Mutex::new(None),
            interval: interval,
            active_pollers: Arc::new(AtomicUsize::new(0)),
        };
    }

    /// Blank input is ignored. Otherwise the line becomes `raw` (verbatim)
    /// and is fetched before returning.
    ///
    /// On a line change the previous worker is told to stop under the lock
    /// but joined after it is released. The call still blocks until that
    /// worker's in-flight fetch returns (bounded by the fetch timeout).
    pub fn submit_line(&self, raw: &str) -> result::SeguiResult<()> {
        if raw.trim().is_empty() {
            debug!("Ignoring empty line submission");
            return Ok(());
        }

        let old = {
            let mut poller = lock(&self.poller);
            let changed = {
                let mut state = lock(&self.state);
                if state.line == raw {
                    false
                } else {
                    state.line = raw.to_string();
                    true
                }
            };

            if changed {
                info!("Tracking line {}", raw);
                let old = poller.take();
                if let Some(ref old) = old {
                    old.signal();
                }
                *poller = Some(Poller::spawn(
                    raw.to_string(),
                    self.interval,
                    self.source.clone(),
                    self.state.clone(),
                    self.active_pollers.clone())?);
                old
            } else {
                None
            }
        };

        if let Some(old) = old {
            old.stop();
        }

        refresh(&*self.source, &self.state, raw);
        return Ok(());
    }

    pub fn state(&self) -> ViewState {
        return lock(&self.state).clone();
    }

    pub fn active_pollers(&self) -> usize {
        return self.active_pollers.load(Ordering::SeqCst);
    }

    pub fn shutdown(&self) {
        let poller = lock(&self.poller).take();
        if let Some(poller) = poller {
            poller.stop();
        }
    }
}

impl Drop for QueryController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// A poisoned lock only means a worker panicked mid-update; the data is
// still a whole ViewState.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<T> {
    return mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
}

fn refresh(source: &dyn api::VehicleSource, state: &Mutex<ViewState>, line: &str) {
    let fetched = source.fetch_vehicles(line);
    apply_fetch(state, line, fetched);
}

/// Applies the result of a fetch issued for `line`. Errors are logged and
/// dropped; responses for a line that is no longer selected are discarded.
pub fn apply_fetch(state: &Mutex<ViewState>, line: &str, fetched: result::SeguiResult<Vec<Vehicle>>) {
    let mut state = lock(state);
    if state.line != line {
        debug!("Discarding response for line {} (now tracking {})", line, state.line);
        return;
    }

    match fetched {
        Ok(vehicles) => {
            debug!("Line {}: {} vehicles", line, vehicles.len());
            state.vehicles = vehicles;
            state.last_update = Some(chrono::Utc::now());
        },
        Err(err) => error!("Fetching line {}: {}", line, err),
    }
}

struct Poller {
    stop_tx: mpsc::Sender<()>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl Poller {
    fn spawn(line: String,
             interval: std::time::Duration,
             source: Arc<dyn api::VehicleSource>,
             state: Arc<Mutex<ViewState>>,
             active: Arc<AtomicUsize>) -> result::SeguiResult<Poller> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        active.fetch_add(1, Ordering::SeqCst);
        let worker_active = active.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("poll-{}", line))
            .spawn(move || {
                // Ticks are scheduled from the start, not from the end of the
                // previous fetch. Ticks missed behind a slow fetch are skipped.
                let mut next = std::time::Instant::now() + interval;
                loop {
                    let wait = next.saturating_duration_since(std::time::Instant::now());
                    match stop_rx.recv_timeout(wait) {
                        Err(mpsc::RecvTimeoutError::Timeout) => {
                            refresh(&*source, &state, &line);
                            let now = std::time::Instant::now();
                            next = next + interval;
                            while next <= now {
                                next = next + interval;
                            }
                        },
                        _ => break,
                    }
                }
                debug!("Stopped polling line {}", line);
                worker_active.fetch_sub(1, Ordering::SeqCst);
            });

        match spawned {
            Ok(handle) => {
                return Ok(Poller{
                    stop_tx: stop_tx,
                    handle: Some(handle),
                });
            },
            Err(err) => {
                active.fetch_sub(1, Ordering::SeqCst);
                return Err(err.into());
            },
        }
    }

    fn signal(&self) {
        let _ = self.stop_tx.send(());
    }

    // Waits for an in-flight tick to finish, so the worker is gone on return.
    fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        self.signal();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Polling worker panicked");
            }
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.halt();
    }
}
