//! Board controller
//!
//! Owns the open route and its poll timer, and processes commands from the
//! frontend through a single crossbeam channel. Fetches run on worker
//! threads and report back through the same channel.

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use chrono::Local;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use busboard::config::poll;
use busboard::i18n::Language;
use busboard::map::MapMessage;
use busboard::transit::{Route, RouteBoard, StopEta};

use crate::config::controller::{COMMAND_CAPACITY, TICK_MS};
use crate::error::Result;
use crate::providers::TransitProvider;

use super::fetcher::fetch_board;
use super::state::{BoardCommand, BoardSnapshot};

fn clamp(interval: Duration) -> Duration {
    Duration::from_secs(poll::clamp_interval(interval.as_secs()))
}

/// Same stops in the same order
fn same_layout(a: &[StopEta], b: &[StopEta]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(x, y)| x.seq == y.seq && x.info.stop == y.info.stop)
}

pub struct BoardController {
    cmd_rx: Receiver<BoardCommand>,
    cmd_tx: Sender<BoardCommand>,
    shared_state: Arc<Mutex<BoardSnapshot>>,
    provider: Arc<dyn TransitProvider>,
    route: Option<Route>,
    language: Language,
    interval: Duration,
    /// Monotonically increasing counter to discard stale fetch results
    generation: u64,
    /// A poll of the current generation is running
    in_flight: bool,
    /// When the next poll is due; `None` while no route is open
    next_poll: Option<Instant>,
}

impl BoardController {
    pub fn new(
        cmd_rx: Receiver<BoardCommand>,
        cmd_tx: Sender<BoardCommand>,
        shared_state: Arc<Mutex<BoardSnapshot>>,
        provider: Arc<dyn TransitProvider>,
    ) -> Self {
        let (language, interval) = {
            let state = shared_state.lock().unwrap_or_else(|e| e.into_inner());
            (state.language, clamp(state.interval))
        };

        Self {
            cmd_rx,
            cmd_tx,
            shared_state,
            provider,
            route: None,
            language,
            interval,
            generation: 0,
            in_flight: false,
            next_poll: None,
        }
    }

    /// Run the controller event loop (blocking, call from a dedicated thread)
    pub fn run(&mut self) {
        loop {
            match self.cmd_rx.recv_timeout(Duration::from_millis(TICK_MS)) {
                Ok(cmd) => {
                    if self.handle_command(cmd) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            if self.poll_due() {
                self.start_poll();
            }
        }
        log::debug!("Board controller stopped");
    }

    /// Handle a single command. Returns true if the loop should exit.
    fn handle_command(&mut self, cmd: BoardCommand) -> bool {
        match cmd {
            BoardCommand::Shutdown => return true,

            BoardCommand::Open(route) => self.open(route),
            BoardCommand::Close => self.close(),
            BoardCommand::Refresh => {
                if self.route.is_some() && !self.in_flight {
                    self.next_poll = Some(Instant::now());
                }
            }
            BoardCommand::SetInterval(interval) => {
                self.interval = clamp(interval);
                if self.route.is_some() && !self.in_flight {
                    self.next_poll = Some(Instant::now() + self.interval);
                }
                self.lock().interval = self.interval;
                log::info!("Poll interval set to {}s", self.interval.as_secs());
            }
            BoardCommand::SetLanguage(language) => {
                if language != self.language {
                    self.language = language;
                    self.lock().language = language;
                    // Rendered ETAs are language-specific; re-fetch now
                    if self.route.is_some() {
                        self.bump_generation();
                        self.next_poll = Some(Instant::now());
                    }
                }
            }
            BoardCommand::SelectStop(index) => self.select(index),
            BoardCommand::BoardFetched { generation, result } => {
                self.handle_board_fetched(generation, result);
            }
            BoardCommand::StopFetched {
                generation,
                index,
                stop,
            } => {
                self.handle_stop_fetched(generation, index, stop);
            }
        }
        false
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BoardSnapshot> {
        self.shared_state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn bump_generation(&mut self) {
        self.generation += 1;
        self.in_flight = false;
    }

    fn poll_due(&self) -> bool {
        !self.in_flight && self.next_poll.is_some_and(|at| Instant::now() >= at)
    }

    fn open(&mut self, route: Route) {
        log::info!("Opening route {}", route.key());
        self.bump_generation();
        self.next_poll = Some(Instant::now());
        {
            let mut state = self.lock();
            state.clear_board();
            state.route = Some(route.clone());
        }
        self.route = Some(route);
    }

    /// Stop the poll timer and drop the board
    fn close(&mut self) {
        if let Some(route) = self.route.take() {
            log::info!("Closing route {}", route.key());
        }
        self.bump_generation();
        self.next_poll = None;
        self.lock().clear_board();
    }

    fn select(&mut self, index: Option<usize>) {
        let mut state = self.lock();
        match index {
            Some(i) if i < state.stops.len() => {
                state.selected = Some(i);
                state.push_map_message(MapMessage::CenterStop { index: i });
            }
            Some(i) => {
                log::debug!("Ignoring selection of stop {i} (have {})", state.stops.len());
            }
            None => state.selected = None,
        }
    }

    /// Fetch the open route on a worker thread, then send the result back.
    fn start_poll(&mut self) {
        let Some(route) = self.route.clone() else {
            self.next_poll = None;
            return;
        };

        self.in_flight = true;
        self.next_poll = None;
        let generation = self.generation;
        let language = self.language;
        let provider = Arc::clone(&self.provider);
        let cmd_tx = self.cmd_tx.clone();

        self.lock().is_loading = true;
        log::info!("Polling route {} (generation {generation})", route.key());

        let spawned = std::thread::Builder::new()
            .name("board-fetch".into())
            .spawn(move || {
                let stop_tx = cmd_tx.clone();
                let on_stop = |index: usize, stop: &StopEta| {
                    let _ = stop_tx.send(BoardCommand::StopFetched {
                        generation,
                        index,
                        stop: stop.clone(),
                    });
                };
                let result = fetch_board(provider.as_ref(), &route, language, Local::now, on_stop)
                    .map_err(|e| e.to_string());
                let _ = cmd_tx.send(BoardCommand::BoardFetched { generation, result });
            });

        if let Err(e) = spawned {
            log::error!("Failed to spawn fetch thread: {e}");
            self.in_flight = false;
            self.next_poll = Some(Instant::now() + self.interval);
            let mut state = self.lock();
            state.is_loading = false;
            state.last_error = Some(e.to_string());
        }
    }

    /// Results with a stale `generation` are discarded.
    fn handle_board_fetched(
        &mut self,
        generation: u64,
        result: std::result::Result<RouteBoard, String>,
    ) {
        if generation != self.generation {
            log::warn!(
                "Discarding stale board (generation {generation}, current {})",
                self.generation
            );
            return;
        }

        self.in_flight = false;
        self.next_poll = Some(Instant::now() + self.interval);

        let mut state = self.lock();
        state.is_loading = false;
        match result {
            Ok(board) => {
                log::info!(
                    "Route {}: {} stops, {} unavailable",
                    board.route.key(),
                    board.stops.len(),
                    board.failed
                );
                if !same_layout(&state.stops, &board.stops) {
                    state.layout_version += 1;
                }
                state.stops = board.stops;
                if state.selected.is_some_and(|i| i >= state.stops.len()) {
                    state.selected = None;
                }
                state.failed_stops = board.failed;
                state.last_updated = Some(board.fetched_at);
                state.last_error = None;
                state.poll_count += 1;
            }
            Err(e) => {
                // Keep the previous board on screen
                log::error!("Fetching stops failed: {e}");
                state.last_error = Some(e);
            }
        }
    }

    /// Update one stop in place as the poll progresses
    fn handle_stop_fetched(&mut self, generation: u64, index: usize, stop: StopEta) {
        if generation != self.generation {
            log::debug!("Discarding stale stop {index} (generation {generation})");
            return;
        }

        let mut state = self.lock();
        let existing = state
            .stops
            .iter()
            .position(|s| s.seq == stop.seq && s.info.stop == stop.info.stop);

        match existing {
            Some(pos) => {
                let eta = stop.eta.clone();
                state.stops[pos] = stop;
                state.push_map_message(MapMessage::UpdateEta { index: pos, eta });
            }
            None => {
                // Shifts later indices, so no UpdateEta for this one
                let pos = state.stops.partition_point(|s| s.seq < stop.seq);
                if state.poll_count > 0 {
                    log::debug!("Stop {} joined the board at {pos}", stop.info.stop);
                }
                state.stops.insert(pos, stop);
                state.layout_version += 1;
            }
        }
    }
}

/// Handle to a controller running on its own thread
pub struct BoardHandle {
    cmd_tx: Sender<BoardCommand>,
    state: Arc<Mutex<BoardSnapshot>>,
    thread: Option<JoinHandle<()>>,
}

impl BoardHandle {
    /// Start a controller thread
    pub fn spawn(
        provider: Arc<dyn TransitProvider>,
        language: Language,
        interval: Duration,
    ) -> Result<Self> {
        let (cmd_tx, cmd_rx) = bounded(COMMAND_CAPACITY);
        let mut snapshot = BoardSnapshot::default();
        snapshot.language = language;
        snapshot.interval = clamp(interval);
        let state = Arc::new(Mutex::new(snapshot));

        let ctrl_tx = cmd_tx.clone();
        let ctrl_state = Arc::clone(&state);
        let thread = std::thread::Builder::new()
            .name("board-controller".into())
            .spawn(move || {
                let mut ctrl = BoardController::new(cmd_rx, ctrl_tx, ctrl_state, provider);
                ctrl.run();
            })?;

        Ok(Self {
            cmd_tx,
            state,
            thread: Some(thread),
        })
    }

    pub fn send(&self, cmd: BoardCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            log::warn!("Board controller is gone; command dropped");
        }
    }

    /// Copy of the current board state
    pub fn snapshot(&self) -> BoardSnapshot {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn drain_map_messages(&self) -> Vec<MapMessage> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain_map_messages()
    }

    /// Stop the controller and wait for its thread
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.cmd_tx.send(BoardCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for BoardHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::mock::MockProvider;

    const WAIT: Duration = Duration::from_secs(3);

    fn wait_for(handle: &BoardHandle, pred: impl Fn(&BoardSnapshot) -> bool) -> BoardSnapshot {
        let start = Instant::now();
        loop {
            let snap = handle.snapshot();
            if pred(&snap) || start.elapsed() > WAIT {
                return snap;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    fn spawn(provider: MockProvider) -> (BoardHandle, Arc<MockProvider>, Route) {
        let provider = Arc::new(provider);
        let route = provider.routes[0].clone();
        let handle = BoardHandle::spawn(
            provider.clone() as Arc<dyn TransitProvider>,
            Language::En,
            Duration::from_secs(20),
        )
        .unwrap();
        (handle, provider, route)
    }

    #[test]
    fn test_open_fetches_immediately() {
        let (handle, _, route) = spawn(MockProvider::sample(Local::now()));
        handle.send(BoardCommand::Open(route.clone()));

        let snap = wait_for(&handle, |s| s.poll_count == 1);
        assert_eq!(snap.poll_count, 1);
        assert_eq!(snap.route, Some(route));
        assert_eq!(snap.stops.len(), 3);
        assert!(!snap.is_loading);
        assert!(snap.last_updated.is_some());
        assert!(snap.last_error.is_none());
        handle.shutdown();
    }

    /// Controller driven on the test thread instead of its own loop
    fn controller(provider: &Arc<MockProvider>) -> BoardController {
        let (cmd_tx, cmd_rx) = bounded(COMMAND_CAPACITY);
        let state = Arc::new(Mutex::new(BoardSnapshot::default()));
        BoardController::new(cmd_rx, cmd_tx, state, provider.clone())
    }

    /// Feed worker results back until the running poll reports its board
    fn complete_poll(ctrl: &mut BoardController) {
        loop {
            let cmd = ctrl.cmd_rx.recv_timeout(WAIT).unwrap();
            let done = matches!(cmd, BoardCommand::BoardFetched { .. });
            ctrl.handle_command(cmd);
            if done {
                return;
            }
        }
    }

    fn due_in(ctrl: &BoardController) -> Duration {
        ctrl.next_poll.unwrap().saturating_duration_since(Instant::now())
    }

    #[test]
    fn test_spawn_seeds_snapshot() {
        let provider = Arc::new(MockProvider::sample(Local::now()));
        let handle = BoardHandle::spawn(provider, Language::En, Duration::from_secs(45)).unwrap();
        let snap = handle.snapshot();
        assert_eq!(snap.language, Language::En);
        assert_eq!(snap.interval, Duration::from_secs(45));
        assert!(snap.route.is_none());
        handle.shutdown();
    }

    #[test]
    fn test_timer_repolls_after_interval() {
        let provider = Arc::new(MockProvider::sample(Local::now()));
        let mut ctrl = controller(&provider);
        ctrl.handle_command(BoardCommand::Open(provider.routes[0].clone()));
        assert!(ctrl.poll_due());

        ctrl.start_poll();
        assert!(!ctrl.poll_due());
        complete_poll(&mut ctrl);
        assert_eq!(provider.list_calls(), 1);
        assert!(!ctrl.poll_due());
        let until = due_in(&ctrl);
        assert!(until > Duration::from_secs(19) && until <= Duration::from_secs(20));

        let layout = ctrl.lock().layout_version;
        ctrl.next_poll = Some(Instant::now() - Duration::from_millis(1));
        assert!(ctrl.poll_due());
        ctrl.start_poll();
        complete_poll(&mut ctrl);

        assert_eq!(provider.list_calls(), 2);
        let state = ctrl.lock();
        assert_eq!(state.poll_count, 2);
        assert_eq!(state.layout_version, layout);
    }

    #[test]
    fn test_set_interval_reschedules() {
        let provider = Arc::new(MockProvider::sample(Local::now()));
        let mut ctrl = controller(&provider);
        ctrl.handle_command(BoardCommand::Open(provider.routes[0].clone()));
        ctrl.start_poll();
        complete_poll(&mut ctrl);

        ctrl.handle_command(BoardCommand::SetInterval(Duration::from_secs(45)));
        let until = due_in(&ctrl);
        assert!(until > Duration::from_secs(44) && until <= Duration::from_secs(45));
        assert_eq!(ctrl.lock().interval, Duration::from_secs(45));

        // While a poll runs the new interval applies once it completes
        ctrl.start_poll();
        ctrl.handle_command(BoardCommand::SetInterval(Duration::from_secs(30)));
        assert!(ctrl.next_poll.is_none());
        complete_poll(&mut ctrl);
        let until = due_in(&ctrl);
        assert!(until > Duration::from_secs(29) && until <= Duration::from_secs(30));

        ctrl.handle_command(BoardCommand::Close);
        ctrl.handle_command(BoardCommand::SetInterval(Duration::from_secs(50)));
        assert!(ctrl.next_poll.is_none());
    }

    #[test]
    fn test_recovered_stop_changes_layout() {
        let provider = Arc::new(MockProvider::sample(Local::now()).failing_stop("S2"));
        let mut ctrl = controller(&provider);
        ctrl.handle_command(BoardCommand::Open(provider.routes[0].clone()));
        ctrl.start_poll();
        complete_poll(&mut ctrl);
        let layout = {
            let mut state = ctrl.lock();
            assert_eq!(state.stops.len(), 2);
            state.drain_map_messages();
            state.layout_version
        };

        provider.set_stop_failing("S2", false);
        ctrl.start_poll();
        complete_poll(&mut ctrl);
        let layout = {
            let mut state = ctrl.lock();
            assert_eq!(state.stops.len(), 3);
            assert!(state.layout_version > layout);
            // S3 moved to index 2; its update addresses the new position
            let messages = state.drain_map_messages();
            assert_eq!(messages.len(), 2);
            assert!(matches!(messages[0], MapMessage::UpdateEta { index: 0, .. }));
            assert!(matches!(messages[1], MapMessage::UpdateEta { index: 2, .. }));
            state.layout_version
        };

        provider.set_stop_failing("S2", true);
        ctrl.start_poll();
        complete_poll(&mut ctrl);
        let state = ctrl.lock();
        assert_eq!(state.stops.len(), 2);
        assert!(state.layout_version > layout);
    }

    #[test]
    fn test_interval_is_clamped() {
        let provider = Arc::new(MockProvider::sample(Local::now()));
        let handle = BoardHandle::spawn(provider, Language::En, Duration::from_secs(1)).unwrap();
        assert_eq!(handle.snapshot().interval, Duration::from_secs(20));

        handle.send(BoardCommand::SetInterval(Duration::from_secs(300)));
        let snap = wait_for(&handle, |s| s.interval == Duration::from_secs(60));
        assert_eq!(snap.interval, Duration::from_secs(60));
        handle.shutdown();
    }

    #[test]
    fn test_close_discards_in_flight_poll() {
        let (handle, provider, route) =
            spawn(MockProvider::sample(Local::now()).with_delay(Duration::from_millis(300)));
        handle.send(BoardCommand::Open(route));
        wait_for(&handle, |_| provider.list_calls() == 1);
        handle.send(BoardCommand::Close);

        // Let the delayed fetch finish and report
        std::thread::sleep(Duration::from_millis(600));
        let snap = handle.snapshot();
        assert!(snap.route.is_none());
        assert!(snap.stops.is_empty());
        assert_eq!(snap.poll_count, 0);
        handle.shutdown();
    }

    #[test]
    fn test_reopen_keeps_only_latest_route() {
        let (handle, provider, route) =
            spawn(MockProvider::sample(Local::now()).with_delay(Duration::from_millis(200)));
        let other = provider.routes[1].clone();

        handle.send(BoardCommand::Open(route));
        wait_for(&handle, |_| provider.list_calls() == 1);
        handle.send(BoardCommand::Open(other.clone()));

        let snap = wait_for(&handle, |s| s.poll_count == 1);
        std::thread::sleep(Duration::from_millis(300));
        let snap2 = handle.snapshot();
        assert_eq!(snap.route, Some(other));
        assert_eq!(snap2.stops.len(), 1);
        assert_eq!(snap2.stops[0].info.stop, "T1");
        assert_eq!(snap2.poll_count, 1);
        handle.shutdown();
    }

    #[test]
    fn test_stop_list_failure_keeps_board() {
        let (handle, _, route) = spawn(MockProvider::sample(Local::now()).failing_list());
        handle.send(BoardCommand::Open(route));

        let snap = wait_for(&handle, |s| s.last_error.is_some());
        assert!(snap.last_error.unwrap().contains("stop list unavailable"));
        assert!(snap.stops.is_empty());
        assert!(!snap.is_loading);
        assert_eq!(snap.poll_count, 0);
        handle.shutdown();
    }

    #[test]
    fn test_failed_stops_counted() {
        let (handle, _, route) = spawn(MockProvider::sample(Local::now()).failing_stop("S3"));
        handle.send(BoardCommand::Open(route));

        let snap = wait_for(&handle, |s| s.poll_count == 1);
        assert_eq!(snap.failed_stops, 1);
        assert_eq!(snap.stops.len(), 2);
        handle.shutdown();
    }

    #[test]
    fn test_refresh_updates_eta_messages() {
        let (handle, _, route) = spawn(MockProvider::sample(Local::now()));
        handle.send(BoardCommand::Open(route));
        wait_for(&handle, |s| s.poll_count == 1);
        // First load inserts stops without update messages
        assert!(handle.drain_map_messages().is_empty());

        handle.send(BoardCommand::Refresh);
        wait_for(&handle, |s| s.poll_count == 2);
        let messages = handle.drain_map_messages();
        assert_eq!(messages.len(), 3);
        assert!(matches!(messages[0], MapMessage::UpdateEta { index: 0, .. }));
        handle.shutdown();
    }

    #[test]
    fn test_select_stop() {
        let (handle, _, route) = spawn(MockProvider::sample(Local::now()));
        handle.send(BoardCommand::Open(route));
        wait_for(&handle, |s| s.poll_count == 1);

        handle.send(BoardCommand::SelectStop(Some(9)));
        handle.send(BoardCommand::SelectStop(Some(1)));
        let snap = wait_for(&handle, |s| s.selected.is_some());
        assert_eq!(snap.selected, Some(1));
        assert_eq!(
            handle.drain_map_messages(),
            vec![MapMessage::CenterStop { index: 1 }]
        );

        handle.send(BoardCommand::SelectStop(None));
        let snap = wait_for(&handle, |s| s.selected.is_none());
        assert!(snap.selected.is_none());
        handle.shutdown();
    }

    #[test]
    fn test_language_change_refetches() {
        let (handle, _, route) = spawn(MockProvider::sample(Local::now()));
        handle.send(BoardCommand::Open(route));
        let snap = wait_for(&handle, |s| s.poll_count == 1);
        assert_eq!(snap.stops[1].eta, vec!["Arriving soon"]);

        handle.send(BoardCommand::SetLanguage(Language::Zh));
        let snap = wait_for(&handle, |s| s.poll_count == 2);
        assert_eq!(snap.language, Language::Zh);
        assert_eq!(snap.stops[1].eta, vec!["即將到達"]);
        handle.shutdown();
    }
}
