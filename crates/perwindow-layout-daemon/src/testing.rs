//! In-memory stand-ins for Hyprland used across the daemon's tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::time::Instant;

use crate::hypr_ipc::{
    Connector, Controller, DevicesResponse, EventSource, HyprError, HyprEvent, Keyboard,
};

#[derive(Debug)]
struct FakeKeyboard {
    short_names: Vec<String>,
    keymaps: Vec<String>,
    active: usize,
    /// Keymap reported until the first switch, if it differs from `keymaps[active]`
    initial_keymap: Option<String>,
    switches: Vec<usize>,
    devices_calls: usize,
    fail_switches: bool,
    /// Switches allowed before every further switch fails
    switch_budget: Option<usize>,
    fail_devices: bool,
    no_keyboards: bool,
}

/// A single main keyboard whose layouts are `(short name, keymap)` pairs
#[derive(Debug)]
pub struct FakeController {
    state: Mutex<FakeKeyboard>,
}

impl FakeController {
    pub fn new(layouts: &[(&str, &str)], active: usize) -> Self {
        Self {
            state: Mutex::new(FakeKeyboard {
                short_names: layouts.iter().map(|(short, _)| short.to_string()).collect(),
                keymaps: layouts.iter().map(|(_, keymap)| keymap.to_string()).collect(),
                active,
                initial_keymap: None,
                switches: Vec::new(),
                devices_calls: 0,
                fail_switches: false,
                switch_budget: None,
                fail_devices: false,
                no_keyboards: false,
            }),
        }
    }

    pub fn with_initial_keymap(self, keymap: &str) -> Self {
        self.state.lock().unwrap().initial_keymap = Some(keymap.to_string());
        self
    }

    pub fn switches(&self) -> Vec<usize> {
        self.state.lock().unwrap().switches.clone()
    }

    pub fn clear_switches(&self) {
        self.state.lock().unwrap().switches.clear();
    }

    pub fn active(&self) -> usize {
        self.state.lock().unwrap().active
    }

    pub fn devices_calls(&self) -> usize {
        self.state.lock().unwrap().devices_calls
    }

    pub fn set_fail_switches(&self, fail: bool) {
        self.state.lock().unwrap().fail_switches = fail;
    }

    pub fn set_switch_budget(&self, switches: usize) {
        self.state.lock().unwrap().switch_budget = Some(switches);
    }

    pub fn set_fail_devices(&self, fail: bool) {
        self.state.lock().unwrap().fail_devices = fail;
    }

    pub fn set_no_keyboards(&self, none: bool) {
        self.state.lock().unwrap().no_keyboards = none;
    }
}

fn controller_failure(command: String) -> HyprError {
    HyprError::ControllerFailed {
        command,
        status: "exit status: 1".to_string(),
        output: "fake failure".to_string(),
    }
}

#[async_trait]
impl Controller for FakeController {
    async fn devices(&self) -> Result<DevicesResponse, HyprError> {
        let mut state = self.state.lock().unwrap();
        state.devices_calls += 1;
        if state.fail_devices {
            return Err(controller_failure("hyprctl devices -j".to_string()));
        }
        if state.no_keyboards {
            return Ok(DevicesResponse::default());
        }

        let active_keymap = match (&state.initial_keymap, state.switches.is_empty()) {
            (Some(initial), true) => initial.clone(),
            _ => state.keymaps.get(state.active).cloned().unwrap_or_default(),
        };

        Ok(DevicesResponse {
            keyboards: vec![Keyboard {
                name: "fake-keyboard".to_string(),
                layout: state.short_names.join(","),
                active_keymap,
                main: true,
            }],
        })
    }

    async fn switch_layout(&self, index: usize) -> Result<(), HyprError> {
        let mut state = self.state.lock().unwrap();
        let command = format!("hyprctl switchxkblayout all {}", index);
        if state.fail_switches || index >= state.keymaps.len() {
            return Err(controller_failure(command));
        }
        if let Some(budget) = state.switch_budget.as_mut() {
            if *budget == 0 {
                return Err(controller_failure(command));
            }
            *budget -= 1;
        }
        state.switches.push(index);
        state.active = index;
        Ok(())
    }
}

/// Plays back a fixed list of events, then reports EOF
#[derive(Debug)]
pub struct ScriptedSource {
    events: VecDeque<Result<HyprEvent, HyprError>>,
    closed: bool,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl EventSource for ScriptedSource {
    async fn read_event(&mut self) -> Result<HyprEvent, HyprError> {
        if self.closed {
            return Err(HyprError::StreamClosed);
        }
        self.events
            .pop_front()
            .unwrap_or(Err(HyprError::ConnectionClosed))
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// One scripted outcome per `connect()` call
pub enum Session {
    Refused,
    Unsigned,
    Lines(Vec<&'static str>),
}

/// Hands out sessions in order; refuses once the script runs out
#[derive(Default)]
pub struct ScriptedConnector {
    sessions: Mutex<VecDeque<Session>>,
    connects: Mutex<Vec<Instant>>,
    closes: Arc<AtomicUsize>,
}

impl ScriptedConnector {
    pub fn new(sessions: Vec<Session>) -> Self {
        Self {
            sessions: Mutex::new(sessions.into()),
            ..Self::default()
        }
    }

    /// When each `connect()` call happened, on the tokio clock
    pub fn connect_times(&self) -> Vec<Instant> {
        self.connects.lock().unwrap().clone()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    type Source = ScriptedSource;

    async fn connect(&self) -> Result<ScriptedSource, HyprError> {
        self.connects.lock().unwrap().push(Instant::now());

        let session = self
            .sessions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Session::Refused);

        match session {
            Session::Refused => Err(HyprError::ConnectionFailed {
                path: "/run/user/1000/hypr/test/.socket2.sock".into(),
                source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
            }),
            Session::Unsigned => Err(HyprError::SignatureNotSet),
            Session::Lines(lines) => Ok(ScriptedSource {
                events: lines.into_iter().map(HyprEvent::parse).collect(),
                closed: false,
                closes: Arc::clone(&self.closes),
            }),
        }
    }
}

/// Parse a literal event line
pub fn event(line: &str) -> HyprEvent {
    HyprEvent::parse(line).expect("test event lines must be well formed")
}
