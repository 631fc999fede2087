//! Fixed-tick control loop
//!
//! This module handles:
//! - Draining driver input events once per tick
//! - Reading and decoding the telemetry link, or stepping the physics model
//! - Lap timing
//! - Emitting the vehicle state to the output sink (one commit per tick)
//! - Publishing a snapshot for observers
//!
//! [`ControlLoop`] is synchronous and clock-agnostic: callers pass the
//! current monotonic time in, which keeps every tick deterministic under
//! test. [`run`] drives it from a tokio interval.

use crate::state::LoopEndpoints;
use ds_core::physics::{self, HeldKeys};
use ds_core::{
    Button, Control, FrameDecoder, InputEvent, InputSource, LapTimer, OutputSink, SinkError,
    StateSnapshot, TelemetryLink, VehicleState,
};
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Longest time step fed to the physics model
pub const MAX_TICK_DT: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy)]
pub struct ControlOptions {
    /// Source requested at startup
    pub source: InputSource,
    /// Most bytes read from the link per tick
    pub read_chunk: usize,
}

impl Default for ControlOptions {
    fn default() -> Self {
        Self {
            source: InputSource::Telemetry,
            read_chunk: 256,
        }
    }
}

pub struct ControlLoop {
    state: VehicleState,
    laps: LapTimer,
    decoder: FrameDecoder,
    keys: HeldKeys,
    buttons: HashSet<Button>,
    source: InputSource,
    link: Box<dyn TelemetryLink>,
    sink: Box<dyn OutputSink>,
    read_chunk: usize,
    tick: u64,
    last_tick: Duration,
    link_failing: bool,
    quit: bool,
}

impl ControlLoop {
    /// Build the loop. `start` is the monotonic time the first lap starts.
    pub fn new(
        link: Box<dyn TelemetryLink>,
        sink: Box<dyn OutputSink>,
        options: ControlOptions,
        start: Duration,
    ) -> Self {
        Self {
            state: VehicleState::default(),
            laps: LapTimer::new(start),
            decoder: FrameDecoder::new(),
            keys: HeldKeys::default(),
            buttons: HashSet::new(),
            source: options.source,
            link,
            sink,
            read_chunk: options.read_chunk.max(1),
            tick: 0,
            last_tick: start,
            link_failing: false,
            quit: false,
        }
    }

    /// Open the link if telemetry was requested, falling back to simulation
    pub fn startup(&mut self) {
        info!(
            "Control loop starting: source={:?}, link={}, sink={}",
            self.source,
            self.link.name(),
            self.sink.name()
        );
        if self.source == InputSource::Telemetry {
            if let Err(e) = self.link.open() {
                warn!(
                    "Telemetry link {} unavailable ({}), falling back to simulation",
                    self.link.name(),
                    e
                );
                self.source = InputSource::Simulation;
            } else {
                info!("Telemetry link {} open", self.link.name());
            }
        }
    }

    /// Run one tick at monotonic time `now`, after applying `events`.
    ///
    /// A sink failure is returned without publishing; the caller is
    /// expected to tear down.
    pub fn tick(
        &mut self,
        now: Duration,
        events: impl IntoIterator<Item = InputEvent>,
    ) -> Result<StateSnapshot, SinkError> {
        let dt = now.saturating_sub(self.last_tick).min(MAX_TICK_DT);
        self.last_tick = now;

        for event in events {
            self.handle_event(event, now);
        }

        let dt = dt.as_secs_f32();
        match self.source {
            InputSource::Telemetry => {
                self.poll_link();
                // Not on the wire; simulated locally from the live throttle
                self.state.temp_c =
                    physics::advance_temperature(self.state.temp_c, self.state.throttle, dt);
            }
            // advance() includes the coolant model
            InputSource::Simulation => self.state = physics::advance(&self.state, self.keys, dt),
        }

        self.laps.tick(now);
        self.emit()?;
        self.tick += 1;
        Ok(self.snapshot())
    }

    /// Apply one discrete input event
    pub fn handle_event(&mut self, event: InputEvent, now: Duration) {
        match event {
            InputEvent::Pressed(control) => {
                if self.source == InputSource::Telemetry && control.is_simulation_only() {
                    debug!("Ignoring {:?} while on live telemetry", control);
                    return;
                }
                self.set_held(control, true);
                if let Some(button) = control.button() {
                    self.buttons.insert(button);
                }
                match control {
                    Control::GearUp => self.state.shift_up(),
                    Control::GearDown => self.state.shift_down(),
                    Control::LapComplete => {
                        let record = self.laps.on_lap_complete(now);
                        if let (Some(last), Some(best)) = (record.last, record.best) {
                            info!(
                                "Lap {} complete: {:.3}s (best {:.3}s)",
                                record.count,
                                last.as_secs_f32(),
                                best.as_secs_f32()
                            );
                        }
                    }
                    _ => {}
                }
            }
            InputEvent::Released(control) => {
                self.set_held(control, false);
                if let Some(button) = control.button() {
                    self.buttons.remove(&button);
                }
            }
            InputEvent::ToggleMode => self.set_source(self.source.toggled()),
            InputEvent::Quit => {
                info!("Quit requested");
                self.quit = true;
            }
        }
    }

    /// Switch the input source. Switching to telemetry reopens the link
    /// with a fresh decoder and stays on simulation if that fails.
    pub fn set_source(&mut self, source: InputSource) {
        if source == self.source {
            return;
        }
        match source {
            InputSource::Telemetry => {
                self.decoder.reset();
                self.link_failing = false;
                if let Err(e) = self.link.open() {
                    warn!(
                        "Cannot switch to telemetry, link {} unavailable: {}",
                        self.link.name(),
                        e
                    );
                    return;
                }
                self.keys = HeldKeys::default();
            }
            InputSource::Simulation => self.link.close(),
        }
        info!("Input source: {:?} -> {:?}", self.source, source);
        self.source = source;
    }

    /// Leave the pad neutral and release the link
    pub fn shutdown(&mut self) -> Result<(), SinkError> {
        info!("Control loop shutting down after {} ticks", self.tick);
        self.sink.reset();
        let result = self.sink.commit();
        self.link.close();
        result
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot::new(
            self.tick,
            self.source,
            self.state,
            self.laps.record(),
            self.decoder.stats(),
            Some(self.link.name().to_string()),
        )
    }

    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    pub fn source(&self) -> InputSource {
        self.source
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    fn set_held(&mut self, control: Control, held: bool) {
        match control {
            Control::SteerLeft => self.keys.left = held,
            Control::SteerRight => self.keys.right = held,
            Control::Throttle => self.keys.gas = held,
            Control::Brake => self.keys.brake = held,
            _ => {}
        }
    }

    fn poll_link(&mut self) {
        match self.link.read_available(self.read_chunk) {
            Ok(bytes) => {
                if self.link_failing {
                    info!("Telemetry link {} recovered", self.link.name());
                    self.link_failing = false;
                }
                for frame in self.decoder.ingest(&bytes) {
                    self.state.apply_frame(&frame);
                }
            }
            Err(e) => {
                if !self.link_failing {
                    warn!("Error reading telemetry link {}: {}", self.link.name(), e);
                    self.link_failing = true;
                }
            }
        }
    }

    fn emit(&mut self) -> Result<(), SinkError> {
        self.sink.set_steering(self.state.steering_axis());
        self.sink.set_throttle(self.state.throttle);
        self.sink.set_brake(self.state.brake);
        for button in Button::ALL {
            self.sink.set_button(button, self.buttons.contains(&button));
        }
        self.sink.commit()
    }
}

/// Drive `control` at `tick_hz` until cancelled, a quit event arrives, or
/// the sink fails.
///
/// Teardown always runs. The token is cancelled on the way out so other
/// tasks (the API server) stop with the loop.
pub async fn run(
    mut control: ControlLoop,
    endpoints: LoopEndpoints,
    tick_hz: u32,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let LoopEndpoints {
        mut events,
        snapshots,
    } = endpoints;

    let tick_hz = tick_hz.max(1);
    let epoch = Instant::now();
    let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / f64::from(tick_hz)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    control.startup();

    let result = loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Cancellation requested");
                break Ok(());
            }
            _ = interval.tick() => {}
        }

        let now = epoch.elapsed();
        let pending = std::iter::from_fn(|| events.try_recv().ok());
        match control.tick(now, pending) {
            Ok(snapshot) => {
                if snapshot.tick % u64::from(tick_hz) == 0 {
                    debug!(
                        source = ?snapshot.source,
                        gear = %snapshot.vehicle.gear_label(),
                        frames = snapshot.decoder.frames,
                        corruption = snapshot.decoder.corruption_count(),
                        clamped = snapshot.decoder.clamped_fields,
                        overflow = snapshot.decoder.overflow_bytes,
                        "Loop stats"
                    );
                }
                snapshots.send_replace(Some(snapshot));
            }
            Err(e) => {
                error!("Output sink failed, stopping: {}", e);
                break Err(anyhow::Error::new(e).context("output sink commit failed"));
            }
        }

        if control.quit_requested() {
            break Ok(());
        }
    };

    if let Err(e) = control.shutdown() {
        warn!("Failed to leave output sink neutral: {}", e);
    }
    cancel.cancel();
    result
}
