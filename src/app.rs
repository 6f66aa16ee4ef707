//! Application wiring: sensor events in, terminal board out.

use crossbeam::channel::Receiver;
use spindash::config::AppConfig;
use spindash::display::{format_hms, ActivityTimer, DisplayBoard, SlotStatus, SlotWriter};
use spindash::metrics::{cadence_rpm, wheel_speed_kmh, PowerCurve};
use spindash::sensors::types::{ConnectionState, SensorConfig, SensorEvent};
use spindash::sensors::SensorManager;
use std::collections::HashMap;
use std::time::Duration;

/// How often the board is redrawn.
const RENDER_INTERVAL: Duration = Duration::from_secs(1);

/// Check whether a platform peripheral id refers to a configured sensor
/// address. Platforms render the same MAC differently
/// (`D0:AC:A5:BF:B7:52` vs `hci0/dev_D0_AC_A5_BF_B7_52`), so compare on
/// hex digits only.
pub fn address_matches(device_id: &str, address: &str) -> bool {
    let digits = |s: &str| -> String {
        s.chars()
            .filter(|c| c.is_ascii_hexdigit())
            .collect::<String>()
            .to_ascii_uppercase()
    };
    let needle = digits(address);
    !needle.is_empty() && digits(device_id).contains(&needle)
}

/// Everything the running dashboard owns.
pub struct App {
    config: AppConfig,
    manager: SensorManager,
    events: Receiver<SensorEvent>,
    board: DisplayBoard,
    /// Configured sensors not yet connected: (address, slot)
    pending: Vec<(String, SlotWriter)>,
    /// Connected sensors by device id
    active: HashMap<String, SlotWriter>,
    /// Per-sensor activity, feeding the shared timer
    activity: HashMap<String, bool>,
    timer: ActivityTimer,
    power_curve: Option<PowerCurve>,
}

impl App {
    /// Set up the manager, board slots, and power curve from config.
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let power_curve = match &config.power_curve_path {
            Some(path) => Some(PowerCurve::from_csv_path(path)?),
            None => None,
        };

        let mut manager = SensorManager::new(SensorConfig {
            averaging_window_seconds: config.averaging_window_seconds,
            ..SensorConfig::default()
        });
        let events = manager.event_receiver();
        manager.initialize().await?;

        let mut board = DisplayBoard::new();
        let pending = config
            .sensors
            .iter()
            .map(|address| (address.clone(), board.add_slot(address.clone())))
            .collect();

        Ok(Self {
            config,
            manager,
            events,
            board,
            pending,
            active: HashMap::new(),
            activity: HashMap::new(),
            timer: ActivityTimer::new(),
            power_curve,
        })
    }

    /// Run until ctrl-c.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        self.manager.start_discovery().await?;

        let mut render = tokio::time::interval(RENDER_INTERVAL);
        loop {
            tokio::select! {
                _ = render.tick() => {
                    self.drain_events().await;
                    self.render();
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutting down");
                    break;
                }
            }
        }

        self.manager.shutdown().await;
        Ok(())
    }

    /// Handle every event queued since the last tick.
    async fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event).await;
        }
    }

    async fn handle_event(&mut self, event: SensorEvent) {
        match event {
            SensorEvent::Discovered(sensor) => {
                tracing::info!("Discovered {} ({})", sensor.name, sensor.device_id);
                self.try_connect(sensor.device_id, sensor.name).await;
            }
            SensorEvent::ConnectionChanged { device_id, state } => {
                if let Some(writer) = self.active.get(&device_id) {
                    writer.set_status(match state {
                        ConnectionState::Connecting => SlotStatus::Connecting,
                        ConnectionState::Connected => SlotStatus::WaitingForData,
                        ConnectionState::Disconnected => SlotStatus::Lost,
                    });
                }
                if state == ConnectionState::Disconnected {
                    self.activity.insert(device_id, false);
                    self.update_timer();
                }
            }
            SensorEvent::Measurement {
                device_id,
                location,
                update,
            } => {
                let moving = update.wheel_rps > 0.0 || update.crank_rps > 0.0;
                self.activity.insert(device_id.clone(), moving);
                self.update_timer();

                if let Some(writer) = self.active.get(&device_id) {
                    if location.is_wheel() {
                        let speed = wheel_speed_kmh(
                            update.wheel_rps,
                            self.config.wheel_circumference_mm,
                        );
                        let power = self.power_curve.as_ref().map(|c| c.estimate(speed));
                        writer.set_reading(Some(speed), None, power);
                    } else if location.is_crank() {
                        writer.set_reading(None, Some(cadence_rpm(update.crank_rps)), None);
                    } else {
                        writer.set_reading(None, None, None);
                    }
                }
            }
            SensorEvent::ScanStarted | SensorEvent::ScanStopped => {}
            SensorEvent::Error(message) => tracing::warn!("Sensor error: {}", message),
        }
    }

    /// Connect to a discovered sensor if it is configured (or if no
    /// sensors were configured at all), claiming its display slot.
    async fn try_connect(&mut self, device_id: String, name: String) {
        if self.active.contains_key(&device_id) {
            return;
        }

        let writer = if self.config.sensors.is_empty() {
            // No allowlist: take every CSC sensor that shows up.
            self.board.add_slot(name)
        } else {
            match self
                .pending
                .iter()
                .position(|(address, _)| address_matches(&device_id, address))
            {
                Some(index) => self.pending.remove(index).1,
                None => return,
            }
        };

        match self.manager.connect(&device_id).await {
            Ok(location) => {
                writer.set_location(location);
                writer.set_status(SlotStatus::WaitingForData);
                self.active.insert(device_id, writer);

                // Connected everything we were asked to; stop burning
                // radio time on discovery.
                if !self.config.sensors.is_empty() && self.pending.is_empty() {
                    if let Err(e) = self.manager.stop_discovery().await {
                        tracing::warn!("Failed to stop discovery: {}", e);
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Failed to connect to {}: {}", device_id, e);
                writer.set_status(SlotStatus::Lost);
                // Give the sensor another chance at the next discovery.
                if !self.config.sensors.is_empty() {
                    if let Some(address) = self
                        .config
                        .sensors
                        .iter()
                        .find(|address| address_matches(&device_id, address))
                    {
                        self.pending.push((address.clone(), writer));
                    }
                }
            }
        }
    }

    fn update_timer(&mut self) {
        let any_moving = self.activity.values().any(|moving| *moving);
        self.timer.set_active(any_moving);
    }

    /// Redraw the board.
    fn render(&self) {
        println!("Activity Time  {}", format_hms(self.timer.elapsed()));
        for slot in self.board.snapshot() {
            let label = match slot.location {
                Some(location) => location.to_string(),
                None => slot.sensor.clone(),
            };
            let mut line = format!("{:<14} ", label);
            if slot.status == SlotStatus::Live {
                if let Some(speed) = slot.speed_kmh {
                    line.push_str(&format!("{:5.1} km/h  ", speed));
                }
                if let Some(cadence) = slot.cadence_rpm {
                    line.push_str(&format!("{:3.0} RPM  ", cadence));
                }
                if let Some(watts) = slot.power_watts {
                    line.push_str(&format!("{:3.0} W", watts));
                }
            } else {
                line.push_str(&format!("[{}]", slot.status));
            }
            println!("{}", line.trim_end());
        }
        println!();
    }
}
