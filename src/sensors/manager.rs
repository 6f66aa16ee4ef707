//! BLE manager for CSC sensor discovery and connection.

use crate::csc::{
    AveragerConfig, CscSession, SensorLocation, CSC_MEASUREMENT_UUID, CSC_SERVICE_UUID,
    SENSOR_LOCATION_UUID,
};
use crate::sensors::types::{
    ConnectionState, DiscoveredSensor, SensorConfig, SensorError, SensorEvent,
};
use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use crossbeam::channel::{Receiver, Sender};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Manages BLE discovery, connection, and frame processing for CSC
/// sensors.
///
/// Each connected sensor gets its own notification task that owns that
/// sensor's [`CscSession`] exclusively, so frames are processed one at a
/// time in arrival order and no averaging state is ever shared.
pub struct SensorManager {
    /// Configuration
    config: SensorConfig,
    /// BLE adapter
    adapter: Option<Adapter>,
    /// Channel for sending sensor events
    event_tx: Option<Sender<SensorEvent>>,
    /// Discovered sensors (device_id -> DiscoveredSensor)
    discovered: Arc<Mutex<HashMap<String, DiscoveredSensor>>>,
    /// Connected peripherals (device_id -> Peripheral)
    connected: Arc<Mutex<HashMap<String, Peripheral>>>,
    /// Whether currently scanning
    is_scanning: Arc<Mutex<bool>>,
}

impl SensorManager {
    /// Create a new sensor manager.
    pub fn new(config: SensorConfig) -> Self {
        Self {
            config,
            adapter: None,
            event_tx: None,
            discovered: Arc::new(Mutex::new(HashMap::new())),
            connected: Arc::new(Mutex::new(HashMap::new())),
            is_scanning: Arc::new(Mutex::new(false)),
        }
    }

    /// Create a new sensor manager with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(SensorConfig::default())
    }

    /// Initialize the BLE adapter.
    ///
    /// This must be called before any sensor operations.
    pub async fn initialize(&mut self) -> Result<(), SensorError> {
        tracing::info!("Initializing SensorManager");

        let manager = Manager::new()
            .await
            .map_err(|e| SensorError::BleError(e.to_string()))?;

        let adapters = manager
            .adapters()
            .await
            .map_err(|e| SensorError::BleError(e.to_string()))?;

        let adapter = adapters
            .into_iter()
            .next()
            .ok_or(SensorError::AdapterNotFound)?;

        tracing::info!("BLE adapter initialized");
        self.adapter = Some(adapter);

        Ok(())
    }

    /// Get an event receiver for sensor events.
    pub fn event_receiver(&mut self) -> Receiver<SensorEvent> {
        let (tx, rx) = crossbeam::channel::unbounded();
        self.event_tx = Some(tx);
        rx
    }

    /// Send an event if the channel is available.
    fn send_event(&self, event: SensorEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }

    /// Start scanning for CSC sensors.
    pub async fn start_discovery(&mut self) -> Result<(), SensorError> {
        let adapter = self.adapter.as_ref().ok_or(SensorError::AdapterNotFound)?;

        {
            let mut is_scanning = self.is_scanning.lock().await;
            if *is_scanning {
                return Ok(()); // Already scanning
            }
            *is_scanning = true;
        }

        tracing::info!("Starting CSC sensor discovery");

        // Clear previous discoveries
        self.discovered.lock().await.clear();

        let scan_filter = ScanFilter {
            services: vec![CSC_SERVICE_UUID],
        };

        adapter
            .start_scan(scan_filter)
            .await
            .map_err(|e| SensorError::ScanFailed(e.to_string()))?;

        self.send_event(SensorEvent::ScanStarted);

        // Process adapter events in the background
        let adapter_clone = adapter.clone();
        let discovered = self.discovered.clone();
        let event_tx = self.event_tx.clone();
        let is_scanning = self.is_scanning.clone();

        tokio::spawn(async move {
            Self::process_discovery_events(adapter_clone, discovered, event_tx, is_scanning).await;
        });

        Ok(())
    }

    /// Process discovery events from the adapter.
    async fn process_discovery_events(
        adapter: Adapter,
        discovered: Arc<Mutex<HashMap<String, DiscoveredSensor>>>,
        event_tx: Option<Sender<SensorEvent>>,
        is_scanning: Arc<Mutex<bool>>,
    ) {
        use futures::stream::StreamExt;

        let mut events = match adapter.events().await {
            Ok(events) => events,
            Err(e) => {
                tracing::error!("Failed to get adapter events: {}", e);
                return;
            }
        };

        while let Some(event) = events.next().await {
            if !*is_scanning.lock().await {
                break;
            }

            if let CentralEvent::DeviceDiscovered(id) = event {
                let peripherals = match adapter.peripherals().await {
                    Ok(p) => p,
                    Err(_) => continue,
                };

                for peripheral in peripherals {
                    if peripheral.id() == id {
                        if let Some(sensor) = Self::classify_peripheral(&peripheral).await {
                            let device_id = peripheral.id().to_string();

                            discovered
                                .lock()
                                .await
                                .insert(device_id.clone(), sensor.clone());

                            if let Some(tx) = &event_tx {
                                let _ = tx.send(SensorEvent::Discovered(sensor));
                            }
                        }
                    }
                }
            }
        }
    }

    /// Accept a peripheral if it advertises the CSC service.
    async fn classify_peripheral(peripheral: &Peripheral) -> Option<DiscoveredSensor> {
        let properties = peripheral.properties().await.ok()??;

        if !properties.services.contains(&CSC_SERVICE_UUID) {
            return None;
        }

        let name = properties
            .local_name
            .unwrap_or_else(|| "Unknown Sensor".to_string());

        Some(DiscoveredSensor {
            device_id: peripheral.id().to_string(),
            name,
            signal_strength: properties.rssi,
            last_seen: Instant::now(),
        })
    }

    /// Stop scanning for sensors.
    pub async fn stop_discovery(&mut self) -> Result<(), SensorError> {
        let adapter = self.adapter.as_ref().ok_or(SensorError::AdapterNotFound)?;

        {
            let mut is_scanning = self.is_scanning.lock().await;
            if !*is_scanning {
                return Ok(()); // Not scanning
            }
            *is_scanning = false;
        }

        tracing::info!("Stopping sensor discovery");

        adapter
            .stop_scan()
            .await
            .map_err(|e| SensorError::ScanFailed(e.to_string()))?;

        self.send_event(SensorEvent::ScanStopped);

        Ok(())
    }

    /// Connect to a sensor, read its mounting location, and start
    /// streaming measurements.
    pub async fn connect(&mut self, device_id: &str) -> Result<SensorLocation, SensorError> {
        let adapter = self.adapter.as_ref().ok_or(SensorError::AdapterNotFound)?;

        tracing::info!("Connecting to sensor: {}", device_id);

        self.send_event(SensorEvent::ConnectionChanged {
            device_id: device_id.to_string(),
            state: ConnectionState::Connecting,
        });

        let peripherals = adapter
            .peripherals()
            .await
            .map_err(|e| SensorError::BleError(e.to_string()))?;

        let peripheral = peripherals
            .into_iter()
            .find(|p| p.id().to_string() == device_id)
            .ok_or_else(|| SensorError::SensorNotFound(device_id.to_string()))?;

        peripheral
            .connect()
            .await
            .map_err(|e| SensorError::ConnectionFailed(e.to_string()))?;

        peripheral
            .discover_services()
            .await
            .map_err(|e| SensorError::ConnectionFailed(e.to_string()))?;

        let location = Self::read_location(&peripheral).await?;
        tracing::info!("Sensor {} mounted at: {}", device_id, location);

        Self::subscribe_measurement(&peripheral).await?;

        self.connected
            .lock()
            .await
            .insert(device_id.to_string(), peripheral.clone());

        self.send_event(SensorEvent::ConnectionChanged {
            device_id: device_id.to_string(),
            state: ConnectionState::Connected,
        });

        // The notification task exclusively owns this sensor's session.
        let session = CscSession::new(AveragerConfig {
            window_seconds: self.config.averaging_window_seconds,
            ..AveragerConfig::default()
        });
        let event_tx = self.event_tx.clone();
        let device_id_owned = device_id.to_string();

        tokio::spawn(async move {
            Self::handle_notifications(peripheral, session, location, event_tx, device_id_owned)
                .await;
        });

        tracing::info!("Connected to sensor: {}", device_id);

        Ok(location)
    }

    /// Read the Sensor Location characteristic.
    async fn read_location(peripheral: &Peripheral) -> Result<SensorLocation, SensorError> {
        let characteristics = peripheral.characteristics();
        let location_char = characteristics
            .iter()
            .find(|c| c.uuid == SENSOR_LOCATION_UUID)
            .ok_or(SensorError::Unsupported)?;

        let value = peripheral
            .read(location_char)
            .await
            .map_err(|e| SensorError::ReadFailed(e.to_string()))?;

        let byte = *value
            .first()
            .ok_or_else(|| SensorError::ReadFailed("empty location value".to_string()))?;

        SensorLocation::from_byte(byte).map_err(|e| SensorError::ReadFailed(e.to_string()))
    }

    /// Subscribe to the CSC Measurement characteristic.
    async fn subscribe_measurement(peripheral: &Peripheral) -> Result<(), SensorError> {
        let characteristics = peripheral.characteristics();
        let measurement = characteristics
            .iter()
            .find(|c| c.uuid == CSC_MEASUREMENT_UUID)
            .ok_or(SensorError::Unsupported)?;

        peripheral
            .subscribe(measurement)
            .await
            .map_err(|e| SensorError::SubscriptionFailed(e.to_string()))?;

        tracing::debug!("Subscribed to CSC measurement");

        Ok(())
    }

    /// Process measurement notifications for one sensor.
    ///
    /// Frames are handled strictly in arrival order, each to completion,
    /// because counter unwrapping is order-sensitive. A frame that fails
    /// to decode is logged and skipped; the session state is unchanged
    /// and later frames are unaffected.
    async fn handle_notifications(
        peripheral: Peripheral,
        mut session: CscSession,
        location: SensorLocation,
        event_tx: Option<Sender<SensorEvent>>,
        device_id: String,
    ) {
        use futures::stream::StreamExt;

        let mut notification_stream = match peripheral.notifications().await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!("Failed to get notification stream: {}", e);
                return;
            }
        };

        while let Some(notification) = notification_stream.next().await {
            if notification.uuid != CSC_MEASUREMENT_UUID {
                continue;
            }

            match session.process_frame(&notification.value) {
                Ok(update) => {
                    if let Some(tx) = &event_tx {
                        let _ = tx.send(SensorEvent::Measurement {
                            device_id: device_id.clone(),
                            location,
                            update,
                        });
                    }
                }
                Err(e) => {
                    tracing::warn!("Skipping frame from {}: {}", device_id, e);
                }
            }
        }

        // Stream ended - peripheral disconnected
        if let Some(tx) = &event_tx {
            let _ = tx.send(SensorEvent::ConnectionChanged {
                device_id,
                state: ConnectionState::Disconnected,
            });
        }
    }

    /// Disconnect from a sensor.
    pub async fn disconnect(&mut self, device_id: &str) -> Result<(), SensorError> {
        tracing::info!("Disconnecting from sensor: {}", device_id);

        let mut connected = self.connected.lock().await;

        if let Some(peripheral) = connected.remove(device_id) {
            peripheral
                .disconnect()
                .await
                .map_err(|e| SensorError::BleError(e.to_string()))?;
        }

        self.send_event(SensorEvent::ConnectionChanged {
            device_id: device_id.to_string(),
            state: ConnectionState::Disconnected,
        });

        Ok(())
    }

    /// Get list of discovered sensors.
    pub async fn get_discovered(&self) -> Vec<DiscoveredSensor> {
        self.discovered.lock().await.values().cloned().collect()
    }

    /// Check if currently scanning.
    pub async fn is_scanning(&self) -> bool {
        *self.is_scanning.lock().await
    }

    /// Shutdown the sensor manager.
    pub async fn shutdown(&mut self) {
        tracing::info!("Shutting down SensorManager");

        let _ = self.stop_discovery().await;

        let device_ids: Vec<String> = self.connected.lock().await.keys().cloned().collect();

        for device_id in device_ids {
            let _ = self.disconnect(&device_id).await;
        }
    }
}
