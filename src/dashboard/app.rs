use std::time::Duration;

use eframe::egui::{self, RichText};

use super::chart::{SERIES_COLORS, Series, line_chart};
use super::poller::{Poller, PollerMessage};
use super::window::ReadingWindow;
use crate::config::{DashboardSettings, EnoseConfig};
use crate::sensor::{GAS_CHANNELS, PortInfo, SerialSettings, available_ports};

const CHART_HEIGHT: f32 = 220.0;

/// Connection state shown in the sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Reading,
    Failed(String),
}

/// Live BME688 dashboard.
pub struct DashboardApp {
    serial: SerialSettings,
    settings: DashboardSettings,
    ports: Vec<PortInfo>,
    poller: Option<Poller>,
    window: ReadingWindow,
    state: ConnectionState,
}

impl DashboardApp {
    pub fn new(config: &EnoseConfig) -> Self {
        let mut app = Self {
            serial: config.serial.clone(),
            settings: config.dashboard.clone(),
            ports: Vec::new(),
            poller: None,
            window: ReadingWindow::new(config.dashboard.window),
            state: ConnectionState::Idle,
        };
        app.refresh_ports();
        app
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn window(&self) -> &ReadingWindow {
        &self.window
    }

    fn refresh_ports(&mut self) {
        match available_ports() {
            Ok(ports) => {
                if !ports.is_empty() && !ports.iter().any(|p| p.name == self.serial.port) {
                    self.serial.port = ports[0].name.clone();
                }
                self.ports = ports;
            }
            Err(err) => {
                tracing::warn!("{err}");
                self.ports.clear();
            }
        }
    }

    fn start(&mut self) {
        let settings = SerialSettings {
            timeout_ms: self.settings.read_timeout_ms,
            ..self.serial.clone()
        };
        tracing::info!("Dashboard connecting to {} @ {}", settings.port, settings.baud_rate);
        self.window.clear();
        self.state = ConnectionState::Connecting;
        self.poller = Some(Poller::spawn(settings, self.settings.line_layout));
    }

    fn stop(&mut self) {
        self.poller = None;
        if matches!(self.state, ConnectionState::Reading | ConnectionState::Connecting) {
            self.state = ConnectionState::Idle;
        }
    }

    fn is_running(&self) -> bool {
        self.poller.is_some()
    }

    fn pump_messages(&mut self) {
        let Some(poller) = self.poller.as_ref() else {
            return;
        };
        for message in poller.drain() {
            self.apply(message);
        }
        if !matches!(self.state, ConnectionState::Connecting | ConnectionState::Reading) {
            self.poller = None;
        }
    }

    /// Fold one reader event into the UI state.
    pub fn apply(&mut self, message: PollerMessage) {
        match message {
            PollerMessage::Connected => self.state = ConnectionState::Reading,
            PollerMessage::Reading(reading) => self.window.push(reading),
            PollerMessage::Failed(err) => self.state = ConnectionState::Failed(err),
            PollerMessage::Closed => self.state = ConnectionState::Idle,
        }
    }

    fn render_sidebar(&mut self, ui: &mut egui::Ui) {
        ui.heading("BME688");
        ui.add_space(6.0);
        ui.label("Serial port");
        ui.add_enabled_ui(!self.is_running(), |ui| {
            egui::ComboBox::from_id_salt("serial_port_combo")
                .width(200.0)
                .selected_text(self.serial.port.clone())
                .show_ui(ui, |ui| {
                    for port in &self.ports {
                        let label = format!("{} ({})", port.name, port.description);
                        if ui
                            .selectable_label(self.serial.port == port.name, label)
                            .clicked()
                        {
                            self.serial.port = port.name.clone();
                        }
                    }
                });
            if ui.button("Refresh ports").clicked() {
                self.refresh_ports();
            }
        });
        ui.label(format!("{} baud", self.serial.baud_rate));
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            if ui
                .add_enabled(!self.is_running(), egui::Button::new("Start"))
                .clicked()
            {
                self.start();
            }
            if ui
                .add_enabled(self.is_running(), egui::Button::new("Stop"))
                .clicked()
            {
                self.stop();
            }
        });
        ui.add_space(8.0);
        match &self.state {
            ConnectionState::Idle => {
                ui.label("Stopped");
            }
            ConnectionState::Connecting => {
                ui.label("Connecting…");
            }
            ConnectionState::Reading => {
                ui.label(format!(
                    "Reading · {}/{} samples",
                    self.window.len(),
                    self.window.capacity()
                ));
            }
            ConnectionState::Failed(err) => {
                let color = ui.visuals().error_fg_color;
                ui.label(RichText::new(format!("Connection error: {err}")).color(color));
            }
        }
    }

    fn render_center(&self, ui: &mut egui::Ui) {
        let slots = self.window.capacity();
        let temperatures = self.window.temperatures();
        let humidities = self.window.humidities();
        let climate = [
            Series {
                label: "Temperature (°C)",
                values: &temperatures,
                color: SERIES_COLORS[0],
            },
            Series {
                label: "Humidity (%)",
                values: &humidities,
                color: SERIES_COLORS[1],
            },
        ];
        line_chart(ui, "Climate", &climate, slots, CHART_HEIGHT);
        ui.add_space(8.0);

        let gas_values = self.window.gas_series();
        let gases: Vec<Series<'_>> = gas_values
            .iter()
            .zip(GAS_CHANNELS.iter())
            .enumerate()
            .map(|(i, (values, label))| Series {
                label: *label,
                values: values.as_slice(),
                color: SERIES_COLORS[i % SERIES_COLORS.len()],
            })
            .collect();
        line_chart(ui, "Gas resistance (Ω)", &gases, slots, CHART_HEIGHT);
        ui.add_space(8.0);
        self.render_table(ui);
    }

    fn render_table(&self, ui: &mut egui::Ui) {
        ui.label(RichText::new("Latest readings").strong());
        egui::Grid::new("latest_readings")
            .striped(true)
            .show(ui, |ui| {
                ui.label("#");
                ui.label("T (°C)");
                ui.label("RH (%)");
                for channel in GAS_CHANNELS {
                    ui.label(channel);
                }
                ui.end_row();
                for reading in self.window.latest(self.settings.table_rows) {
                    ui.label(reading.index.map(|i| format!("{i:.0}")).unwrap_or_default());
                    ui.label(format!("{:.2}", reading.temperature));
                    ui.label(format!("{:.2}", reading.humidity));
                    for gas in reading.gases {
                        ui.label(format!("{gas:.0}"));
                    }
                    ui.end_row();
                }
            });
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.pump_messages();
        egui::SidePanel::left("connection")
            .resizable(false)
            .default_width(240.0)
            .show(ctx, |ui| self.render_sidebar(ui));
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| self.render_center(ui));
        });
        if self.is_running() {
            ctx.request_repaint_after(Duration::from_millis(self.settings.poll_interval_ms));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::{GAS_CHANNEL_COUNT, Reading};

    fn app() -> DashboardApp {
        let mut config = EnoseConfig::default();
        config.dashboard.window = 2;
        DashboardApp {
            serial: config.serial.clone(),
            settings: config.dashboard.clone(),
            ports: Vec::new(),
            poller: None,
            window: ReadingWindow::new(config.dashboard.window),
            state: ConnectionState::Idle,
        }
    }

    fn reading(temperature: f64) -> Reading {
        Reading {
            index: Some(1.0),
            temperature,
            humidity: 40.0,
            gases: [1.0; GAS_CHANNEL_COUNT],
        }
    }

    #[test]
    fn messages_drive_state() {
        let mut app = app();
        app.apply(PollerMessage::Connected);
        assert_eq!(app.state(), &ConnectionState::Reading);
        for t in [20.0, 21.0, 22.0] {
            app.apply(PollerMessage::Reading(reading(t)));
        }
        assert_eq!(app.window().temperatures(), vec![21.0, 22.0]);
        app.apply(PollerMessage::Failed("unplugged".into()));
        assert_eq!(app.state(), &ConnectionState::Failed("unplugged".into()));
    }
}
