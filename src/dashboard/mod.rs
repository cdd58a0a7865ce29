//! Live serial dashboard: reader thread, rolling window and egui charts.

mod app;
mod chart;
mod poller;
mod window;

pub use app::{ConnectionState, DashboardApp};
pub use chart::{Series, ValueRange};
pub use poller::{Poller, PollerMessage};
pub use window::ReadingWindow;
