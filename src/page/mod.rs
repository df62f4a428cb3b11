// Page-facing surfaces.
// DOM and chart collaborators, route classification, and the binder.

pub mod binder;
pub mod chart;
pub mod dom;
pub mod route;

pub use binder::{PageBinder, RefreshTicket};
pub use chart::{ChartRenderer, ChartSeries, LineChart};
pub use dom::{HostPage, NodeHandle, wait_for_element};
pub use route::{Route, classify};
