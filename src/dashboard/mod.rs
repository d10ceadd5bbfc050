//! The dashboard: summary cards, charts and live balances recomputed from
//! the ledger on every request.

mod aggregation;
mod cards;
mod charts;
mod handlers;
mod tables;

pub use handlers::{DashboardState, get_dashboard_page};
