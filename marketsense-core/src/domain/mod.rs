//! Domain types for MarketSense

pub mod bar;
pub mod calendar;
pub mod security;
pub mod width;

pub use bar::PriceBar;
pub use calendar::{backward_from_weekend, forward_from_weekend};
pub use security::{Security, SecurityId, SecurityType};
pub use width::{BarWidth, BarWidthError};
