//! Per-key admission control protecting a shared downstream resource.
//!
//! A burst allowance absorbs short spikes; once it is spent, requests are
//! counted against steady capacity over a sliding window. Time comes from an
//! injected [`Clock`] so windows can be simulated deterministically.

mod clock;
mod config;
mod controller;
mod error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::RateLimit;
pub use controller::AdmissionController;
pub use error::{AdmissionError, Result};
