//! Flight context
//!
//! The active flight determines how strictly expiry dates are judged: a
//! short domestic hop tolerates closer dates than a long-haul rotation.
//! The context is set by the operator and read by the decode task on every
//! detection, so changes apply to the next frame without a restart.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Flight category, the primary input to the warning threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlightType {
    Domestic,
    International,
}

/// Operational context for the current flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightContext {
    pub flight_type: FlightType,
    /// Free-form airframe name, e.g. "Boeing 777" or "Airbus A320".
    pub aircraft: String,
    pub origin: String,
    pub destination: String,
}

impl Default for FlightContext {
    fn default() -> Self {
        Self {
            flight_type: FlightType::International,
            aircraft: "Boeing 777".to_string(),
            origin: "JFK".to_string(),
            destination: "LHR".to_string(),
        }
    }
}

/// Writable side of the shared flight context.
///
/// Owns the channel; hand out [`FlightContextHandle`]s to readers. Updates
/// replace the whole context so readers never see a half-applied change.
pub struct FlightContextStore {
    tx: watch::Sender<FlightContext>,
}

impl FlightContextStore {
    pub fn new(initial: FlightContext) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// A read handle that always observes the latest context.
    pub fn handle(&self) -> FlightContextHandle {
        FlightContextHandle {
            rx: self.tx.subscribe(),
        }
    }

    /// Replace the active context.
    pub fn set(&self, context: FlightContext) {
        self.tx.send_replace(context);
    }

    pub fn current(&self) -> FlightContext {
        self.tx.borrow().clone()
    }
}

impl Default for FlightContextStore {
    fn default() -> Self {
        Self::new(FlightContext::default())
    }
}

/// Read-only view of the flight context, cheap to clone into tasks.
#[derive(Clone)]
pub struct FlightContextHandle {
    rx: watch::Receiver<FlightContext>,
}

impl FlightContextHandle {
    pub fn current(&self) -> FlightContext {
        self.rx.borrow().clone()
    }
}
