//! # Telemetry
//!
//! Telemetry is fire-and-forget: sinks swallow (and at most log) their own failures so that
//! recording can never affect control.

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A sink which discards everything recorded into it.
#[derive(Debug, Default, Copy, Clone)]
pub struct NullTelemetry;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A key to value recorder.
pub trait TelemetrySink {
    /// Record the values against the key.
    fn record(&mut self, key: &str, values: &[f64]);

    /// Record a single scalar against the key.
    fn record_scalar(&mut self, key: &str, value: f64) {
        self.record(key, &[value])
    }

    /// Record a flag against the key, as `1.0` for true and `0.0` for false.
    fn record_flag(&mut self, key: &str, value: bool) {
        self.record(key, &[if value { 1.0 } else { 0.0 }])
    }
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TelemetrySink for NullTelemetry {
    fn record(&mut self, _key: &str, _values: &[f64]) {}
}
