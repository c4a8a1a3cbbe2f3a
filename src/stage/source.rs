//! Fixed supply rails.

/// Parameters of a source stage.
///
/// A source is always a root of the tree: it has no input, only an output
/// rail held at `vout` that can deliver up to `max_iout`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceParams {
    /// Supply voltage
    pub vout: f64,
    /// Maximum current the supply can deliver
    pub max_iout: f64,
}

impl SourceParams {
    /// Create a new supply.
    pub fn new(vout: f64, max_iout: f64) -> Self {
        Self { vout, max_iout }
    }

    /// Power delivered on the output rail for a given load current.
    pub fn output_power(&self, iout: f64) -> f64 {
        self.vout * iout
    }
}
