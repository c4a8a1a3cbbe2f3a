//! Linear and switching regulators.
//!
//! Both regulator kinds hold their output at the configured `vout`
//! regardless of input; a `vout` at or above the actual input is flagged by
//! the checker, not corrected here.
//!
//! Quiescent current `iq` is drawn from the input rail on top of the
//! conversion current.

use crate::engine::UnresolvedCause;

use super::{finite, Conversion, UNLIMITED_VOLTAGE};

/// Parameters of a linear regulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LdoParams {
    /// Regulated output voltage
    pub vout: f64,
    /// Rated output current
    pub max_iout: f64,
    /// Quiescent (ground pin) current in amps
    pub iq: f64,
    /// Lowest acceptable input voltage
    pub vin_min: f64,
    /// Highest acceptable input voltage
    pub vin_max: f64,
    /// Minimum headroom `vin - vout` the part needs to stay in regulation
    pub dropout: f64,
}

impl LdoParams {
    /// Create a regulator with no bias current, no dropout and no input limits.
    pub fn new(vout: f64, max_iout: f64) -> Self {
        Self {
            vout,
            max_iout,
            iq: 0.0,
            vin_min: 0.0,
            vin_max: UNLIMITED_VOLTAGE,
            dropout: 0.0,
        }
    }

    /// Set the quiescent current (amps).
    pub fn with_iq(mut self, iq: f64) -> Self {
        self.iq = iq;
        self
    }

    /// Set the acceptable input voltage window.
    pub fn with_input_range(mut self, vin_min: f64, vin_max: f64) -> Self {
        self.vin_min = vin_min;
        self.vin_max = vin_max;
        self
    }

    /// Set the dropout voltage.
    pub fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }

    /// Run the regulator at input `vin` while it sources `iout`.
    ///
    /// The pass element carries the full output current, so the input
    /// current is `iout + iq` and the voltage difference is burnt as heat.
    pub fn convert(&self, vin: f64, iout: f64) -> Result<Conversion, UnresolvedCause> {
        if vin == 0.0 {
            return Err(UnresolvedCause::ZeroInputVoltage);
        }
        let pout = finite(self.vout * iout)?;
        let iin = finite(iout + self.iq)?;
        let pin = finite(vin * iin)?;
        let efficiency = if pin != 0.0 {
            Some(finite(pout / pin)?)
        } else {
            None
        };
        Ok(Conversion {
            iin,
            pin,
            pout,
            pdiss: pin - pout,
            efficiency,
        })
    }
}

/// Parameters of a switching converter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DcdcParams {
    /// Regulated output voltage
    pub vout: f64,
    /// Rated output current
    pub max_iout: f64,
    /// Quiescent current in amps
    pub iq: f64,
    /// Conversion efficiency, a fraction in (0, 1]
    pub efficiency: f64,
    /// Lowest acceptable input voltage
    pub vin_min: f64,
    /// Highest acceptable input voltage
    pub vin_max: f64,
}

impl DcdcParams {
    /// Create a converter with no bias current and no input limits.
    pub fn new(vout: f64, max_iout: f64, efficiency: f64) -> Self {
        Self {
            vout,
            max_iout,
            iq: 0.0,
            efficiency,
            vin_min: 0.0,
            vin_max: UNLIMITED_VOLTAGE,
        }
    }

    /// Set the quiescent current (amps).
    pub fn with_iq(mut self, iq: f64) -> Self {
        self.iq = iq;
        self
    }

    /// Set the acceptable input voltage window.
    pub fn with_input_range(mut self, vin_min: f64, vin_max: f64) -> Self {
        self.vin_min = vin_min;
        self.vin_max = vin_max;
        self
    }

    /// Whether the configured efficiency lies in (0, 1].
    pub fn efficiency_in_range(&self) -> bool {
        self.efficiency > 0.0 && self.efficiency <= 1.0
    }

    /// Run the converter at input `vin` while it sources `iout`.
    pub fn convert(&self, vin: f64, iout: f64) -> Result<Conversion, UnresolvedCause> {
        if vin == 0.0 {
            return Err(UnresolvedCause::ZeroInputVoltage);
        }
        if self.efficiency == 0.0 {
            return Err(UnresolvedCause::ZeroEfficiency);
        }
        let pout = finite(self.vout * iout)?;
        let pin = finite(pout / self.efficiency)?;
        let iin = finite(pin / vin + self.iq)?;
        let efficiency = if pin != 0.0 {
            Some(finite(pout / pin)?)
        } else {
            None
        };
        Ok(Conversion {
            iin,
            pin,
            pout,
            pdiss: pin - pout,
            efficiency,
        })
    }
}
