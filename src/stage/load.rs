//! Terminal consumers.

use crate::engine::UnresolvedCause;

use super::{finite, UNLIMITED_VOLTAGE};

/// How a load draws from its rail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadDemand {
    /// Constant current in amps, independent of rail voltage
    Current(f64),
    /// Constant power in watts; current follows `power / vin`
    Power(f64),
}

impl LoadDemand {
    /// Current drawn from a rail at `vin`.
    pub fn current_at(&self, vin: f64) -> Result<f64, UnresolvedCause> {
        if vin == 0.0 {
            return Err(UnresolvedCause::ZeroInputVoltage);
        }
        match *self {
            LoadDemand::Current(i) => finite(i),
            LoadDemand::Power(p) => finite(p / vin),
        }
    }
}

/// Parameters of a load stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadParams {
    /// Lowest acceptable supply voltage
    pub vin_min: f64,
    /// Highest acceptable supply voltage
    pub vin_max: f64,
    /// Fixed current or fixed power draw
    pub demand: LoadDemand,
}

impl LoadParams {
    /// A load drawing a fixed current, with no input voltage limits.
    pub fn current(amps: f64) -> Self {
        Self {
            vin_min: 0.0,
            vin_max: UNLIMITED_VOLTAGE,
            demand: LoadDemand::Current(amps),
        }
    }

    /// A load drawing a fixed power, with no input voltage limits.
    pub fn power(watts: f64) -> Self {
        Self {
            vin_min: 0.0,
            vin_max: UNLIMITED_VOLTAGE,
            demand: LoadDemand::Power(watts),
        }
    }

    /// Set the acceptable input voltage window.
    pub fn with_input_range(mut self, vin_min: f64, vin_max: f64) -> Self {
        self.vin_min = vin_min;
        self.vin_max = vin_max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_constant_current_ignores_voltage() {
        let load = LoadParams::current(0.25);
        assert_eq!(load.demand.current_at(3.3), Ok(0.25));
        assert_eq!(load.demand.current_at(5.0), Ok(0.25));
    }

    #[test]
    fn test_constant_power_scales_with_voltage() {
        let load = LoadParams::power(1.0);
        assert_relative_eq!(load.demand.current_at(5.0).unwrap(), 0.2);
        assert_relative_eq!(load.demand.current_at(2.5).unwrap(), 0.4);
    }

    #[test]
    fn test_zero_rail_is_unresolved() {
        let load = LoadParams::power(1.0);
        assert_eq!(
            load.demand.current_at(0.0),
            Err(UnresolvedCause::ZeroInputVoltage)
        );
    }
}
