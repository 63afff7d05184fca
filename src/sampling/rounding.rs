//! Distance-dependent rounding of reported lengths

/// Decimal precision derived from the sampling step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundingPolicy {
    decimals: u32,
}

impl RoundingPolicy {
    /// Picks the precision tier for a sampling step in meters
    ///
    /// | step          | decimals |
    /// |---------------|----------|
    /// | >= 1000       | 1        |
    /// | 100 .. 1000   | 2        |
    /// | 10 .. 100     | 3        |
    /// | < 10 (or 0)   | 4        |
    pub fn for_step(step: f64) -> Self {
        let decimals = if step >= 1000.0 {
            1
        } else if step >= 100.0 {
            2
        } else if step >= 10.0 {
            3
        } else {
            4
        };
        RoundingPolicy { decimals }
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// Rounds half-to-even at the policy's precision
    ///
    /// The tie is decided on the exact binary value, so 5.00025 (stored
    /// slightly above the tie) rounds up. Values that cannot be rounded
    /// come back unchanged.
    pub fn round_value(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return value;
        }
        format!("{:.*}", self.decimals as usize, value)
            .parse::<f64>()
            .unwrap_or(value)
    }

    pub fn round(&self, value: Option<f64>) -> Option<f64> {
        value.map(|v| self.round_value(v))
    }
}
