/// Trading costs, in percentage points (0.02 means 0.02%).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeConfig {
    pub cex_fee_percent: f64,
    pub dex_fee_percent: f64,
    pub slippage_percent: f64,
}

impl FeeConfig {
    /// Costs are summed linearly; no compounding, same for both directions.
    pub fn total(&self) -> f64 {
        self.cex_fee_percent + self.dex_fee_percent + self.slippage_percent
    }
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            cex_fee_percent: 0.02,
            dex_fee_percent: 0.08,
            slippage_percent: 0.02,
        }
    }
}

/// Gross and net spreads for both directions, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spreads {
    pub gross_a: f64,
    pub gross_b: f64,
    pub net_a: f64,
    pub net_b: f64,
}

/// Direction A: buy on CEX at ask, sell on DEX at bid.
/// Direction B: buy on DEX at ask, sell on CEX at bid.
///
/// Callers must pass strictly positive prices.
pub fn compute_spreads(
    cex_bid: f64,
    cex_ask: f64,
    dex_bid: f64,
    dex_ask: f64,
    fees: &FeeConfig,
) -> Spreads {
    let gross_a = (dex_bid - cex_ask) / cex_ask * 100.0;
    let gross_b = (cex_bid - dex_ask) / dex_ask * 100.0;
    let total = fees.total();
    Spreads {
        gross_a,
        gross_b,
        net_a: gross_a - total,
        net_b: gross_b - total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn reference_spreads() {
        let fees = FeeConfig {
            cex_fee_percent: 0.1,
            dex_fee_percent: 0.3,
            slippage_percent: 0.1,
        };
        let s = compute_spreads(100.0, 101.0, 102.0, 103.0, &fees);
        assert!(close(s.gross_a, 0.990), "{}", s.gross_a);
        assert!(close(s.net_a, 0.490), "{}", s.net_a);
        assert!(close(s.gross_b, -2.913), "{}", s.gross_b);
        assert!(close(s.net_b, -3.413), "{}", s.net_b);
    }

    #[test]
    fn zero_fees_net_equals_gross() {
        let fees = FeeConfig {
            cex_fee_percent: 0.0,
            dex_fee_percent: 0.0,
            slippage_percent: 0.0,
        };
        let s = compute_spreads(10.0, 10.0, 10.0, 10.0, &fees);
        assert_eq!(s.gross_a, 0.0);
        assert_eq!(s.net_a, s.gross_a);
        assert_eq!(s.net_b, s.gross_b);
    }

    #[test]
    fn default_fee_total() {
        assert!((FeeConfig::default().total() - 0.12).abs() < 1e-12);
    }
}
