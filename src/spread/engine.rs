use super::types::{FeeConfig, compute_spreads};
use crate::models::{BookTop, DexSnapshot, SpreadRow, age_ms, normalize_symbol};
use crate::store::SymbolStore;
use std::sync::Arc;
use std::time::SystemTime;

/// Merges the latest CEX and DEX snapshots into one `SpreadRow` per symbol.
pub struct SpreadEngine {
    cex: Arc<SymbolStore<BookTop>>,
    dex: Arc<SymbolStore<DexSnapshot>>,
    spreads: Arc<SymbolStore<SpreadRow>>,
    fees: FeeConfig,
}

impl SpreadEngine {
    pub fn new(
        cex: Arc<SymbolStore<BookTop>>,
        dex: Arc<SymbolStore<DexSnapshot>>,
        spreads: Arc<SymbolStore<SpreadRow>>,
        fees: FeeConfig,
    ) -> Self {
        Self {
            cex,
            dex,
            spreads,
            fees,
        }
    }

    /// Recompute `symbol` using the wall clock.
    pub fn recalculate(&self, symbol: &str) -> Option<SpreadRow> {
        self.recalculate_at(symbol, SystemTime::now())
    }

    /// Recompute `symbol` as of `now`.
    ///
    /// Returns `None` and leaves any existing row untouched unless both sides
    /// are present with four strictly positive prices.
    pub fn recalculate_at(&self, symbol: &str, now: SystemTime) -> Option<SpreadRow> {
        let cex = self.cex.get(symbol)?;
        let dex = self.dex.get(symbol)?;
        if !cex.has_prices() || !dex.has_prices() {
            return None;
        }

        let s = compute_spreads(cex.bid, cex.ask, dex.bid, dex.ask, &self.fees);
        let row = SpreadRow {
            symbol: normalize_symbol(symbol),
            cex_bid: cex.bid,
            cex_ask: cex.ask,
            dex_bid: dex.bid,
            dex_ask: dex.ask,
            spread_a: s.gross_a,
            spread_b: s.gross_b,
            net_a: s.net_a,
            net_b: s.net_b,
            cex_age_ms: age_ms(cex.updated_at, now),
            dex_age_ms: age_ms(dex.updated_at, now),
            updated_at: now,
        };

        Some(
            self.spreads
                .upsert(symbol, |_| row.clone(), |current| *current = row.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AGE_NEVER_UPDATED_MS;
    use std::time::Duration;

    struct Fixture {
        cex: Arc<SymbolStore<BookTop>>,
        dex: Arc<SymbolStore<DexSnapshot>>,
        spreads: Arc<SymbolStore<SpreadRow>>,
        engine: SpreadEngine,
    }

    fn fixture() -> Fixture {
        let cex = Arc::new(SymbolStore::new());
        let dex = Arc::new(SymbolStore::new());
        let spreads = Arc::new(SymbolStore::new());
        let fees = FeeConfig {
            cex_fee_percent: 0.1,
            dex_fee_percent: 0.3,
            slippage_percent: 0.1,
        };
        let engine = SpreadEngine::new(cex.clone(), dex.clone(), spreads.clone(), fees);
        Fixture {
            cex,
            dex,
            spreads,
            engine,
        }
    }

    fn put_cex(f: &Fixture, symbol: &str, bid: f64, ask: f64, at: Option<SystemTime>) {
        f.cex.upsert(
            symbol,
            |k| BookTop {
                symbol: k.to_string(),
                bid,
                ask,
                updated_at: at,
            },
            |c| {
                c.bid = bid;
                c.ask = ask;
                c.updated_at = at;
            },
        );
    }

    fn put_dex(f: &Fixture, symbol: &str, bid: f64, ask: f64, at: Option<SystemTime>) {
        f.dex.upsert(
            symbol,
            |k| DexSnapshot {
                symbol: k.to_string(),
                bid,
                ask,
                updated_at: at,
                latency_ms: 5,
            },
            |c| {
                c.bid = bid;
                c.ask = ask;
                c.updated_at = at;
            },
        );
    }

    #[test]
    fn computes_reference_row() {
        let f = fixture();
        let now = SystemTime::now();
        put_cex(&f, "BTC_USDT", 100.0, 101.0, Some(now - Duration::from_millis(250)));
        put_dex(&f, "btc_usdt", 102.0, 103.0, Some(now - Duration::from_millis(1_000)));

        let row = f.engine.recalculate_at("Btc_Usdt", now).expect("row");
        assert_eq!(row.symbol, "BTC_USDT");
        assert!((row.spread_a - 0.990).abs() < 1e-3);
        assert!((row.net_a - 0.490).abs() < 1e-3);
        assert!((row.spread_b + 2.913).abs() < 1e-3);
        assert!((row.net_b + 3.413).abs() < 1e-3);
        assert_eq!(row.cex_age_ms, 250);
        assert_eq!(row.dex_age_ms, 1_000);
        assert_eq!(f.spreads.get("BTC_USDT"), Some(row));
    }

    #[test]
    fn missing_side_is_not_found_and_writes_nothing() {
        let f = fixture();
        put_cex(&f, "A", 1.0, 2.0, Some(SystemTime::now()));
        assert!(f.engine.recalculate("A").is_none());
        assert!(f.engine.recalculate("B").is_none());
        assert!(f.spreads.is_empty());
    }

    #[test]
    fn non_positive_price_keeps_previous_row() {
        let f = fixture();
        let now = SystemTime::now();
        put_cex(&f, "A", 100.0, 101.0, Some(now));
        put_dex(&f, "A", 102.0, 103.0, Some(now));
        let before = f.engine.recalculate_at("A", now).unwrap();

        for (cb, ca, db, da) in [
            (0.0, 101.0, 102.0, 103.0),
            (100.0, -1.0, 102.0, 103.0),
            (100.0, 101.0, 0.0, 103.0),
            (100.0, 101.0, 102.0, 0.0),
        ] {
            put_cex(&f, "A", cb, ca, Some(now));
            put_dex(&f, "A", db, da, Some(now));
            assert!(f.engine.recalculate_at("A", now).is_none());
            assert_eq!(f.spreads.get("A"), Some(before.clone()));
        }
    }

    #[test]
    fn identical_inputs_give_identical_rows_except_timestamp() {
        let f = fixture();
        let t0 = SystemTime::now();
        put_cex(&f, "A", 100.0, 101.0, Some(t0));
        put_dex(&f, "A", 102.0, 103.0, Some(t0));

        let first = f.engine.recalculate_at("A", t0).unwrap();
        let again = f.engine.recalculate_at("A", t0).unwrap();
        assert_eq!(first, again);

        let later = f
            .engine
            .recalculate_at("A", t0 + Duration::from_millis(40))
            .unwrap();
        assert_eq!(later.spread_a, first.spread_a);
        assert_eq!(later.net_b, first.net_b);
        assert!(later.cex_age_ms >= first.cex_age_ms);
        assert!(later.dex_age_ms >= first.dex_age_ms);
        assert_eq!(f.spreads.len(), 1);
    }

    #[test]
    fn never_updated_side_reports_sentinel_age() {
        let f = fixture();
        put_cex(&f, "A", 100.0, 101.0, None);
        put_dex(&f, "A", 102.0, 103.0, Some(SystemTime::now()));
        let row = f.engine.recalculate("A").unwrap();
        assert_eq!(row.cex_age_ms, AGE_NEVER_UPDATED_MS);
        assert!(row.dex_age_ms < AGE_NEVER_UPDATED_MS);
    }
}
