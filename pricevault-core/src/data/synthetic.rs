//! Synthetic data provider for offline runs and tests.
//!
//! Produces a deterministic random walk from a starting price of 100.0, one
//! bar per weekday. Same ticker and range always yield the same bars.

use super::provider::{DataError, DataProvider, DataSource, FetchResult, PriceBar};
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Default, Clone, Copy)]
pub struct SyntheticProvider;

impl SyntheticProvider {
    pub fn new() -> Self {
        Self
    }

    /// Generate weekday bars for `symbol` over `[start, end]`.
    pub fn generate(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<PriceBar> {
        // Deterministic seed from symbol name
        let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let mut bars = Vec::new();
        let mut price = 100.0_f64;

        for current in start.iter_days().take_while(|d| *d <= end) {
            if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                continue;
            }

            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            let open = price;
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000..5_000_000u64);

            bars.push(PriceBar {
                date: current,
                open,
                high,
                low,
                close,
                adj_close: close,
                volume,
            });

            price = close;
        }

        bars
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars: Self::generate(symbol, start, end),
            source: DataSource::Synthetic,
        })
    }
}
