//! DataFetcher: one provider call per run, errors folded into an empty series.
//!
//! The return value cannot tell "no data" apart from "fetch error"; both are
//! empty. The event sink is the only place the difference shows up
//! (`NoData` vs `FetchFailed`).

use super::provider::{DataError, DataProvider};
use super::series::PriceSeries;
use crate::events::{EventSink, PipelineEvent};
use chrono::NaiveDate;

pub struct DataFetcher<'a> {
    provider: &'a dyn DataProvider,
    events: &'a dyn EventSink,
}

impl<'a> DataFetcher<'a> {
    pub fn new(provider: &'a dyn DataProvider, events: &'a dyn EventSink) -> Self {
        Self { provider, events }
    }

    /// Fetch `symbol` over `[start, end]`. The range is passed through as-is.
    pub fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> PriceSeries {
        self.events.emit(PipelineEvent::FetchStarted {
            symbol: symbol.to_string(),
            provider: self.provider.name().to_string(),
            start,
            end,
        });

        match self.provider.fetch(symbol, start, end) {
            Ok(result) if result.bars.is_empty() => {
                self.events.emit(PipelineEvent::NoData {
                    symbol: symbol.to_string(),
                });
                PriceSeries::empty(symbol)
            }
            Ok(result) => {
                let series = PriceSeries::new(symbol, result.bars);
                self.events.emit(PipelineEvent::FetchCompleted {
                    symbol: symbol.to_string(),
                    rows: series.len(),
                });
                series
            }
            Err(DataError::SymbolNotFound { .. }) => {
                self.events.emit(PipelineEvent::NoData {
                    symbol: symbol.to_string(),
                });
                PriceSeries::empty(symbol)
            }
            Err(e) => {
                self.events.emit(PipelineEvent::FetchFailed {
                    symbol: symbol.to_string(),
                    error: e.to_string(),
                });
                PriceSeries::empty(symbol)
            }
        }
    }
}
