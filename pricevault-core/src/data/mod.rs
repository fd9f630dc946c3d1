//! Market data: provider trait, Yahoo and synthetic sources, and the fetcher.

pub mod fetcher;
pub mod provider;
pub mod series;
pub mod synthetic;
pub mod yahoo;

pub use fetcher::DataFetcher;
pub use provider::{DataError, DataProvider, DataSource, FetchResult, PriceBar};
pub use series::PriceSeries;
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
