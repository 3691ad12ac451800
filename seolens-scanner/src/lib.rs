pub mod crawler;
pub mod error;
pub mod pagespeed;
pub mod record;
pub mod search;
pub mod sitemap;

pub use crawler::{CrawlBatch, Crawler, ProgressCallback};
pub use error::ScanError;
pub use pagespeed::PageSpeedClient;
pub use record::{
    CrawlRecord, Opportunity, PerformanceRecord, SearchPerformanceRecord, Strategy,
    StructuredDataRecord,
};
