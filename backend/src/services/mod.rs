//! Business logic services for the irrigation advisory pipeline

pub mod advisory;
pub mod cache;
pub mod geo_resolver;
pub mod pipeline;
pub mod records;
pub mod retry;
pub mod weather;

pub use advisory::{build_prompt, AdvisoryComposer, FALLBACK_ADVICE};
pub use cache::TtlCache;
pub use geo_resolver::GeoResolver;
pub use pipeline::{AdvisoryPipeline, StageBudgets};
pub use records::{MemoryRecordSink, PgRecordSink, RecordSink};
pub use retry::RetryPolicy;
pub use weather::WeatherProvider;
