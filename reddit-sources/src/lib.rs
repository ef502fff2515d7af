pub mod client;
pub mod fetcher;
pub mod health;
pub mod sources;

pub use fetcher::{FetchConfig, FetchOutcome, MultiSourceFetcher, DEFAULT_SUBREDDITS};
pub use health::{HealthBoard, SourceHealth, DISABLE_THRESHOLD};
pub use sources::{PostSource, SearchWindow};
