pub mod report;
pub mod service;

pub use report::{ResearchReport, SentimentCounts};
pub use service::{ResearchHandle, ResearchService};
