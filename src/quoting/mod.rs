//! Quote acquisition pipeline.
//!
//! # Data Flow
//! ```text
//! orchestrator.rs ── spawns ──▶ pipeline.rs
//!                                 → fetcher.rs   (Deadline: upstream budget)
//!                                 → extractor.rs (pure)
//!                                 → storage      (Deadline: persist budget)
//!                 ◀── oneshot ────┘
//!       races the result against the caller's CancellationToken
//! ```

pub mod extractor;
pub mod fetcher;
pub mod orchestrator;
pub mod pipeline;
pub mod types;

pub use extractor::{ExtractError, QuoteExtractor};
pub use fetcher::{FetchError, UpstreamFetcher};
pub use orchestrator::{Orchestrator, Outcome};
pub use pipeline::{PipelineError, QuotePipeline, QuoteSink, QuoteSource, Stage, StageBudgets};
pub use types::{InvalidQuote, Quote};
