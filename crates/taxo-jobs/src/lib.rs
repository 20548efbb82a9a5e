//! # taxo-jobs
//!
//! Batch jobs for the taxo tag engine.
//!
//! This crate provides:
//! - [`trending::TrendingRecalculator`]: the periodic trending score
//!   recomputation over the usage-history window
//! - [`cleanup::UnusedTagSweeper`]: removal of long-unused, zero-usage
//!   tags
//! - [`backfill::TaxonomyBackfill`]: rebuilding derived state from the
//!   document↔tag links when adopting an existing corpus
//! - [`scheduler::JobScheduler`]: an interval loop driving the periodic
//!   jobs inside the host process
//!
//! ## Example
//!
//! ```ignore
//! use taxo_db::Database;
//! use taxo_jobs::{JobScheduler, TrendingRecalculator};
//! use tokio::sync::watch;
//!
//! let db = Database::connect("postgres://...").await?;
//!
//! // One-shot recompute:
//! let stats = TrendingRecalculator::new(db.clone()).run().await?;
//!
//! // Or run everything on a schedule:
//! let (_stop, shutdown) = watch::channel(false);
//! JobScheduler::new(db).run(shutdown).await;
//! ```

pub mod backfill;
pub mod cleanup;
pub mod scheduler;
pub mod trending;

pub use backfill::{BackfillConfig, BackfillStats, TaxonomyBackfill};
pub use cleanup::{CleanupConfig, UnusedTagSweeper};
pub use scheduler::{JobScheduler, SchedulerConfig};
pub use trending::{trending_score, TrendingConfig, TrendingRecalculator, TrendingStats};
