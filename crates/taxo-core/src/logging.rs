//! Structured logging schema and field name constants for the taxo engine.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized field names across
//! every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "engine", "db", "jobs"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "manager", "recommender", "pool", "trending"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "process_document_tags", "merge", "suggest", "recompute"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Tag UUID being operated on.
pub const TAG_ID: &str = "tag_id";

/// Canonical tag name.
pub const TAG_NAME: &str = "tag_name";

/// Document UUID a tagging event refers to.
pub const DOCUMENT_ID: &str = "document_id";

/// Actor (user identifier) attached to a tagging event.
pub const ACTOR: &str = "actor";

/// Recommendation strategy name.
pub const STRATEGY: &str = "strategy";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of tags involved in an operation.
pub const TAG_COUNT: &str = "tag_count";

/// Number of results returned by a query or suggestion call.
pub const RESULT_COUNT: &str = "result_count";

/// Trending window length in days.
pub const WINDOW_DAYS: &str = "window_days";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
