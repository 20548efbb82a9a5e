//! Database integration tests.
//!
//! These run against a live PostgreSQL instance (see `test_fixtures`) and
//! are `#[ignore]`d by default; run with `cargo test -- --ignored`.

mod tagging_flow_tests;
