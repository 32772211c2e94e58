//! Search orchestrator: concurrent provider queries, validation, filtering,
//! ranking, and ordering.
//!
//! [`dispatch`] fans a search out to every provider and gathers what comes
//! back in time. The remaining modules are pure pipeline stages applied to
//! the merged batch, in this order:
//!
//! 1. [`validate`] drops structurally or temporally broken flights
//! 2. [`filter`] applies the caller's optional predicates
//! 3. [`ranking`] attaches a batch-relative best-value score
//! 4. [`sort`] fixes the final, deterministic order

pub mod dispatch;
pub mod filter;
pub mod ranking;
pub mod sort;
pub mod validate;
