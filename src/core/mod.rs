//! Slot partitioning, rebalancing, and the interactive lineup builder.

/// Fairness-driven local search.
pub mod balance;
/// Stateful lineup editor.
pub mod builder;
/// Random fill and manual-assignment validation.
pub mod partition;
