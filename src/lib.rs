//! Fairness-aware lineup builder for Ryder Cup style golf trips.
//!
//! Two rosters and a session format go in; an ordered list of match slots
//! and a live fairness score come out, with drafts and published sessions
//! handed to a [`persist::LineupSink`].
//!
//! # Examples
//!
//! Building a fourball session with [`core::builder::LineupBuilder`]:
//! ```
//! use rydercup_lineup::{
//!     core::builder::{LineupBuilder, PublishMode},
//!     persist::memory::MemorySink,
//!     roster::{Player, SessionFormat},
//!     types::{FormatKind, Side},
//! };
//!
//! let side_a: Vec<Player> = (1..=8)
//!     .map(|id| Player::new(id, "Euro", format!("{id}"), id as f64, Side::A))
//!     .collect();
//! let side_b: Vec<Player> = (11..=18)
//!     .map(|id| Player::new(id, "Usa", format!("{id}"), (id - 10) as f64, Side::B))
//!     .collect();
//!
//! let format = SessionFormat::for_kind(FormatKind::Fourball);
//! let mut builder = LineupBuilder::initialize(1, side_a, side_b, format, None)
//!     .expect("initialize")
//!     .with_seed(42);
//! builder.auto_fill().expect("auto fill");
//! builder.auto_balance(16).expect("balance");
//! assert!(builder.is_complete());
//! assert!(builder.current_fairness().overall.is_some());
//!
//! let mut sink = MemorySink::new();
//! let record = builder.publish(&mut sink, PublishMode::RequireComplete).expect("publish");
//! assert_eq!(record.session_id, 1);
//! ```
//!
//! Driving the same builder through the async runtime:
//! ```no_run
//! use rydercup_lineup::{
//!     core::builder::{LineupBuilder, PublishMode},
//!     persist::sqlite::SqliteLineupStore,
//!     roster::SessionFormat,
//!     runtime::handle::{spawn_lineup_builder, RuntimeConfig},
//!     types::FormatKind,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = SqliteLineupStore::open("lineups.db").expect("open sqlite");
//! let builder = LineupBuilder::initialize(1, vec![], vec![], SessionFormat::for_kind(FormatKind::Singles), None)
//!     .expect("initialize");
//! let handle = spawn_lineup_builder(builder, Box::new(store), RuntimeConfig::default());
//! handle.auto_fill().await.expect("auto fill");
//! let _draft = handle.save_draft().await.expect("save");
//! let _ = handle.publish(PublishMode::AllowWarnings).await;
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```

/// Configuration loading.
pub mod config;
/// Partitioning, rebalancing, and the lineup builder.
pub mod core;
/// Fairness scoring and pairing history.
pub mod fairness;
/// Edit operations and persisted snapshots.
pub mod op;
/// Collaborator traits and stores.
pub mod persist;
/// Player, format, and slot value types.
pub mod roster;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Shared primitive types and the format catalog.
pub mod types;
