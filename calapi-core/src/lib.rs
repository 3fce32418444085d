//! Calendar aggregation engine for calapi.
//!
//! Reads today's events from a set of iCal sources (files and URLs),
//! normalizes them, filters them through an ordered rule list, and serves the
//! merged result from an in-memory cache:
//! - `config` for the source list, rules and timing settings
//! - `source` for the per-source fetch/parse/normalize/filter pipeline
//! - `cache` for the concurrent refresh and atomically published snapshot
//! - `resolver` for picking the event happening right now
//! - `service` for the operations the HTTP layer exposes

pub mod cache;
pub mod config;
pub mod date_range;
pub mod error;
pub mod event;
pub mod filter;
pub mod ics;
pub mod normalize;
pub mod resolver;
pub mod rules;
pub mod scheduler;
pub mod service;
pub mod source;
pub mod status;

pub use cache::AggregationCache;
pub use error::{CalApiError, CalApiResult};
pub use event::{BusyState, CustomStatus, Event, Snapshot};
pub use filter::CalendarFilter;
pub use rules::{Rule, RuleKey};
pub use scheduler::RefreshScheduler;
pub use service::{CalendarResponse, CalendarService, FORCE_REFRESH_TIMEOUT, RefreshResponse};
