//! Longest-route planner.
//!
//! This module answers: "starting at the beginning of the travel day, which
//! sequence of trains covers the most distinct track before the day ends?"
//!
//! The timetable is compiled once into a [`ConnectivityIndex`]. A
//! depth-first [`SearchEngine`] then extends routes leg by leg, pruning
//! branches that fall too far behind the best distance seen by the same
//! minute in the [`BoundTable`]. Every improvement is handed to a
//! [`RouteSink`].

mod bounds;
mod config;
pub mod history;
mod index;
mod recorder;
mod route;
mod search;


pub use bounds::{BOUND_HORIZON, BoundTable};
pub use config::{ConfigError, EngineConfig, SearchOptions, WaypointConfig};
pub use index::{ConnectivityIndex, Continuation, NodeKey};
pub use recorder::{RouteRecorder, RouteSink, format_step, write_speed_table};
pub use route::{Descent, Route, RouteStep, SearchState, TravelledSet};
pub use search::{SearchEngine, SearchError, SearchSummary, waypoint_visited};
