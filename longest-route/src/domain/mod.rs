//! Domain types for the longest-route planner.
//!
//! This module contains the core domain model types that represent
//! validated timetable data. All types enforce their invariants at
//! construction time, so code that receives these types can trust their
//! validity.

mod error;
mod leg;
mod station;
mod time;
mod track;

pub use error::DomainError;
pub use leg::Leg;
pub use station::{InvalidStation, Station};
pub use time::{Clock, TimeError, format_span, parse_span_hhmm};
pub use track::Track;
