//! Longest one-day train route planner.
//!
//! Reads a timetable of direct train legs and searches for the itinerary
//! covering the most distinct track within one travel day, subject to
//! transfer rules, overlapping tracks and a mandatory waypoint visit.

pub mod domain;
pub mod planner;
pub mod timetable;
