//! Routes under construction and the tracks they use.
//!
//! The search extends one [`SearchState`] in place. Every extension goes
//! through a [`Descent`] guard which undoes it when dropped, so the state is
//! restored on every way out of a branch: normal return, pruning, or an
//! error propagated with `?`.

use std::collections::HashSet;
use std::ops::{Deref, DerefMut};

use chrono::Duration;

use crate::domain::{Clock, Leg, Station, Track};

/// One leg of a route as travelled.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStep {
    pub origin: Station,
    pub destination: Station,
    pub departure: Clock,
    pub arrival: Clock,
    /// Time spent at the origin before departing.
    pub wait: Duration,
    /// Distance this step adds to the route, net of repeats and overlaps.
    pub distance: f64,
    pub speed: f64,
    /// How far the route was below the best known distance on arrival.
    pub gap: f64,
}

impl RouteStep {
    /// A step riding `leg`, adding `distance` after waiting `wait`.
    pub fn ride(leg: &Leg, wait: Duration, distance: f64) -> Self {
        Self {
            origin: leg.origin().clone(),
            destination: leg.destination().clone(),
            departure: leg.departure(),
            arrival: leg.arrival(),
            wait,
            distance,
            speed: leg.average_speed(),
            gap: 0.0,
        }
    }

    pub fn track(&self) -> Track {
        Track::new(self.origin.clone(), self.destination.clone())
    }
}

/// An ordered sequence of steps with strictly increasing arrivals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Route {
    steps: Vec<RouteStep>,
}

impl Route {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[RouteStep] {
        &self.steps
    }

    pub fn first(&self) -> Option<&RouteStep> {
        self.steps.first()
    }

    pub fn last(&self) -> Option<&RouteStep> {
        self.steps.last()
    }

    pub fn last_mut(&mut self) -> Option<&mut RouteStep> {
        self.steps.last_mut()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Sum of step distances.
    pub fn total_distance(&self) -> f64 {
        self.steps.iter().map(|s| s.distance).sum()
    }

    pub(crate) fn push(&mut self, step: RouteStep) {
        debug_assert!(
            self.last().is_none_or(|last| step.arrival > last.arrival),
            "arrivals must strictly increase"
        );
        self.steps.push(step);
    }

    pub(crate) fn pop(&mut self) -> Option<RouteStep> {
        self.steps.pop()
    }
}

/// Tracks used by the route in progress. Both directions of a track are
/// always present or absent together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TravelledSet {
    tracks: HashSet<Track>,
}

impl TravelledSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, track: &Track) -> bool {
        self.tracks.contains(track)
    }

    /// Mark `track` and its reverse as used. Returns false if already used.
    pub fn claim(&mut self, track: &Track) -> bool {
        if self.tracks.contains(track) {
            return false;
        }
        self.tracks.insert(track.reverse());
        self.tracks.insert(track.clone());
        true
    }

    /// Unmark `track` and its reverse.
    pub fn release(&mut self, track: &Track) {
        self.tracks.remove(track);
        self.tracks.remove(&track.reverse());
    }

    /// Number of directed entries (two per physical track).
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// The route being explored together with its bookkeeping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub route: Route,
    pub travelled: TravelledSet,
    pub distance: f64,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend the route by `step`. If `claim` is given, that track is
    /// marked travelled for the lifetime of the returned guard.
    pub fn descend(&mut self, step: RouteStep, claim: Option<Track>) -> Descent<'_> {
        let prior_distance = self.distance;
        let claimed = claim.filter(|track| self.travelled.claim(track));
        self.distance += step.distance;
        self.route.push(step);
        Descent {
            state: self,
            claimed,
            prior_distance,
        }
    }
}

/// A single extension of a [`SearchState`], undone on drop.
///
/// Derefs to the extended state so the search can keep descending through it.
#[derive(Debug)]
pub struct Descent<'a> {
    state: &'a mut SearchState,
    claimed: Option<Track>,
    prior_distance: f64,
}

impl Deref for Descent<'_> {
    type Target = SearchState;

    fn deref(&self) -> &SearchState {
        self.state
    }
}

impl DerefMut for Descent<'_> {
    fn deref_mut(&mut self) -> &mut SearchState {
        self.state
    }
}

impl Drop for Descent<'_> {
    fn drop(&mut self) {
        self.state.route.pop();
        if let Some(track) = self.claimed.take() {
            self.state.travelled.release(&track);
        }
        self.state.distance = self.prior_distance;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(s: &str) -> Station {
        Station::parse(s).unwrap()
    }

    fn clock(s: &str) -> Clock {
        Clock::parse_hhmm(s).unwrap()
    }

    fn track(a: &str, b: &str) -> Track {
        Track::new(station(a), station(b))
    }

    fn step(from: &str, to: &str, dep: &str, arr: &str, distance: f64) -> RouteStep {
        let leg = Leg::new(station(from), station(to), clock(dep), clock(arr), distance).unwrap();
        RouteStep::ride(&leg, Duration::zero(), distance)
    }

    #[test]
    fn claim_marks_both_directions() {
        let mut set = TravelledSet::new();
        assert!(set.claim(&track("A", "B")));
        assert!(set.contains(&track("A", "B")));
        assert!(set.contains(&track("B", "A")));
        assert!(!set.claim(&track("B", "A")));
        assert_eq!(set.len(), 2);

        set.release(&track("B", "A"));
        assert!(set.is_empty());
    }

    #[test]
    fn descent_restores_state_on_drop() {
        let mut state = SearchState::new();
        let before = state.clone();

        {
            let mut first = state.descend(step("A", "B", "08:00", "08:30", 10.0), Some(track("A", "B")));
            assert_eq!(first.distance, 10.0);
            assert!(first.travelled.contains(&track("B", "A")));
            {
                let second =
                    first.descend(step("B", "C", "08:40", "09:10", 15.0), Some(track("B", "C")));
                assert_eq!(second.distance, 25.0);
                assert_eq!(second.route.len(), 2);
            }
            assert_eq!(first.distance, 10.0);
            assert_eq!(first.route.len(), 1);
            assert!(!first.travelled.contains(&track("B", "C")));
        }

        assert_eq!(state, before);
    }

    #[test]
    fn repeated_track_is_not_released_by_inner_descent() {
        let mut state = SearchState::new();
        let mut outer = state.descend(step("A", "B", "08:00", "08:30", 10.0), Some(track("A", "B")));
        {
            // Riding back over the same track claims nothing new.
            let inner = outer.descend(step("B", "A", "08:35", "09:00", 0.0), Some(track("B", "A")));
            assert_eq!(inner.distance, 10.0);
        }
        assert!(outer.travelled.contains(&track("A", "B")));
    }

    #[test]
    fn descent_restores_on_early_return() {
        fn fails(state: &mut SearchState) -> Result<(), &'static str> {
            let _frame = state.descend(step("A", "B", "08:00", "08:30", 10.0), Some(track("A", "B")));
            Err("pruned")
        }

        let mut state = SearchState::new();
        assert!(fails(&mut state).is_err());
        assert_eq!(state, SearchState::new());
    }

    #[test]
    fn total_distance_sums_steps() {
        let mut state = SearchState::new();
        let mut a = state.descend(step("A", "B", "08:00", "08:30", 10.0), None);
        let b = a.descend(step("B", "C", "08:40", "09:10", 12.5), None);
        assert_eq!(b.route.total_distance(), 22.5);
    }
}
