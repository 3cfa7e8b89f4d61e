//! Depth-first branch-and-bound search for the longest route.
//!
//! Starting from every start node, the engine extends the route one
//! continuation at a time and backtracks when no extension is allowed. A
//! branch is abandoned when it falls more than the beam size below the best
//! distance any earlier route had covered by the same minute, which makes
//! the search fast but not exhaustive.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, trace};

use super::bounds::BoundTable;
use super::config::{EngineConfig, SearchOptions, WaypointConfig};
use super::index::ConnectivityIndex;
use super::recorder::RouteSink;
use super::route::{Route, RouteStep, SearchState};
use crate::domain::{Clock, Station, Track};
use crate::timetable::{PartnerRuleSet, TransferRuleSet};

/// Error from the route search.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The bound table checkpoint could not be written
    #[error("cannot write bound table {}: {source}", path.display())]
    Persist { path: PathBuf, source: io::Error },

    /// An improved route could not be written
    #[error("cannot write route: {0}")]
    Output(#[source] io::Error),
}

/// Outcome of a finished search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchSummary {
    /// Longest distance found, zero if no route was found.
    pub best_distance: f64,

    /// Number of route states visited.
    pub explored: u64,
}

/// Longest-route search over a connectivity index.
pub struct SearchEngine<'a, S: RouteSink> {
    index: &'a ConnectivityIndex,
    transfers: &'a TransferRuleSet,
    partners: &'a PartnerRuleSet,
    config: &'a EngineConfig,
    options: &'a SearchOptions,
    bounds: &'a mut BoundTable,
    checkpoint: Option<&'a Path>,
    sink: S,
    best: f64,
    deadline: Clock,
    explored: u64,
}

impl<'a, S: RouteSink> SearchEngine<'a, S> {
    pub fn new(
        index: &'a ConnectivityIndex,
        transfers: &'a TransferRuleSet,
        partners: &'a PartnerRuleSet,
        config: &'a EngineConfig,
        options: &'a SearchOptions,
        bounds: &'a mut BoundTable,
        sink: S,
    ) -> Self {
        let deadline = index.origin_time() + config.day_length();
        Self {
            index,
            transfers,
            partners,
            config,
            options,
            bounds,
            checkpoint: None,
            sink,
            best: 0.0,
            deadline,
            explored: 0,
        }
    }

    /// Save the bound table to `path` after each start station is explored.
    pub fn with_checkpoint(mut self, path: &'a Path) -> Self {
        self.checkpoint = Some(path);
        self
    }

    /// Search for routes extending `state`.
    ///
    /// An empty state searches from every start node; a state loaded from a
    /// history file resumes from its last step. The route, travelled set and
    /// distance of `state` are restored before returning.
    pub fn run(&mut self, state: &mut SearchState) -> Result<SearchSummary, SearchError> {
        if let Some(first) = state.route.first() {
            self.deadline = self.deadline_from(first.departure);
            info!(
                steps = state.route.len(),
                distance = state.distance,
                "Resuming from history"
            );
        }

        self.descend(state)?;

        let summary = self.summary();
        info!(
            best = summary.best_distance,
            explored = summary.explored,
            "Search finished"
        );
        Ok(summary)
    }

    pub fn summary(&self) -> SearchSummary {
        SearchSummary {
            best_distance: self.best,
            explored: self.explored,
        }
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn descend(&mut self, state: &mut SearchState) -> Result<(), SearchError> {
        self.explored += 1;
        self.note_progress(state)?;

        if state.route.is_empty() {
            self.start_routes(state)
        } else {
            self.extend(state)
        }
    }

    /// Record the route's distance in the bound table and report it if it
    /// beats every route so far.
    fn note_progress(&mut self, state: &mut SearchState) -> Result<(), SearchError> {
        let distance = state.distance;
        if distance <= 0.0 {
            return Ok(());
        }
        let (Some(first), Some(last)) = (state.route.first(), state.route.last()) else {
            return Ok(());
        };
        let (origin, start, arrival) = (first.origin.clone(), first.departure, last.arrival);

        if self.bounds.record(&origin, start, arrival, distance)
            && let Some(last) = state.route.last_mut()
        {
            last.gap = 0.0;
        }

        if distance > self.best {
            self.best = distance;
            self.sink
                .improved(&state.route, distance)
                .map_err(SearchError::Output)?;
        }
        Ok(())
    }

    /// Try every start leg from every start node.
    fn start_routes(&mut self, state: &mut SearchState) -> Result<(), SearchError> {
        let (index, options) = (self.index, self.options);
        let origin_time = index.origin_time();
        // Off the canonical day start only legs leaving exactly then count.
        let exact_start = options
            .start_time
            .filter(|&start| start != self.config.day_start);

        for (station, continuations) in index.start_nodes() {
            if let Some(first) = &options.first_station
                && first != station
            {
                continue;
            }
            debug!(%station, destinations = continuations.len(), "Exploring start station");

            for continuation in continuations {
                for leg in continuation.legs() {
                    if exact_start.is_some_and(|start| leg.departure() != start) {
                        continue;
                    }
                    self.deadline = self.deadline_from(leg.departure());
                    let wait = leg.departure().signed_duration_since(origin_time);
                    let step = RouteStep::ride(leg, wait, leg.distance());
                    let mut frame = state.descend(step, Some(leg.track()));
                    self.descend(&mut frame)?;
                }
            }

            self.save_checkpoint(station)?;
        }
        Ok(())
    }

    /// Try every continuation from the end of the route.
    fn extend(&mut self, state: &mut SearchState) -> Result<(), SearchError> {
        let index = self.index;
        let (Some(first), Some(last)) = (state.route.first(), state.route.last()) else {
            return Ok(());
        };
        let (origin, start) = (first.origin.clone(), first.departure);
        let here = last.destination.clone();
        let came_from = last.origin.clone();
        let arrived = last.arrival;
        let incoming = last.track();
        let placeholder = state.route.len() == 1 && last.distance == 0.0;
        let enforce_safety = !self.options.ignore_transfer_safety;

        for continuation in index.continuations(&here, arrived, &came_from) {
            let leg = continuation.best();
            if placeholder {
                self.deadline = self.deadline_from(leg.departure());
            }
            if leg.arrival() > self.deadline {
                continue;
            }

            let wait = leg.departure().signed_duration_since(arrived);
            if enforce_safety
                && leg.destination() == &came_from
                && wait < self.config.min_return_wait()
            {
                trace!(at = %here, "Return too quick");
                continue;
            }

            let track = leg.track();
            let repeated = state.travelled.contains(&track);
            let gained = if repeated {
                0.0
            } else {
                leg.distance() - self.overlap_with_travelled(&track, state)
            };
            let distance = state.distance + gained;
            let gap = self
                .bounds
                .best(&origin, start, leg.arrival())
                .map_or(0.0, |best| best - distance);

            let mut step = RouteStep::ride(leg, wait, gained);
            step.gap = gap;
            let mut frame = state.descend(step, (!repeated).then(|| track.clone()));

            if enforce_safety
                && let Some(waypoint) = &self.config.waypoint
                && !waypoint_visited(&frame.route, waypoint)
            {
                trace!(%track, "Waypoint missed");
                continue;
            }
            if gap > self.options.beam_size {
                trace!(%track, gap, "Beyond beam");
                continue;
            }
            if enforce_safety && !self.transfers.permits(&incoming, &track, arrived, wait) {
                trace!(%track, "Transfer too short");
                continue;
            }

            self.descend(&mut frame)?;
        }
        Ok(())
    }

    /// Distance shared between `track` and partner tracks already travelled.
    fn overlap_with_travelled(&self, track: &Track, state: &SearchState) -> f64 {
        self.partners
            .partners_of(track)
            .iter()
            .filter(|partner| state.travelled.contains(&partner.track))
            .map(|partner| partner.overlap)
            .sum()
    }

    /// Latest allowed arrival for a route departing at `departure`.
    fn deadline_from(&self, departure: Clock) -> Clock {
        let deadline = departure + self.config.day_length();
        if self.options.ignore_transfer_safety {
            deadline
        } else {
            deadline - self.config.reserve()
        }
    }

    fn save_checkpoint(&self, station: &Station) -> Result<(), SearchError> {
        let Some(path) = self.checkpoint else {
            return Ok(());
        };
        self.bounds.save(path).map_err(|source| SearchError::Persist {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            %station,
            best = self.best,
            explored = self.explored,
            "Saved bound table"
        );
        Ok(())
    }
}

/// Whether `route` satisfies the waypoint visit.
///
/// Routes still arriving before the window closes are given the benefit of
/// the doubt. Later routes need a step leaving the waypoint after at least
/// the minimum dwell, where that departure or the arrival before it falls in
/// the window.
pub fn waypoint_visited(route: &Route, waypoint: &WaypointConfig) -> bool {
    let Some(last) = route.last() else {
        return true;
    };
    if last.arrival < waypoint.window_end {
        return true;
    }

    let window = waypoint.window_start..=waypoint.window_end;
    route.steps().windows(2).any(|pair| {
        let (before, step) = (&pair[0], &pair[1]);
        step.origin.as_str() == waypoint.station
            && step.wait >= waypoint.min_dwell()
            && (window.contains(&step.departure) || window.contains(&before.arrival))
    })
}
