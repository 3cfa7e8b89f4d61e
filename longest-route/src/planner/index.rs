//! Connectivity index: which legs can follow which arrivals.
//!
//! Legality of a connection depends on the pair of consecutive tracks, not
//! only on the current station: transfer rules name both tracks, and riding
//! straight back needs a longer wait. A node of the index is therefore a
//! `(station, arrival time, previous station)` triple, and each node lists
//! the legs a traveller standing there may board next.
//!
//! Outside the canonical day start only the earliest-arriving leg per
//! destination is kept. This keeps the index small but can hide a later
//! departure that would have made a better onward connection.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::Duration;
use tracing::debug;

use super::config::{EngineConfig, SearchOptions};
use crate::domain::{Clock, Leg, Station, Track};
use crate::timetable::{TransferRuleSet, TripCatalog};

/// A place in time: standing at `station` at `time`, having come from `previous`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeKey {
    pub station: Station,
    pub time: Clock,
    pub previous: Station,
}

impl NodeKey {
    pub fn new(station: Station, time: Clock, previous: Station) -> Self {
        Self {
            station,
            time,
            previous,
        }
    }
}

/// The legs from a node to one destination.
///
/// Holds every candidate at the day start and exactly one leg elsewhere.
#[derive(Debug, Clone)]
pub struct Continuation {
    destination: Station,
    legs: Vec<Leg>,
}

impl Continuation {
    pub fn destination(&self) -> &Station {
        &self.destination
    }

    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    /// The preferred leg: the earliest arrival outside the day start, the
    /// first listed candidate at it.
    pub fn best(&self) -> &Leg {
        // Never empty: a continuation is created together with its first leg.
        &self.legs[0]
    }
}

/// Compiled reachability structure, built once per run.
#[derive(Debug, Clone, Default)]
pub struct ConnectivityIndex {
    nodes: BTreeMap<NodeKey, Vec<Continuation>>,
    origin_time: Clock,
}

/// Settings the linking pass needs.
struct LinkRules<'a> {
    transfers: &'a TransferRuleSet,
    day_start: Clock,
    min_return_wait: Duration,
    enforce_safety: bool,
}

impl LinkRules<'_> {
    /// Whether `leg` may follow an arrival at `at` coming from `previous`.
    fn admits(&self, previous: &Station, leg: &Leg, at: Clock, wait: Duration) -> bool {
        if !self.enforce_safety {
            return true;
        }
        if leg.destination() == previous && wait < self.min_return_wait {
            return false;
        }
        let incoming = Track::new(previous.clone(), leg.origin().clone());
        self.transfers.permits(&incoming, &leg.track(), at, wait)
    }
}

impl ConnectivityIndex {
    /// Build the index from the trip catalog.
    ///
    /// Seeding registers every arrival as a node, plus start nodes at the
    /// origin time for stations served within the maximum wait of it.
    /// Linking then attaches each leg to every node at its origin that lies
    /// within the maximum wait before its departure.
    pub fn build(
        trips: &TripCatalog,
        transfers: &TransferRuleSet,
        config: &EngineConfig,
        options: &SearchOptions,
    ) -> Self {
        let origin_time = options.origin_time(config);
        let max_wait = config.max_wait();
        let rules = LinkRules {
            transfers,
            day_start: config.day_start,
            min_return_wait: config.min_return_wait(),
            enforce_safety: !options.ignore_transfer_safety,
        };

        let mut nodes: BTreeMap<NodeKey, Vec<Continuation>> = BTreeMap::new();
        // station -> time -> previous stations registered there, in first-seen order
        let mut arrivals: HashMap<Station, BTreeMap<Clock, Vec<Station>>> = HashMap::new();

        let mut register = |station: &Station, time: Clock, previous: &Station| {
            let key = NodeKey::new(station.clone(), time, previous.clone());
            if nodes.contains_key(&key) {
                return;
            }
            nodes.insert(key, Vec::new());
            arrivals
                .entry(station.clone())
                .or_default()
                .entry(time)
                .or_default()
                .push(previous.clone());
        };

        for leg in trips.iter() {
            register(leg.destination(), leg.arrival(), leg.origin());
            if leg.departure() <= origin_time + max_wait {
                register(leg.origin(), origin_time, leg.origin());
                register(leg.destination(), origin_time, leg.destination());
            }
        }

        for leg in trips.iter() {
            let Some(times) = arrivals.get(leg.origin()) else {
                continue;
            };
            let earliest = (leg.departure() - max_wait).max(origin_time);
            if earliest > leg.departure() {
                continue;
            }

            for (&at, previous_stations) in times.range(earliest..=leg.departure()) {
                let wait = leg.departure().signed_duration_since(at);
                for previous in previous_stations {
                    let key = NodeKey::new(leg.origin().clone(), at, previous.clone());
                    let Some(continuations) = nodes.get_mut(&key) else {
                        continue;
                    };
                    if at == rules.day_start {
                        append_start_option(continuations, leg);
                    } else {
                        link_best(continuations, leg, previous, at, wait, &rules);
                    }
                }
            }
        }

        let index = Self { nodes, origin_time };
        debug!(
            nodes = index.node_count(),
            continuations = index.continuation_count(),
            "Built connectivity index"
        );
        index
    }

    /// The time start nodes are anchored at.
    pub fn origin_time(&self) -> Clock {
        self.origin_time
    }

    /// Legs that may follow arriving at `station` at `time` from `previous`.
    pub fn continuations(
        &self,
        station: &Station,
        time: Clock,
        previous: &Station,
    ) -> &[Continuation] {
        let key = NodeKey::new(station.clone(), time, previous.clone());
        self.nodes.get(&key).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Nodes a route can start from, in station order.
    pub fn start_nodes(&self) -> impl Iterator<Item = (&Station, &[Continuation])> {
        self.nodes
            .iter()
            .filter(|(key, _)| key.time == self.origin_time && key.previous == key.station)
            .map(|(key, continuations)| (&key.station, continuations.as_slice()))
    }

    /// All nodes with their continuations, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeKey, &[Continuation])> {
        self.nodes.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn contains_node(&self, key: &NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of (node, destination) continuations.
    pub fn continuation_count(&self) -> usize {
        self.nodes.values().map(|v| v.len()).sum()
    }

    /// Distinct whole-number average speeds per track, fastest first.
    ///
    /// Uses the preferred leg of every continuation in the index.
    pub fn speed_table(&self) -> Vec<(Track, Vec<u32>)> {
        let mut speeds: BTreeMap<Track, BTreeSet<u32>> = BTreeMap::new();
        for (key, continuations) in &self.nodes {
            for continuation in continuations {
                let track = Track::new(key.station.clone(), continuation.destination.clone());
                speeds
                    .entry(track)
                    .or_default()
                    .insert(continuation.best().average_speed() as u32);
            }
        }

        speeds
            .into_iter()
            .map(|(track, set)| (track, set.into_iter().rev().collect()))
            .collect()
    }
}

/// At the day start every way of leaving the station is kept.
fn append_start_option(continuations: &mut Vec<Continuation>, leg: &Leg) {
    match continuations
        .iter_mut()
        .find(|c| &c.destination == leg.destination())
    {
        Some(existing) => existing.legs.push(leg.clone()),
        None => continuations.push(Continuation {
            destination: leg.destination().clone(),
            legs: vec![leg.clone()],
        }),
    }
}

/// Elsewhere a leg replaces the current one only if it arrives earlier and
/// the connection is safe.
fn link_best(
    continuations: &mut Vec<Continuation>,
    leg: &Leg,
    previous: &Station,
    at: Clock,
    wait: Duration,
    rules: &LinkRules<'_>,
) {
    let existing = continuations
        .iter_mut()
        .find(|c| &c.destination == leg.destination());
    if let Some(current) = &existing
        && leg.arrival() >= current.best().arrival()
    {
        return;
    }
    if !rules.admits(previous, leg, at, wait) {
        return;
    }

    match existing {
        Some(current) => current.legs = vec![leg.clone()],
        None => continuations.push(Continuation {
            destination: leg.destination().clone(),
            legs: vec![leg.clone()],
        }),
    }
}
