//! Printing improved routes and the speed report.

use std::io::{self, Write};

use super::route::{Route, RouteStep};
use crate::domain::{Track, format_span};

/// Receives every route that beats the best distance found so far.
///
/// The search only needs somewhere to send improvements; tests collect them
/// in memory and the binary prints them.
pub trait RouteSink {
    fn improved(&mut self, route: &Route, distance: f64) -> io::Result<()>;
}

impl<S: RouteSink + ?Sized> RouteSink for &mut S {
    fn improved(&mut self, route: &Route, distance: f64) -> io::Result<()> {
        (**self).improved(route, distance)
    }
}

/// Writes improved routes in the history file format.
///
/// Each step is one line:
/// `departure arrival wait distance gap speed origin destination`,
/// followed by a `# largest distance : <d>` trailer. The output can be fed
/// back in as a history file.
#[derive(Debug)]
pub struct RouteRecorder<W: Write> {
    out: W,
}

impl<W: Write> RouteRecorder<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RouteSink for RouteRecorder<W> {
    fn improved(&mut self, route: &Route, distance: f64) -> io::Result<()> {
        for step in route.steps() {
            writeln!(self.out, "{}", format_step(step))?;
        }
        writeln!(self.out, "# largest distance : {distance:.1}")?;
        self.out.flush()
    }
}

/// One route step as a printed line.
pub fn format_step(step: &RouteStep) -> String {
    format!(
        "{} {} {} {:.1} {:.1} {} {} {}",
        step.departure,
        step.arrival,
        format_span(step.wait),
        step.distance,
        step.gap,
        step.speed as i64,
        step.origin,
        step.destination,
    )
}

/// Print each track's speeds, fastest first, followed by the track.
pub fn write_speed_table<W: Write>(mut out: W, table: &[(Track, Vec<u32>)]) -> io::Result<()> {
    for (track, speeds) in table {
        for speed in speeds {
            write!(out, "{speed} ")?;
        }
        writeln!(out, "{track}")?;
    }
    out.flush()
}
