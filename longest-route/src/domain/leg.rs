//! Train leg type.
//!
//! A `Leg` is one scheduled ride between two adjacent timetable stations,
//! with fixed departure and arrival times and the distance covered.

use chrono::Duration;

use super::{Clock, DomainError, Station, Track};

/// One scheduled train ride.
///
/// # Invariants
///
/// - `departure < arrival` (no leg crosses the end of the modeled day)
/// - `distance` is finite and non-negative
#[derive(Debug, Clone, PartialEq)]
pub struct Leg {
    origin: Station,
    destination: Station,
    departure: Clock,
    arrival: Clock,
    distance: f64,
}

impl Leg {
    /// Construct a leg, validating its times and distance.
    ///
    /// # Examples
    ///
    /// ```
    /// use longest_route::domain::{Clock, Leg, Station};
    ///
    /// let a = Station::parse("A").unwrap();
    /// let b = Station::parse("B").unwrap();
    /// let dep = Clock::parse_hhmm("08:00").unwrap();
    /// let arr = Clock::parse_hhmm("08:30").unwrap();
    ///
    /// let leg = Leg::new(a.clone(), b.clone(), dep, arr, 10.0).unwrap();
    /// assert_eq!(leg.average_speed(), 20.0);
    ///
    /// // Arriving before departing is rejected
    /// assert!(Leg::new(a, b, arr, dep, 10.0).is_err());
    /// ```
    pub fn new(
        origin: Station,
        destination: Station,
        departure: Clock,
        arrival: Clock,
        distance: f64,
    ) -> Result<Self, DomainError> {
        if departure >= arrival {
            return Err(DomainError::InvalidLeg("departure must be before arrival"));
        }
        if !distance.is_finite() || distance < 0.0 {
            return Err(DomainError::InvalidLeg("distance must be non-negative"));
        }

        Ok(Self {
            origin,
            destination,
            departure,
            arrival,
            distance,
        })
    }

    pub fn origin(&self) -> &Station {
        &self.origin
    }

    pub fn destination(&self) -> &Station {
        &self.destination
    }

    pub fn departure(&self) -> Clock {
        self.departure
    }

    pub fn arrival(&self) -> Clock {
        self.arrival
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Time spent on the train.
    pub fn duration(&self) -> Duration {
        self.arrival.signed_duration_since(self.departure)
    }

    /// Average speed in distance units per hour.
    pub fn average_speed(&self) -> f64 {
        60.0 * self.distance / self.duration().num_minutes() as f64
    }

    /// The track this leg rides, in its direction of travel.
    pub fn track(&self) -> Track {
        Track::new(self.origin.clone(), self.destination.clone())
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

    #[test]
    fn valid_leg() {
        let leg = Leg::new(station("A"), station("B"), clock("08:00"), clock("08:45"), 60.0).unwrap();
        assert_eq!(leg.duration(), Duration::minutes(45));
        assert_eq!(leg.average_speed(), 80.0);
        assert_eq!(leg.track(), Track::new(station("A"), station("B")));
    }

    #[test]
    fn equal_times_rejected() {
        let err = Leg::new(station("A"), station("B"), clock("08:00"), clock("08:00"), 1.0).unwrap_err();
        assert_eq!(err.to_string(), "invalid leg: departure must be before arrival");
    }

    #[test]
    fn negative_distance_rejected() {
        assert!(Leg::new(station("A"), station("B"), clock("08:00"), clock("08:10"), -1.0).is_err());
        assert!(Leg::new(station("A"), station("B"), clock("08:00"), clock("08:10"), f64::NAN).is_err());
    }

    #[test]
    fn zero_distance_allowed() {
        let leg = Leg::new(station("A"), station("B"), clock("08:00"), clock("08:10"), 0.0).unwrap();
        assert_eq!(leg.average_speed(), 0.0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: a leg is accepted exactly when it departs before it arrives.
        #[test]
        fn accepted_iff_departure_before_arrival(
            dep in 0u32..1500,
            arr in 0u32..1500,
            distance in 0.0f64..500.0,
        ) {
            let result = Leg::new(
                Station::parse("A").unwrap(),
                Station::parse("B").unwrap(),
                Clock::from_minutes(dep),
                Clock::from_minutes(arr),
                distance,
            );
            prop_assert_eq!(result.is_ok(), dep < arr);
            if let Ok(leg) = result {
                prop_assert!(leg.departure() < leg.arrival());
                prop_assert!(leg.average_speed() >= 0.0);
            }
        }
    }
}
