//! Reachability bands from a travel-time matrix

use geo::Coord;

use crate::core::matrix::RoutingMatrix;

/// Destinations reachable within `interval` minutes
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub interval: f64,
    pub points: Vec<Coord<f64>>,
}

/// One cumulative band per interval, in the order given
///
/// A destination belongs to a band when its duration is known and at most
/// `interval * 60` seconds, so each band contains every smaller one.
pub fn group_by_interval(matrix: &RoutingMatrix, intervals: &[f64]) -> Vec<Band> {
    let times = matrix.travel_times();
    intervals
        .iter()
        .map(|&interval| {
            let limit = interval * 60.0;
            let points: Vec<Coord<f64>> = matrix
                .destinations
                .iter()
                .zip(times)
                .filter(|(_, duration)| matches!(duration, Some(d) if *d <= limit))
                .map(|(destination, _)| destination.coord())
                .collect();
            log::debug!("{} destinations within {interval} min", points.len());
            Band { interval, points }
        })
        .collect()
}
