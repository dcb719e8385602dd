//! Concave hull per reachability band

use geo::algorithm::concave_hull::ConcaveHull;
use geo::concave_hull::ConcaveHullOptions;
use geo::{Area, ConvexHull, MultiPoint, MultiPolygon, Point};

use crate::core::assemble::IsochroneFeature;
use crate::core::classify::Band;
use crate::core::error::{Error, Result};

/// Hull settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HullOptions {
    /// Larger values give a more convex hull
    pub concavity: f64,
    /// Edges shorter than this are not refined further
    pub length_threshold: f64,
}

impl Default for HullOptions {
    fn default() -> Self {
        Self {
            concavity: 2.0,
            length_threshold: 0.0,
        }
    }
}

/// One feature per band with at least three points, in band order
///
/// A band whose hull has no area is a geometry error.
pub fn build_hulls(bands: &[Band], options: HullOptions) -> Result<Vec<IsochroneFeature>> {
    let mut features = Vec::with_capacity(bands.len());
    for band in bands {
        if band.points.len() < 3 {
            log::debug!(
                "skipping {} min band with {} point(s)",
                band.interval,
                band.points.len()
            );
            continue;
        }

        let points: MultiPoint<f64> = band.points.iter().copied().map(Point).collect();
        let degenerate = || {
            Error::Geometry(format!(
                "hull of the {} min band has no area ({} points)",
                band.interval,
                band.points.len()
            ))
        };
        if points.convex_hull().unsigned_area() <= 0.0 {
            return Err(degenerate());
        }

        let hull = points.concave_hull_with_options(
            ConcaveHullOptions::default()
                .concavity(options.concavity)
                .length_threshold(options.length_threshold),
        );
        if hull.unsigned_area() <= 0.0 {
            return Err(degenerate());
        }

        features.push(IsochroneFeature::new(band.interval, MultiPolygon(vec![hull])));
    }
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Contains, Coord};

    fn ring_band(interval: f64, radius: f64, n: usize) -> Band {
        let points = (0..n)
            .map(|i| {
                let a = i as f64 / n as f64 * std::f64::consts::TAU;
                Coord { x: radius * a.cos(), y: radius * a.sin() }
            })
            .chain(std::iter::once(Coord { x: 0.0, y: 0.0 }))
            .collect();
        Band { interval, points }
    }

    #[test]
    fn test_small_bands_skipped() {
        let bands = vec![
            Band { interval: 1.0, points: vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 0.0 }] },
            ring_band(3.0, 1.0, 12),
        ];
        let features = build_hulls(&bands, HullOptions::default()).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].time(), Some(3.0));
    }

    #[test]
    fn test_hull_covers_points() {
        let band = ring_band(5.0, 2.0, 24);
        let features = build_hulls(std::slice::from_ref(&band), HullOptions::default()).unwrap();
        let hull = &features[0].geometry;
        assert!(hull.unsigned_area() > 0.0);
        // inner point is strictly inside
        assert!(hull.contains(&Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_order_follows_bands() {
        let bands = vec![ring_band(1.0, 1.0, 8), ring_band(3.0, 2.0, 8), ring_band(5.0, 3.0, 8)];
        let features = build_hulls(&bands, HullOptions::default()).unwrap();
        let times: Vec<_> = features.iter().filter_map(IsochroneFeature::time).collect();
        assert_eq!(times, vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_collinear_band_is_error() {
        let band = Band {
            interval: 1.0,
            points: (0..5).map(|i| Coord { x: i as f64, y: 0.0 }).collect(),
        };
        let err = build_hulls(&[band], HullOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Geometry(_)));
    }
}
