//! Probe grid around the origin
//!
//! The grid is the bounding box of the four cardinal points at `radius`,
//! filled with a centred lattice at `cell_size` spacing.

use geo::{Coord, Destination, Distance, Haversine, Point, Rect};

use crate::core::options::LengthUnit;

/// Bearings of the four spokes: south, north, east, west
const SPOKE_BEARINGS: [f64; 4] = [180.0, 0.0, 90.0, -90.0];

/// Points at `radius` from the origin along the four cardinal bearings
pub fn cardinal_points(origin: Point<f64>, radius: f64, unit: LengthUnit) -> [Point<f64>; 4] {
    let distance_m = unit.to_meters(radius);
    SPOKE_BEARINGS.map(|bearing| Haversine.destination(origin, bearing, distance_m))
}

/// Bounding box of a set of points
fn bounding_box(points: &[Point<f64>]) -> Rect<f64> {
    let mut min = Coord { x: f64::INFINITY, y: f64::INFINITY };
    let mut max = Coord { x: f64::NEG_INFINITY, y: f64::NEG_INFINITY };
    for p in points {
        min.x = min.x.min(p.x());
        min.y = min.y.min(p.y());
        max.x = max.x.max(p.x());
        max.y = max.y.max(p.y());
    }
    Rect::new(min, max)
}

/// Fill a bounding box with a lattice of `cell_size` spacing
///
/// The lattice spacing is measured along the southern and western edges and
/// the leftover space is split evenly on both sides. Points are emitted
/// column by column, west to east, each column south to north.
pub fn point_grid(bbox: Rect<f64>, cell_size: f64, unit: LengthUnit) -> Vec<Coord<f64>> {
    let (west, south) = (bbox.min().x, bbox.min().y);
    let (east, north) = (bbox.max().x, bbox.max().y);
    let cell_m = unit.to_meters(cell_size);

    let south_west = Point::new(west, south);
    let width_m = Haversine.distance(south_west, Point::new(east, south));
    let height_m = Haversine.distance(south_west, Point::new(west, north));
    if width_m <= 0.0 || height_m <= 0.0 || cell_m <= 0.0 {
        return Vec::new();
    }

    let bbox_width = east - west;
    let bbox_height = north - south;
    let cell_width = cell_m / width_m * bbox_width;
    let cell_height = cell_m / height_m * bbox_height;

    let columns = (bbox_width / cell_width).floor();
    let rows = (bbox_height / cell_height).floor();
    let delta_x = (bbox_width - columns * cell_width) / 2.0;
    let delta_y = (bbox_height - rows * cell_height) / 2.0;

    let mut grid = Vec::with_capacity(((columns + 1.0) * (rows + 1.0)) as usize);
    let mut x = west + delta_x;
    while x <= east {
        let mut y = south + delta_y;
        while y <= north {
            grid.push(Coord { x, y });
            y += cell_height;
        }
        x += cell_width;
    }
    grid
}

/// Build the probe grid for an origin
pub fn build_grid(origin: Point<f64>, radius: f64, cell_size: f64, unit: LengthUnit) -> Vec<Coord<f64>> {
    let spokes = cardinal_points(origin, radius, unit);
    let bbox = bounding_box(&spokes);
    let grid = point_grid(bbox, cell_size, unit);
    log::debug!(
        "grid of {} points around ({}, {}) within {radius} {unit:?}",
        grid.len(),
        origin.x(),
        origin.y()
    );
    grid
}
