//! Polygon construction, validity and centroids for substation areas.
//!
//! Per-element problems are reported as a [`PolygonOutcome`] rather than an [`crate::errors::Error`]:
//! a bad ring only ever drops the element it belongs to.

use std::fmt;

use geo::{Area, Centroid, Coord, LineString, MultiPolygon, Polygon, Validation};

use crate::data::osm::OsmId;

/// Fewest resolved coordinates a way needs before a polygon is attempted.
pub const MIN_RING_VERTICES: usize = 3;

/// A closed ring has at least three distinct positions plus the repeated first one.
const MIN_CLOSED_RING_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    MissingLocation(OsmId),
    MissingWay(OsmId),
    NonFiniteCoordinate,
    DegenerateRing(usize),
    UnclosedRing,
    NoOuterRing,
    OrphanInnerRing,
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::MissingLocation(id) => write!(f, "node {} has no location", id),
            GeometryError::MissingWay(id) => write!(f, "member way {} not found", id),
            GeometryError::NonFiniteCoordinate => write!(f, "ring contains a non-finite coordinate"),
            GeometryError::DegenerateRing(len) => write!(f, "ring has only {} positions", len),
            GeometryError::UnclosedRing => write!(f, "member ways do not form a closed ring"),
            GeometryError::NoOuterRing => write!(f, "area has no outer ring"),
            GeometryError::OrphanInnerRing => write!(f, "inner ring lies outside every outer ring"),
        }
    }
}

/// What became of one candidate area.
#[derive(Debug, Clone, PartialEq)]
pub enum PolygonOutcome {
    Valid(MultiPolygon<f64>),
    TooFewVertices(usize),
    Failed(GeometryError),
    Invalid,
}

/// Builds a polygon from a ring of `(lon, lat)` coordinates, closing it if needed.
pub fn polygon_from_ring(coords: Vec<Coord<f64>>) -> Result<Polygon<f64>, GeometryError> {
    let ring = closed_ring(coords)?;
    Ok(Polygon::new(ring, vec![]))
}

pub(crate) fn closed_ring(coords: Vec<Coord<f64>>) -> Result<LineString<f64>, GeometryError> {
    if coords.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(GeometryError::NonFiniteCoordinate);
    }
    let mut ring = LineString::new(coords);
    ring.close();
    if ring.0.len() < MIN_CLOSED_RING_LEN {
        return Err(GeometryError::DegenerateRing(ring.0.len()));
    }
    Ok(ring)
}

/// Classifies the resolved coordinates of a way.
pub fn ring_outcome(coords: Result<Vec<Coord<f64>>, GeometryError>) -> PolygonOutcome {
    let coords = match coords {
        Ok(coords) => coords,
        Err(err) => return PolygonOutcome::Failed(err),
    };
    if coords.len() < MIN_RING_VERTICES {
        return PolygonOutcome::TooFewVertices(coords.len());
    }
    match polygon_from_ring(coords) {
        Ok(polygon) => validated(MultiPolygon::new(vec![polygon])),
        Err(err) => PolygonOutcome::Failed(err),
    }
}

/// Classifies the result of assembling a relation area.
pub fn assembled_outcome(assembled: Result<MultiPolygon<f64>, GeometryError>) -> PolygonOutcome {
    match assembled {
        Ok(geometry) => validated(geometry),
        Err(err) => PolygonOutcome::Failed(err),
    }
}

/// Valid and every part encloses some area. Rings whose points all lie on one line pass
/// `is_valid` but have nothing to take a centroid of.
fn validated(geometry: MultiPolygon<f64>) -> PolygonOutcome {
    let has_area = geometry.0.iter().all(|polygon| polygon.unsigned_area() > 0.0);
    if has_area && geometry.is_valid() {
        PolygonOutcome::Valid(geometry)
    } else {
        PolygonOutcome::Invalid
    }
}

/// Area weighted centroid as `(lon, lat)`, holes excluded. `None` only for empty geometry.
pub fn centroid(geometry: &MultiPolygon<f64>) -> Option<(f64, f64)> {
    geometry.centroid().map(|point| (point.x(), point.y()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    fn ring(points: &[(f64, f64)]) -> Vec<Coord<f64>> {
        points.iter().map(|&(x, y)| coord! { x: x, y: y }).collect()
    }

    fn assert_close(actual: (f64, f64), expected: (f64, f64)) {
        assert!((actual.0 - expected.0).abs() < 1e-9, "{:?} != {:?}", actual, expected);
        assert!((actual.1 - expected.1).abs() < 1e-9, "{:?} != {:?}", actual, expected);
    }

    #[test]
    fn unit_square_is_valid_with_centre_centroid() {
        let outcome = ring_outcome(Ok(ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)])));
        let geometry = match outcome {
            PolygonOutcome::Valid(geometry) => geometry,
            other => panic!("expected a valid polygon, got {:?}", other),
        };
        assert_close(centroid(&geometry).unwrap(), (0.5, 0.5));
    }

    #[test]
    fn open_ring_is_closed() {
        let polygon = polygon_from_ring(ring(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)])).unwrap();
        assert_eq!(polygon.exterior().0.len(), 5);
        assert!(polygon.exterior().is_closed());
    }

    #[test]
    fn fewer_than_three_coordinates() {
        assert_eq!(
            ring_outcome(Ok(ring(&[(0.0, 0.0), (1.0, 1.0)]))),
            PolygonOutcome::TooFewVertices(2)
        );
        assert_eq!(ring_outcome(Ok(vec![])), PolygonOutcome::TooFewVertices(0));
    }

    #[test]
    fn back_and_forth_ring_fails_construction() {
        // Three references but only two distinct positions.
        assert_eq!(
            ring_outcome(Ok(ring(&[(0.0, 0.0), (1.0, 1.0), (0.0, 0.0)]))),
            PolygonOutcome::Failed(GeometryError::DegenerateRing(3))
        );
    }

    #[test]
    fn non_finite_coordinates_fail_construction() {
        assert_eq!(
            ring_outcome(Ok(ring(&[(0.0, 0.0), (f64::NAN, 0.0), (1.0, 1.0)]))),
            PolygonOutcome::Failed(GeometryError::NonFiniteCoordinate)
        );
    }

    #[test]
    fn resolution_error_is_a_failure() {
        assert_eq!(
            ring_outcome(Err(GeometryError::MissingLocation(7))),
            PolygonOutcome::Failed(GeometryError::MissingLocation(7))
        );
    }

    #[test]
    fn bow_tie_is_invalid() {
        assert_eq!(
            ring_outcome(Ok(ring(&[(0.0, 0.0), (1.0, 1.0), (1.0, 0.0), (0.0, 1.0)]))),
            PolygonOutcome::Invalid
        );
    }

    #[test]
    fn collinear_ring_is_invalid() {
        assert_eq!(
            ring_outcome(Ok(ring(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (0.0, 0.0)]))),
            PolygonOutcome::Invalid
        );
    }

    #[test]
    fn flat_part_makes_area_invalid() {
        let square = polygon_from_ring(ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)])).unwrap();
        let flat = polygon_from_ring(ring(&[(5.0, 5.0), (6.0, 6.0), (7.0, 7.0)])).unwrap();
        assert_eq!(
            assembled_outcome(Ok(MultiPolygon::new(vec![square, flat]))),
            PolygonOutcome::Invalid
        );
    }

    #[test]
    fn assembly_error_is_a_failure() {
        assert_eq!(
            assembled_outcome(Err(GeometryError::UnclosedRing)),
            PolygonOutcome::Failed(GeometryError::UnclosedRing)
        );
    }

    #[test]
    fn centroid_accounts_for_holes() {
        let outer = closed_ring(ring(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)])).unwrap();
        let hole = closed_ring(ring(&[(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 2.0)])).unwrap();
        let geometry = MultiPolygon::new(vec![Polygon::new(outer, vec![hole])]);
        assert!(matches!(assembled_outcome(Ok(geometry.clone())), PolygonOutcome::Valid(_)));

        let expected = (16.0 * 2.0 - 1.5) / 15.0;
        assert_close(centroid(&geometry).unwrap(), (expected, expected));
    }

    #[test]
    fn empty_geometry_has_no_centroid() {
        assert_eq!(centroid(&MultiPolygon::new(vec![])), None);
    }
}
