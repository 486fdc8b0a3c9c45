//! Substation records produced by extraction and consumed by the write pass.

use geo::MultiPolygon;

use super::osm::{OsmId, Tags};

/// A substation mapped as a single node.
#[derive(Debug, Clone, PartialEq)]
pub struct PointRecord {
    pub id: OsmId,
    pub lon: f64,
    pub lat: f64,
    pub tags: Tags,
}

/// A substation mapped as an area. The geometry has passed the validity check.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonRecord {
    pub geometry: MultiPolygon<f64>,
    pub tags: Tags,
}

/// The centroid of a [`PolygonRecord`], waiting for its synthetic id.
#[derive(Debug, Clone, PartialEq)]
pub struct CentroidRecord {
    pub lon: f64,
    pub lat: f64,
    pub tags: Tags,
}

/// A node as written to the output file.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPoint {
    pub id: OsmId,
    pub lon: f64,
    pub lat: f64,
    pub tags: Tags,
    pub version: u32,
    pub visible: bool,
}

impl From<PointRecord> for OutputPoint {
    fn from(value: PointRecord) -> Self {
        OutputPoint {
            id: value.id,
            lon: value.lon,
            lat: value.lat,
            tags: value.tags,
            version: 1,
            visible: true,
        }
    }
}

impl OutputPoint {
    pub fn from_centroid(id: OsmId, centroid: CentroidRecord) -> Self {
        OutputPoint {
            id,
            lon: centroid.lon,
            lat: centroid.lat,
            tags: centroid.tags,
            version: 1,
            visible: true,
        }
    }
}

/// Result of the extraction pass, in input order.
#[derive(Debug, Default, Clone)]
pub struct Extraction {
    pub existing_points: Vec<PointRecord>,
    pub polygons: Vec<PolygonRecord>,
}

/// Result of reducing every polygon to its centroid, in input order.
#[derive(Debug, Default, Clone)]
pub struct Reduction {
    pub existing_points: Vec<PointRecord>,
    pub centroids: Vec<CentroidRecord>,
}
