//! First pass: sorts substation elements into points and validated polygons.

use crate::data::osm::{has_kv_pair, Node, Tags, Way};
use crate::data::substation::{Extraction, PointRecord, PolygonRecord};
use crate::geometry::{assembled_outcome, ring_outcome, PolygonOutcome};
use crate::osm::{Area, Handler, LocationIndex};

/// The tag that marks an element as a substation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstationFilter {
    key: String,
    value: String,
}

impl SubstationFilter {
    pub fn new(key: &str, value: &str) -> Self {
        SubstationFilter { key: key.to_string(), value: value.to_string() }
    }

    pub fn matches(&self, tags: &Tags) -> bool {
        has_kv_pair(tags, &self.key, &self.value)
    }
}

impl Default for SubstationFilter {
    fn default() -> Self {
        SubstationFilter::new("power", "substation")
    }
}

/// Tally of what happened to matching elements.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionStats {
    pub points: usize,
    pub way_polygons: usize,
    pub area_polygons: usize,
    pub unlocated_points: usize,
    pub too_few_vertices: usize,
    pub failed: usize,
    pub invalid: usize,
    /// Original ids in the range used for synthetic centroid ids.
    pub negative_point_ids: usize,
}

pub struct Extractor {
    filter: SubstationFilter,
    extraction: Extraction,
    stats: ExtractionStats,
}

impl Extractor {
    pub fn new(filter: SubstationFilter) -> Self {
        Extractor {
            filter,
            extraction: Extraction::default(),
            stats: ExtractionStats::default(),
        }
    }

    pub fn finish(self) -> (Extraction, ExtractionStats) {
        (self.extraction, self.stats)
    }

    /// Keeps a valid polygon; counts and drops everything else.
    fn keep(&mut self, outcome: PolygonOutcome, tags: &Tags) -> bool {
        match outcome {
            PolygonOutcome::Valid(geometry) => {
                self.extraction.polygons.push(PolygonRecord { geometry, tags: tags.clone() });
                true
            },
            PolygonOutcome::TooFewVertices(_) => {
                self.stats.too_few_vertices += 1;
                false
            },
            PolygonOutcome::Failed(_) => {
                self.stats.failed += 1;
                false
            },
            PolygonOutcome::Invalid => {
                self.stats.invalid += 1;
                false
            },
        }
    }
}

impl Handler for Extractor {
    fn node(&mut self, node: &Node) {
        if !self.filter.matches(&node.tags) {
            return;
        }
        let Some(location) = node.location else {
            self.stats.unlocated_points += 1;
            return;
        };
        if node.id < 0 {
            self.stats.negative_point_ids += 1;
        }
        self.stats.points += 1;
        self.extraction.existing_points.push(PointRecord {
            id: node.id,
            lon: location.lon,
            lat: location.lat,
            tags: node.tags.clone(),
        });
    }

    fn way(&mut self, way: &Way, locations: &LocationIndex) {
        if !self.filter.matches(&way.tags) {
            return;
        }
        let outcome = ring_outcome(locations.resolve(&way.node_refs));
        if self.keep(outcome, &way.tags) {
            self.stats.way_polygons += 1;
        }
    }

    fn area(&mut self, area: &Area) {
        if !self.filter.matches(area.tags()) {
            return;
        }
        let outcome = assembled_outcome(area.assemble());
        if self.keep(outcome, area.tags()) {
            self.stats.area_polygons += 1;
        }
    }
}
