pub mod assemble;
pub mod reader;
pub mod writer;

use std::collections::HashMap;

use geo::{Coord, MultiPolygon};

use crate::data::osm::{Location, Node, OsmId, Relation, Tags, Way};
use crate::geometry::GeometryError;

/// Receives elements from [`reader::OsmReader`] in file order.
pub trait Handler {
    fn node(&mut self, _node: &Node) {}
    fn way(&mut self, _way: &Way, _locations: &LocationIndex) {}
    fn area(&mut self, _area: &Area) {}
}

/// Locations of every node seen so far.
#[derive(Debug, Default)]
pub struct LocationIndex {
    locations: HashMap<OsmId, Location>,
}

impl LocationIndex {
    pub fn insert(&mut self, id: OsmId, location: Location) {
        self.locations.insert(id, location);
    }

    pub fn get(&self, id: OsmId) -> Option<Location> {
        self.locations.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Coordinates for `node_refs`, in order. Fails on the first node without a location.
    pub fn resolve(&self, node_refs: &[OsmId]) -> Result<Vec<Coord<f64>>, GeometryError> {
        node_refs.iter()
            .map(|&id| {
                self.get(id)
                    .map(|location| Coord { x: location.lon, y: location.lat })
                    .ok_or(GeometryError::MissingLocation(id))
            })
            .collect()
    }
}

/// Node references of every way seen so far, kept for assembling relation areas.
#[derive(Debug, Default)]
pub struct WayIndex {
    ways: HashMap<OsmId, Vec<OsmId>>,
}

impl WayIndex {
    pub fn insert(&mut self, id: OsmId, node_refs: Vec<OsmId>) {
        self.ways.insert(id, node_refs);
    }

    pub fn get(&self, id: OsmId) -> Option<&[OsmId]> {
        self.ways.get(&id).map(|refs| refs.as_slice())
    }
}

/// An area relation together with what is needed to build its geometry on demand.
pub struct Area<'a> {
    pub relation: &'a Relation,
    ways: &'a WayIndex,
    locations: &'a LocationIndex,
}

impl<'a> Area<'a> {
    pub fn new(relation: &'a Relation, ways: &'a WayIndex, locations: &'a LocationIndex) -> Self {
        Area { relation, ways, locations }
    }

    pub fn tags(&self) -> &Tags {
        &self.relation.tags
    }

    pub fn assemble(&self) -> Result<MultiPolygon<f64>, GeometryError> {
        assemble::multipolygon(self.relation, self.ways, self.locations)
    }
}
