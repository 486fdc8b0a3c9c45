//! Builds multi-polygons from area relations by gluing member ways into closed rings.

use geo::{Contains, InteriorPoint, LineString, MultiPolygon, Polygon};

use crate::data::osm::{MemberType, OsmId, Relation};
use crate::geometry::{closed_ring, GeometryError};

use super::{LocationIndex, WayIndex};

pub fn multipolygon(
    relation: &Relation,
    ways: &WayIndex,
    locations: &LocationIndex,
) -> Result<MultiPolygon<f64>, GeometryError> {
    let mut outer_parts: Vec<Vec<OsmId>> = Vec::new();
    let mut inner_parts: Vec<Vec<OsmId>> = Vec::new();

    for member in &relation.members {
        if member.member_type != MemberType::Way {
            continue;
        }
        let parts = match member.role.as_str() {
            "" | "outer" => &mut outer_parts,
            "inner" => &mut inner_parts,
            _ => continue,
        };
        let node_refs = ways.get(member.reference)
            .ok_or(GeometryError::MissingWay(member.reference))?;
        parts.push(node_refs.to_vec());
    }

    if outer_parts.is_empty() {
        return Err(GeometryError::NoOuterRing);
    }

    let mut polygons: Vec<Polygon<f64>> = join_rings(outer_parts)?
        .iter()
        .map(|ring| ring_geometry(ring, locations).map(|exterior| Polygon::new(exterior, vec![])))
        .collect::<Result<_, _>>()?;

    for ring in join_rings(inner_parts)? {
        let inner = ring_geometry(&ring, locations)?;
        let probe = Polygon::new(inner.clone(), vec![])
            .interior_point()
            .ok_or(GeometryError::OrphanInnerRing)?;
        let outer = polygons.iter_mut()
            .find(|polygon| Polygon::new(polygon.exterior().clone(), vec![]).contains(&probe))
            .ok_or(GeometryError::OrphanInnerRing)?;
        outer.interiors_push(inner);
    }

    Ok(MultiPolygon::new(polygons))
}

/// Joins way segments that share end nodes until every segment belongs to a closed ring.
fn join_rings(parts: Vec<Vec<OsmId>>) -> Result<Vec<Vec<OsmId>>, GeometryError> {
    let mut rings = Vec::new();
    let mut open = Vec::new();
    for part in parts {
        if part.len() < 2 {
            return Err(GeometryError::DegenerateRing(part.len()));
        }
        if part.first() == part.last() {
            rings.push(part);
        } else {
            open.push(part);
        }
    }

    while let Some(mut current) = open.pop() {
        while current.first() != current.last() {
            let end = current[current.len() - 1];
            let idx = open.iter()
                .position(|part| part.first() == Some(&end) || part.last() == Some(&end))
                .ok_or(GeometryError::UnclosedRing)?;
            let mut next = open.remove(idx);
            if next[0] != end {
                next.reverse();
            }
            current.extend_from_slice(&next[1..]);
        }
        rings.push(current);
    }

    Ok(rings)
}

fn ring_geometry(ring: &[OsmId], locations: &LocationIndex) -> Result<LineString<f64>, GeometryError> {
    closed_ring(locations.resolve(ring)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::osm::{Location, Member, Tags};
    use crate::geometry::centroid;

    fn member(member_type: MemberType, reference: OsmId, role: &str) -> Member {
        Member { member_type, reference, role: role.to_string() }
    }

    fn relation(members: Vec<Member>) -> Relation {
        Relation { id: 100, members, tags: Tags::new() }
    }

    /// Outer square 0..4 made of nodes 1-4, hole 1..2 made of nodes 11-14.
    fn fixture() -> (WayIndex, LocationIndex) {
        let mut locations = LocationIndex::default();
        for (id, lon, lat) in [
            (1, 0.0, 0.0), (2, 4.0, 0.0), (3, 4.0, 4.0), (4, 0.0, 4.0),
            (11, 1.0, 1.0), (12, 2.0, 1.0), (13, 2.0, 2.0), (14, 1.0, 2.0),
            (21, 10.0, 10.0), (22, 11.0, 10.0), (23, 11.0, 11.0),
        ] {
            locations.insert(id, Location { lon, lat });
        }
        let mut ways = WayIndex::default();
        ways.insert(10, vec![1, 2, 3]);
        ways.insert(20, vec![1, 4, 3]);
        ways.insert(30, vec![11, 12, 13, 14, 11]);
        ways.insert(40, vec![21, 22, 23, 21]);
        ways.insert(50, vec![1, 2]);
        (ways, locations)
    }

    #[test]
    fn glues_split_outer_ring() {
        let (ways, locations) = fixture();
        let rel = relation(vec![
            member(MemberType::Way, 10, "outer"),
            member(MemberType::Way, 20, "outer"),
        ]);
        let geometry = multipolygon(&rel, &ways, &locations).unwrap();
        assert_eq!(geometry.0.len(), 1);
        assert_eq!(geometry.0[0].exterior().0.len(), 5);
        let (lon, lat) = centroid(&geometry).unwrap();
        assert!((lon - 2.0).abs() < 1e-9 && (lat - 2.0).abs() < 1e-9);
    }

    #[test]
    fn inner_ring_becomes_hole() {
        let (ways, locations) = fixture();
        let rel = relation(vec![
            member(MemberType::Way, 10, "outer"),
            member(MemberType::Way, 20, ""),
            member(MemberType::Way, 30, "inner"),
            member(MemberType::Node, 1, "label"),
        ]);
        let geometry = multipolygon(&rel, &ways, &locations).unwrap();
        assert_eq!(geometry.0.len(), 1);
        assert_eq!(geometry.0[0].interiors().len(), 1);
    }

    #[test]
    fn separate_outers_make_separate_polygons() {
        let (ways, locations) = fixture();
        let rel = relation(vec![
            member(MemberType::Way, 40, "outer"),
            member(MemberType::Way, 30, "outer"),
        ]);
        assert_eq!(multipolygon(&rel, &ways, &locations).unwrap().0.len(), 2);
    }

    #[test]
    fn missing_member_way() {
        let (ways, locations) = fixture();
        let rel = relation(vec![member(MemberType::Way, 999, "outer")]);
        assert_eq!(multipolygon(&rel, &ways, &locations), Err(GeometryError::MissingWay(999)));
    }

    #[test]
    fn ring_that_cannot_be_closed() {
        let (ways, locations) = fixture();
        let rel = relation(vec![member(MemberType::Way, 10, "outer")]);
        assert_eq!(multipolygon(&rel, &ways, &locations), Err(GeometryError::UnclosedRing));
    }

    #[test]
    fn back_and_forth_ring_is_degenerate() {
        let (mut ways, locations) = fixture();
        ways.insert(60, vec![2, 1]);
        let rel = relation(vec![
            member(MemberType::Way, 50, "outer"),
            member(MemberType::Way, 60, "outer"),
        ]);
        assert_eq!(multipolygon(&rel, &ways, &locations), Err(GeometryError::DegenerateRing(3)));
    }

    #[test]
    fn inner_outside_every_outer() {
        let (ways, locations) = fixture();
        let rel = relation(vec![
            member(MemberType::Way, 30, "outer"),
            member(MemberType::Way, 40, "inner"),
        ]);
        assert_eq!(multipolygon(&rel, &ways, &locations), Err(GeometryError::OrphanInnerRing));
    }

    #[test]
    fn relation_without_outer() {
        let (ways, locations) = fixture();
        let rel = relation(vec![member(MemberType::Way, 30, "inner")]);
        assert_eq!(multipolygon(&rel, &ways, &locations), Err(GeometryError::NoOuterRing));
    }

    #[test]
    fn member_node_without_location() {
        let (mut ways, locations) = fixture();
        ways.insert(70, vec![1, 2, 77, 1]);
        let rel = relation(vec![member(MemberType::Way, 70, "outer")]);
        assert_eq!(multipolygon(&rel, &ways, &locations), Err(GeometryError::MissingLocation(77)));
    }
}
