//! Raw map elements as they appear in an .osm file. Only the parts needed to locate and
//! describe features are kept; metadata such as user, changeset and timestamp is dropped.

use std::collections::BTreeMap;

pub type OsmId = i64;

/// Key/value tags of an element. Keys are unique; iteration is in key order so output is
/// deterministic.
pub type Tags = BTreeMap<String, String>;

pub fn has_kv_pair(tags: &Tags, key: &str, value: &str) -> bool {
    tags.get(key).is_some_and(|tag_value| tag_value == value)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: OsmId,
    /// Deleted or redacted nodes come without coordinates.
    pub location: Option<Location>,
    pub tags: Tags,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub id: OsmId,
    pub node_refs: Vec<OsmId>,
    pub tags: Tags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberType {
    Node,
    Way,
    Relation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub member_type: MemberType,
    pub reference: OsmId,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub id: OsmId,
    pub members: Vec<Member>,
    pub tags: Tags,
}
