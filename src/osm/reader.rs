use std::fs::File;
use std::io::{BufRead, BufReader};
use std::mem;
use std::path::Path;
use std::str;

use log::info;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use xz::bufread::XzDecoder;

use crate::data::osm::{Location, Member, MemberType, Node, OsmId, Relation, Tags, Way};
use crate::errors::Result;

use super::{Area, Handler, LocationIndex, WayIndex};

#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Keep way node lists and deliver area relations to [`Handler::area`].
    pub assemble_areas: bool,
    /// Values of the `type` tag that make a relation an area.
    pub area_relation_types: Vec<String>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            assemble_areas: true,
            area_relation_types: vec!["multipolygon".to_string(), "boundary".to_string()],
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReadStats {
    pub nodes: usize,
    pub ways: usize,
    pub relations: usize,
    pub areas: usize,
}

enum ParserState {
    Top,
    Node(Node),
    Way(Way),
    Relation(Relation),
}

/// Single pass, streaming reader for OSM XML.
pub struct OsmReader<R: BufRead> {
    reader: Reader<R>,
    options: ReaderOptions,
    locations: LocationIndex,
    ways: WayIndex,
    stats: ReadStats,
}

pub fn is_xz(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "xz")
}

/// Opens an .osm file, decompressing it on the fly when it ends in `.xz`.
pub fn open(path: &Path, options: ReaderOptions) -> Result<OsmReader<Box<dyn BufRead>>> {
    let file_reader = BufReader::new(File::open(path)?);
    let input: Box<dyn BufRead> = if is_xz(path) {
        Box::new(BufReader::new(XzDecoder::new(file_reader)))
    } else {
        Box::new(file_reader)
    };
    Ok(OsmReader::from_reader(input, options))
}

impl<R: BufRead> OsmReader<R> {
    pub fn from_reader(input: R, options: ReaderOptions) -> Self {
        let mut reader = Reader::from_reader(input);
        reader.trim_text(true);

        OsmReader {
            reader,
            options,
            locations: LocationIndex::default(),
            ways: WayIndex::default(),
            stats: ReadStats::default(),
        }
    }

    /// Streams every element into `handler`. Nodes are indexed before their callback so that
    /// ways later in the file can resolve them.
    pub fn apply<H: Handler>(mut self, handler: &mut H) -> Result<ReadStats> {
        let mut buf = Vec::new();
        let mut state = ParserState::Top;

        loop {
            match self.reader.read_event_into(&mut buf)? {
                Event::Eof => break,
                Event::Start(e) => Self::open_element(&e, &mut state)?,
                Event::Empty(e) => {
                    Self::open_element(&e, &mut state)?;
                    if is_element(e.name().as_ref()) {
                        self.close_element(&mut state, handler);
                    }
                },
                Event::End(e) => {
                    if is_element(e.name().as_ref()) {
                        self.close_element(&mut state, handler);
                    }
                },
                // Declarations, comments and whitespace carry nothing we need.
                _ => (),
            }
            buf.clear();
        }

        info!(
            nodes = self.stats.nodes,
            located_nodes = self.locations.len(),
            ways = self.stats.ways,
            relations = self.stats.relations,
            areas = self.stats.areas;
            "Finished reading map data"
        );
        Ok(self.stats)
    }

    fn open_element(e: &BytesStart, state: &mut ParserState) -> Result<()> {
        match e.name().as_ref() {
            b"node" => *state = ParserState::Node(parse_node(e)?),
            b"way" => {
                *state = ParserState::Way(Way {
                    id: required(e, b"id")?.parse()?,
                    node_refs: Vec::new(),
                    tags: Tags::new(),
                });
            },
            b"relation" => {
                *state = ParserState::Relation(Relation {
                    id: required(e, b"id")?.parse()?,
                    members: Vec::new(),
                    tags: Tags::new(),
                });
            },
            b"tag" => {
                let key = required(e, b"k")?;
                let value = required(e, b"v")?;
                match state {
                    ParserState::Node(node) => { node.tags.insert(key, value); },
                    ParserState::Way(way) => { way.tags.insert(key, value); },
                    ParserState::Relation(relation) => { relation.tags.insert(key, value); },
                    ParserState::Top => (),
                }
            },
            b"nd" => {
                if let ParserState::Way(way) = state {
                    way.node_refs.push(required(e, b"ref")?.parse()?);
                }
            },
            b"member" => {
                if let ParserState::Relation(relation) = state {
                    relation.members.push(parse_member(e)?);
                }
            },
            _ => (),
        }
        Ok(())
    }

    fn close_element<H: Handler>(&mut self, state: &mut ParserState, handler: &mut H) {
        match mem::replace(state, ParserState::Top) {
            ParserState::Node(node) => {
                self.stats.nodes += 1;
                if let Some(location) = node.location {
                    self.locations.insert(node.id, location);
                }
                handler.node(&node);
            },
            ParserState::Way(way) => {
                self.stats.ways += 1;
                handler.way(&way, &self.locations);
                if self.options.assemble_areas {
                    self.ways.insert(way.id, way.node_refs);
                }
            },
            ParserState::Relation(relation) => {
                self.stats.relations += 1;
                if self.options.assemble_areas && self.is_area(&relation) {
                    self.stats.areas += 1;
                    handler.area(&Area::new(&relation, &self.ways, &self.locations));
                }
            },
            ParserState::Top => (),
        }
    }

    fn is_area(&self, relation: &Relation) -> bool {
        relation.tags.get("type")
            .is_some_and(|kind| self.options.area_relation_types.iter().any(|t| t == kind))
    }
}

fn is_element(name: &[u8]) -> bool {
    matches!(name, b"node" | b"way" | b"relation")
}

fn attribute(e: &BytesStart, key: &[u8]) -> Result<Option<String>> {
    for attribute_res in e.attributes() {
        let attribute = attribute_res?;
        if attribute.key.as_ref() == key {
            return Ok(Some(attribute.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn required(e: &BytesStart, key: &[u8]) -> Result<String> {
    attribute(e, key)?.ok_or_else(|| {
        format!(
            "<{}> is missing the '{}' attribute",
            str::from_utf8(e.name().as_ref()).unwrap_or("?"),
            str::from_utf8(key).unwrap_or("?"),
        ).into()
    })
}

fn parse_node(e: &BytesStart) -> Result<Node> {
    let mut id: Option<OsmId> = None;
    let mut lat: Option<f64> = None;
    let mut lon: Option<f64> = None;

    for attribute_res in e.attributes() {
        let attribute = attribute_res?;
        match attribute.key.as_ref() {
            b"id" => id = Some(str::from_utf8(&attribute.value)?.parse()?),
            b"lat" => lat = Some(str::from_utf8(&attribute.value)?.parse()?),
            b"lon" => lon = Some(str::from_utf8(&attribute.value)?.parse()?),
            _ => (),
        }
    }

    let location = match (lon, lat) {
        (Some(lon), Some(lat)) => Some(Location { lon, lat }),
        _ => None,
    };
    Ok(Node {
        id: id.ok_or("<node> is missing the 'id' attribute")?,
        location,
        tags: Tags::new(),
    })
}

fn parse_member(e: &BytesStart) -> Result<Member> {
    let member_type = match required(e, b"type")?.as_str() {
        "node" => MemberType::Node,
        "way" => MemberType::Way,
        "relation" => MemberType::Relation,
        other => return Err(format!("Unknown member type '{}'", other).into()),
    };
    Ok(Member {
        member_type,
        reference: required(e, b"ref")?.parse()?,
        role: attribute(e, b"role")?.unwrap_or_default(),
    })
}
