pub mod osm;
pub mod substation;
