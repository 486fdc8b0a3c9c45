use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use xz::write::XzEncoder;

use crate::data::substation::OutputPoint;
use crate::errors::Result;

use super::reader::is_xz;

pub const GENERATOR: &str = "substation_nodes";

const XZ_LEVEL: u32 = 6;

/// Writes nodes as OSM XML. Consumed by [`OsmWriter::close`], so nothing can be written after
/// the document is finished.
pub struct OsmWriter<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> OsmWriter<W> {
    pub fn new(inner: W) -> Result<Self> {
        let mut writer = Writer::new_with_indent(inner, b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut osm = BytesStart::new("osm");
        osm.push_attribute(("version", "0.6"));
        osm.push_attribute(("generator", GENERATOR));
        writer.write_event(Event::Start(osm))?;

        Ok(OsmWriter { writer })
    }

    pub fn add_node(&mut self, point: &OutputPoint) -> Result<()> {
        let id = point.id.to_string();
        let version = point.version.to_string();
        // OSM stores coordinates with 7 decimal places.
        let lat = format!("{:.7}", point.lat);
        let lon = format!("{:.7}", point.lon);

        let mut node = BytesStart::new("node");
        node.push_attribute(("id", id.as_str()));
        node.push_attribute(("version", version.as_str()));
        node.push_attribute(("visible", if point.visible { "true" } else { "false" }));
        node.push_attribute(("lat", lat.as_str()));
        node.push_attribute(("lon", lon.as_str()));

        if point.tags.is_empty() {
            self.writer.write_event(Event::Empty(node))?;
            return Ok(());
        }

        self.writer.write_event(Event::Start(node))?;
        for (key, value) in &point.tags {
            let mut tag = BytesStart::new("tag");
            tag.push_attribute(("k", key.as_str()));
            tag.push_attribute(("v", value.as_str()));
            self.writer.write_event(Event::Empty(tag))?;
        }
        self.writer.write_event(Event::End(BytesEnd::new("node")))?;
        Ok(())
    }

    /// Finishes the document and hands back the flushed inner writer.
    pub fn close(mut self) -> Result<W> {
        self.writer.write_event(Event::End(BytesEnd::new("osm")))?;
        let mut inner = self.writer.into_inner();
        inner.flush()?;
        Ok(inner)
    }
}

/// Output file, xz compressed when its name ends in `.xz`.
pub enum OutputTarget {
    Plain(BufWriter<File>),
    Xz(XzEncoder<BufWriter<File>>),
}

impl OutputTarget {
    pub fn create(path: &Path) -> Result<Self> {
        let file_writer = BufWriter::new(File::create(path)?);
        if is_xz(path) {
            Ok(OutputTarget::Xz(XzEncoder::new(file_writer, XZ_LEVEL)))
        } else {
            Ok(OutputTarget::Plain(file_writer))
        }
    }

    pub fn finish(self) -> Result<()> {
        let mut file_writer = match self {
            OutputTarget::Plain(file_writer) => file_writer,
            OutputTarget::Xz(encoder) => encoder.finish()?,
        };
        file_writer.flush()?;
        Ok(())
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputTarget::Plain(w) => w.write(buf),
            OutputTarget::Xz(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputTarget::Plain(w) => w.flush(),
            OutputTarget::Xz(w) => w.flush(),
        }
    }
}
