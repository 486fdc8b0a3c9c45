//! Second pass: replaces polygons by their centroids and writes every substation as a node.

use std::io::Write;

use crate::data::osm::OsmId;
use crate::data::substation::{CentroidRecord, Extraction, OutputPoint, PointRecord, PolygonRecord, Reduction};
use crate::errors::Result;
use crate::geometry::centroid;
use crate::osm::writer::OsmWriter;

/// Where output nodes go.
pub trait PointSink {
    type Closed;

    fn add_node(&mut self, point: &OutputPoint) -> Result<()>;
    fn close(self) -> Result<Self::Closed>;
}

impl<W: Write> PointSink for OsmWriter<W> {
    type Closed = W;

    fn add_node(&mut self, point: &OutputPoint) -> Result<()> {
        OsmWriter::add_node(self, point)
    }

    fn close(self) -> Result<W> {
        OsmWriter::close(self)
    }
}

#[cfg(test)]
impl PointSink for Vec<OutputPoint> {
    type Closed = Vec<OutputPoint>;

    fn add_node(&mut self, point: &OutputPoint) -> Result<()> {
        self.push(point.clone());
        Ok(())
    }

    fn close(self) -> Result<Self::Closed> {
        Ok(self)
    }
}

/// Hands out -1, -2, -3, ... for nodes that did not exist in the input.
#[derive(Debug)]
pub struct SyntheticIds {
    next: OsmId,
}

impl Default for SyntheticIds {
    fn default() -> Self {
        SyntheticIds { next: -1 }
    }
}

impl SyntheticIds {
    pub fn next_id(&mut self) -> OsmId {
        let id = self.next;
        self.next -= 1;
        id
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReductionReport {
    pub existing_points: usize,
    pub centroids: usize,
}

impl ReductionReport {
    pub fn total(&self) -> usize {
        self.existing_points + self.centroids
    }
}

pub fn centroid_record(record: PolygonRecord) -> Result<CentroidRecord> {
    let (lon, lat) = centroid(&record.geometry).ok_or("Substation polygon has no centroid")?;
    Ok(CentroidRecord { lon, lat, tags: record.tags })
}

/// Reduces every polygon of `extraction` to its centroid, keeping order.
pub fn reduce(extraction: Extraction) -> Result<Reduction> {
    let centroids = tqdm::tqdm(extraction.polygons.into_iter())
        .map(centroid_record)
        .collect::<Result<Vec<_>>>()?;
    Ok(Reduction {
        existing_points: extraction.existing_points,
        centroids,
    })
}

/// Assigns output ids and writes nodes to a sink, which is closed exactly once by [`Reducer::finish`].
pub struct Reducer<S: PointSink> {
    sink: S,
    synthetic_ids: SyntheticIds,
    report: ReductionReport,
}

impl<S: PointSink> Reducer<S> {
    pub fn new(sink: S) -> Self {
        Reducer {
            sink,
            synthetic_ids: SyntheticIds::default(),
            report: ReductionReport::default(),
        }
    }

    pub fn write_existing(&mut self, record: PointRecord) -> Result<()> {
        self.sink.add_node(&OutputPoint::from(record))?;
        self.report.existing_points += 1;
        Ok(())
    }

    pub fn write_centroid(&mut self, record: CentroidRecord) -> Result<()> {
        let id = self.synthetic_ids.next_id();
        self.sink.add_node(&OutputPoint::from_centroid(id, record))?;
        self.report.centroids += 1;
        Ok(())
    }

    /// Existing nodes first, then centroids, each in input order.
    pub fn write_all(&mut self, reduction: Reduction) -> Result<()> {
        for record in reduction.existing_points {
            self.write_existing(record)?;
        }
        for record in reduction.centroids {
            self.write_centroid(record)?;
        }
        Ok(())
    }

    pub fn finish(self) -> Result<(S::Closed, ReductionReport)> {
        Ok((self.sink.close()?, self.report))
    }
}
