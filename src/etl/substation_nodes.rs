use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::data::substation::{Extraction, Reduction};
use crate::errors::Result;
use crate::osm::reader;
use crate::osm::writer::{OsmWriter, OutputTarget};
use crate::UserConfig;

use super::extract::Extractor;
use super::reduce::{reduce, Reducer, ReductionReport};
use super::Etl;

pub const ETL_NAME: &str = "substation_nodes";

/// Reads a map, keeps only substations and writes them back as nodes.
pub struct SubstationNodesEtl<'a> {
    config: &'a UserConfig,
    input_path: PathBuf,
    output_path: PathBuf,
}

impl SubstationNodesEtl<'_> {
    pub fn new(config: &UserConfig, input_path: PathBuf, output_path: PathBuf) -> SubstationNodesEtl<'_> {
        SubstationNodesEtl {
            config,
            input_path,
            output_path,
        }
    }
}

impl Etl for SubstationNodesEtl<'_> {
    type Input = Extraction;
    type Output = Reduction;
    type Report = ReductionReport;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn extract(&mut self) -> Result<Extraction> {
        println!("Extracting substations...");

        let osm_reader = reader::open(&self.input_path, self.config.reader_options())?;
        let mut extractor = Extractor::new(self.config.substation_filter());
        osm_reader.apply(&mut extractor)?;
        let (extraction, stats) = extractor.finish();

        info!(
            points = stats.points,
            way_polygons = stats.way_polygons,
            area_polygons = stats.area_polygons,
            unlocated_points = stats.unlocated_points,
            too_few_vertices = stats.too_few_vertices,
            failed = stats.failed,
            invalid = stats.invalid;
            "Classified substations"
        );
        if stats.negative_point_ids > 0 {
            warn!(
                count = stats.negative_point_ids;
                "Input substation nodes with negative ids may clash with generated centroid ids"
            );
        }

        println!("✔ Found existing substation nodes: {}", extraction.existing_points.len());
        println!("✔ Found substation polygons: {}", extraction.polygons.len());
        Ok(extraction)
    }

    fn transform(&mut self, input: Extraction) -> Result<Reduction> {
        reduce(input)
    }

    fn load(&mut self, output: Reduction) -> Result<ReductionReport> {
        let partial_path = partial_path(&self.output_path);
        let result = write_nodes(&partial_path, output).and_then(|report| {
            fs::rename(&partial_path, &self.output_path)?;
            Ok(report)
        });
        let report = match result {
            Ok(report) => report,
            Err(err) => {
                if partial_path.exists() {
                    fs::remove_file(&partial_path)?;
                }
                return Err(err);
            },
        };

        println!("✔ Output written to {}", self.output_path.display());
        println!("✔ Total substation nodes in output: {}", report.total());
        Ok(report)
    }
}

/// Sibling of `output_path` that is written first and renamed once complete. Keeps the
/// extension so `.xz` output is still compressed.
fn partial_path(output_path: &Path) -> PathBuf {
    let file_name = output_path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    output_path.with_file_name(format!(".partial-{}", file_name))
}

fn write_nodes(path: &Path, output: Reduction) -> Result<ReductionReport> {
    let target = OutputTarget::create(path)?;
    let mut reducer = Reducer::new(OsmWriter::new(target)?);
    reducer.write_all(output)?;
    let (target, report) = reducer.finish()?;
    target.finish()?;
    Ok(report)
}
