mod etl;
mod data;
mod errors;
mod geometry;
mod osm;

use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process;

use serde::Deserialize;
use structured_logger::json::new_writer;
use structured_logger::Builder;

use crate::etl::extract::SubstationFilter;
use crate::etl::substation_nodes::SubstationNodesEtl;
use crate::etl::Etl;
use crate::errors::Result;
use crate::osm::reader::ReaderOptions;

const USAGE: &str = "Usage: substation_nodes input.osm output.osm";

/// Path of an optional JSON file with [`UserConfig`] overrides.
const CONFIG_ENV_VAR: &str = "SUBSTATION_NODES_CONFIG";

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct UserConfig {
    pub log_level: String,
    pub tag_key: String,
    pub tag_value: String,
    pub assemble_areas: bool,
    pub area_relation_types: Vec<String>,
}

impl Default for UserConfig {
    fn default() -> Self {
        let reader_defaults = ReaderOptions::default();
        UserConfig {
            log_level: "info".to_string(),
            tag_key: "power".to_string(),
            tag_value: "substation".to_string(),
            assemble_areas: reader_defaults.assemble_areas,
            area_relation_types: reader_defaults.area_relation_types,
        }
    }
}

impl UserConfig {
    pub fn reader_options(&self) -> ReaderOptions {
        ReaderOptions {
            assemble_areas: self.assemble_areas,
            area_relation_types: self.area_relation_types.clone(),
        }
    }

    pub fn substation_filter(&self) -> SubstationFilter {
        SubstationFilter::new(&self.tag_key, &self.tag_value)
    }
}

fn load_user_config() -> Result<UserConfig> {
    let Some(path) = env::var_os(CONFIG_ENV_VAR) else {
        return Ok(UserConfig::default());
    };
    let path = PathBuf::from(path);
    let file = File::open(&path)
        .map_err(|err| format!("Could not open config file {}: {}", path.display(), err))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// `INPUT [OUTPUT]`; anything else is a usage error.
fn parse_args(args: &[String]) -> Option<(PathBuf, PathBuf)> {
    match args {
        [input] => Some((PathBuf::from(input), default_output_path(Path::new(input)))),
        [input, output] => Some((PathBuf::from(input), PathBuf::from(output))),
        _ => None,
    }
}

/// `dir/map.osm.xz` becomes `dir/map.substations.osm`.
fn default_output_path(input: &Path) -> PathBuf {
    let file_name = input.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file_name.strip_suffix(".xz").unwrap_or(&file_name);
    let stem = stem.strip_suffix(".osm").unwrap_or(stem);
    input.with_file_name(format!("{}.substations.osm", stem))
}

fn setup_logging(level: &str) {
    Builder::with_level(level)
        .with_target_writer("*", new_writer(io::stderr()))
        .init();
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let Some((input_path, output_path)) = parse_args(&args) else {
        println!("{}", USAGE);
        process::exit(1);
    };

    let user_config = load_user_config()?;
    setup_logging(&user_config.log_level);

    let mut etl = SubstationNodesEtl::new(&user_config, input_path, output_path);
    etl.process()?;

    Ok(())
}
