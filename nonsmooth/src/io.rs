//! Loading and saving solver configurations in RON.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use thiserror::Error;

use crate::SolverOptions;

#[derive(Error, Debug)]
pub enum LoadConfigError {
    #[error("IO")]
    IO(#[from] std::io::Error),
    #[error("Parse")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Serialize")]
    Serialize(#[from] ron::Error),
}

fn pretty_config() -> ron::ser::PrettyConfig {
    ron::ser::PrettyConfig::new()
        .depth_limit(8)
        .struct_names(true)
}

/// Loads a configuration tree as written, without filling defaults or validating it.
pub fn load_options(path: impl AsRef<Path>) -> std::result::Result<SolverOptions, LoadConfigError> {
    let f = File::open(path.as_ref())?;
    Ok(ron::de::from_reader(f)?)
}

/// Loads a configuration tree, fills in defaults and checks its shape.
pub fn load_validated_options(path: impl AsRef<Path>) -> Result<SolverOptions, crate::Error> {
    let mut options = load_options(path)?;
    options.fill_defaults();
    options.validate()?;
    Ok(options)
}

pub fn save_options(
    path: impl AsRef<Path>,
    options: &SolverOptions,
) -> std::result::Result<(), LoadConfigError> {
    let f = BufWriter::new(File::create(path.as_ref())?);
    ron::ser::to_writer_pretty(f, options, pretty_config())?;
    Ok(())
}

pub fn options_from_str(s: &str) -> std::result::Result<SolverOptions, LoadConfigError> {
    Ok(ron::from_str(s)?)
}

pub fn options_to_string(options: &SolverOptions) -> std::result::Result<String, LoadConfigError> {
    Ok(ron::ser::to_string_pretty(options, pretty_config())?)
}
