use crate::config::options::TranslationOptions;
use serde_valid::Validate;
use serde_valid::validation::{Error, Errors};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument, warn};

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Failed to open options file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse options: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid options: {0}")]
    InvalidOptions(#[from] Errors<Error>),
}

#[instrument(skip(reader))]
pub fn read_options(reader: impl Read) -> Result<TranslationOptions, ReadError> {
    let options = serde_yaml::from_reader::<_, TranslationOptions>(reader)
        .inspect_err(|e| warn!("Failed to parse translation options: {}", e))?;

    options
        .validate()
        .inspect(|_| debug!("Read translation options are valid"))
        .inspect_err(|e| warn!("Invalid translation options: {}", e))
        .map(|()| options)
        .map_err(ReadError::InvalidOptions)
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to write options: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("Invalid options: {0}")]
    InvalidOptions(#[from] Errors<Error>),
}

#[instrument(skip(options, writer))]
pub fn write_options(options: &TranslationOptions, writer: impl Write) -> Result<(), WriteError> {
    options.validate().map_err(WriteError::InvalidOptions)?;

    serde_yaml::to_writer(writer, options)?;
    Ok(())
}

impl TranslationOptions {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ReadError> {
        read_options(yaml.as_bytes())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ReadError> {
        let file = File::open(path.as_ref())
            .inspect_err(|e| warn!("Failed to open {}: {}", path.as_ref().display(), e))?;
        read_options(file)
    }
}
