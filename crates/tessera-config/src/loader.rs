//! Load engine options from a TOML file and `TESSERA__*` environment variables.

use std::path::PathBuf;

use config::{Config, Environment, File, Map, Source};
use serde_json::Value;
use tessera_core::EngineOptions;
use tracing::debug;

use crate::Result;
use crate::merger::{Layered, PartialOptions, Priority};

/// File read when no explicit path is given.
pub const DEFAULT_PATH: &str = "tessera.toml";

/// Prefix of the environment variables that override options,
/// e.g. `TESSERA__DYNAMIC_SORT_SUBTABLE=natural`.
pub const ENV_PREFIX: &str = "TESSERA";

pub fn load_options(path: Option<&str>) -> Result<EngineOptions> {
    load_layered(path).map(|layered| layered.options())
}

/// Load defaults, then the file (only if it exists), then the process environment.
pub fn load_layered(path: Option<&str>) -> Result<Layered> {
    load_layered_with_env(path, None)
}

/// Like [`load_layered`], reading environment overrides from `env` instead of
/// the process environment when given.
pub fn load_layered_with_env(
    path: Option<&str>,
    env: Option<Map<String, String>>,
) -> Result<Layered> {
    let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_PATH));
    let file = if pathbuf.exists() {
        debug!(path = %pathbuf.display(), "reading options file");
        read_source(File::from(pathbuf))?
    } else {
        debug!(path = %pathbuf.display(), "options file not found, skipping");
        PartialOptions::default()
    };

    let environment = read_source(
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .separator("__")
            .source(env),
    )?;

    Ok(Layered::defaults()
        .merge(file, Priority::File)
        .merge(environment, Priority::Environment))
}

fn read_source<S>(source: S) -> Result<PartialOptions>
where
    S: Source + Send + Sync + 'static,
{
    let value: Value = Config::builder()
        .add_source(source)
        .build()?
        .try_deserialize()?;
    PartialOptions::from_json(value)
}
