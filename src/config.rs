use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use graph::Namespaces;
use serde::Deserialize;
use tracing::debug;

pub(crate) const DEFAULT_CONFIG: &str = "lugh.toml";

#[derive(Clone, Default, Debug, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    /// Prefix to namespace, on top of the built-in `rdf`, `rdfs`, `xsd` and `xml`
    pub(crate) prefixes: BTreeMap<String, String>,
    pub(crate) output: OutputConfig,
    pub(crate) query: QueryConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub(crate) struct OutputConfig {
    pub(crate) separator: String,
    pub(crate) json: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub(crate) struct QueryConfig {
    /// Print reference targets along with literal values
    pub(crate) include_references: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            separator: " ; ".to_owned(),
            json: false,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            include_references: true,
        }
    }
}

impl Config {
    pub(crate) fn load(path: &Path) -> Result<Config> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = toml::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        debug!(target: "config", path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Loads the given file, or `lugh.toml` if it exists, or the defaults.
    pub(crate) fn find(path: Option<&Path>) -> Result<Config> {
        match path {
            Some(path) => Config::load(path),
            None if Path::new(DEFAULT_CONFIG).is_file() => Config::load(Path::new(DEFAULT_CONFIG)),
            None => Ok(Config::default()),
        }
    }

    /// Adds `prefix=namespace` bindings given on the command line.
    pub(crate) fn bind_prefixes(&mut self, bindings: &[String]) -> Result<()> {
        for binding in bindings {
            let Some((prefix, namespace)) = binding.split_once('=') else {
                bail!("prefix binding {binding:?} is not of the form prefix=namespace");
            };
            if prefix.is_empty() || namespace.is_empty() {
                bail!("prefix binding {binding:?} has an empty side");
            }
            self.prefixes.insert(prefix.to_owned(), namespace.to_owned());
        }
        Ok(())
    }

    pub(crate) fn namespaces(&self) -> Namespaces {
        let mut namespaces = Namespaces::default();
        for (prefix, namespace) in &self.prefixes {
            namespaces.insert(prefix, namespace);
        }
        namespaces
    }
}
