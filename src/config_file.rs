//! Generic config file loader

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use serde::de::DeserializeOwned;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigBackend {
    Json5,
    Yaml,
}

impl ConfigBackend {
    pub fn load_config_str<T: DeserializeOwned>(self, s: &str) -> Result<T> {
        match self {
            ConfigBackend::Json5 => serde_json5::from_str(s).map_err(|e| anyhow!("{e}")),
            ConfigBackend::Yaml => Ok(serde_yml::from_str(s)?),
        }
    }

    pub fn load_config_file<T: DeserializeOwned>(self, path: &Path) -> Result<T> {
        let s = std::fs::read_to_string(path)
            .with_context(|| anyhow!("loading config file from {path:?}"))?;
        self.load_config_str(&s)
            .with_context(|| anyhow!("decoding {self:?} from config file {path:?}"))
    }
}

pub const FILE_EXTENSIONS: &[(&str, ConfigBackend)] = &[
    ("json5", ConfigBackend::Json5),
    ("json", ConfigBackend::Json5),
    ("yml", ConfigBackend::Yaml),
    ("yaml", ConfigBackend::Yaml),
];

pub fn backend_from_path(path: &Path) -> Result<ConfigBackend> {
    if let Some(ext) = path.extension() {
        if let Some(ext) = ext.to_str() {
            if let Some((_, backend)) = FILE_EXTENSIONS.iter().find(|(e, _b)| *e == ext) {
                Ok(*backend)
            } else {
                bail!("given file path does have an unknown extension {ext:?}: {path:?}")
            }
        } else {
            bail!("given file path does have an extension that is not unicode: {path:?}")
        }
    } else {
        bail!(
            "given file path does not have an extension \
                     for determining the file type: {path:?}"
        )
    }
}

fn add_extension(path: &Path, extension: &str) -> PathBuf {
    let mut s: OsString = path.as_os_str().to_owned();
    s.push(".");
    s.push(extension);
    s.into()
}

pub trait LoadConfigFile: Default + DeserializeOwned {
    /// The extensions from `FILE_EXTENSIONS` are appended and tried
    fn default_config_path_without_suffix() -> Result<Option<PathBuf>>;

    /// If `path` is given, the file must exist or an error is
    /// returned. Otherwise, the default location is checked with all
    /// known file name extensions; if exactly one exists it is
    /// loaded, if none exists, the `Default` instance is returned.
    fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        if let Some(path) = path {
            let path = path.as_ref();
            let backend = backend_from_path(path)?;
            backend.load_config_file(path)
        } else if let Some(path) = Self::default_config_path_without_suffix()? {
            let path_and_backends: Vec<(PathBuf, ConfigBackend)> = FILE_EXTENSIONS
                .iter()
                .map(|(extension, backend)| (add_extension(&path, extension), *backend))
                .filter(|(path, _)| path.exists())
                .collect();
            match path_and_backends.as_slice() {
                [] => Ok(Self::default()),
                [(path, backend)] => backend.load_config_file(path),
                _ => {
                    let paths: Vec<_> = path_and_backends.iter().map(|(p, _)| p).collect();
                    bail!("multiple config file paths found, leading to ambiguity: {paths:?}")
                }
            }
        } else {
            Ok(Self::default())
        }
    }
}
