/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 05/09/2026
Last Modified: 14/10/2026
License: MIT
*/

use crate::feature::FeatureCollection;
use crate::geojson::{from_geojson_str, to_geojson_string};
use mapchange_common::{MapChangeError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Loads and saves feature collections.
///
/// `layer` selects a layer inside a multi-layer data source and is ignored by
/// single-file sources.
pub trait GeometryIo {
    fn load(&self, path: &Path, layer: Option<&str>) -> Result<FeatureCollection>;
    fn save(&self, collection: &FeatureCollection, path: &Path, layer: Option<&str>) -> Result<()>;
}

/// The on-disk layout of a vector data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorFormat {
    /// One GeoJSON file holding one layer.
    SingleFile,
    /// A directory (conventionally `*.gdb`) holding one `<layer>.geojson` per layer.
    Directory,
}

impl VectorFormat {
    /// Existing directories and paths with a `.gdb` extension are directory
    /// sources; anything else is a single file.
    pub fn from_path(path: &Path) -> VectorFormat {
        let gdb = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("gdb"));
        if gdb || path.is_dir() {
            VectorFormat::Directory
        } else {
            VectorFormat::SingleFile
        }
    }
}

pub fn layer_file(dir: &Path, layer: &str) -> PathBuf {
    dir.join(format!("{}.geojson", layer))
}

fn required_layer<'a>(path: &Path, layer: Option<&'a str>) -> Result<&'a str> {
    match layer {
        Some(l) if !l.trim().is_empty() => Ok(l),
        _ => Err(MapChangeError::InvalidParameter(format!(
            "a layer name is required for the directory data source {}",
            path.display()
        ))),
    }
}

/// Reads and writes GeoJSON files and directories of GeoJSON layers.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStore;

impl FileStore {
    pub fn new() -> FileStore {
        FileStore
    }
}

impl GeometryIo for FileStore {
    fn load(&self, path: &Path, layer: Option<&str>) -> Result<FeatureCollection> {
        let file = match VectorFormat::from_path(path) {
            VectorFormat::SingleFile => path.to_path_buf(),
            VectorFormat::Directory => {
                let layer = required_layer(path, layer)?;
                if !path.is_dir() {
                    return Err(MapChangeError::InputNotFound(path.display().to_string()));
                }
                let file = layer_file(path, layer);
                if !file.is_file() {
                    return Err(MapChangeError::InputNotFound(format!(
                        "layer {} in {}",
                        layer,
                        path.display()
                    )));
                }
                file
            }
        };
        if !file.is_file() {
            return Err(MapChangeError::InputNotFound(file.display().to_string()));
        }
        let text = fs::read_to_string(&file)?;
        let collection = from_geojson_str(&text)?;
        log::debug!("read {} features from {}", collection.len(), file.display());
        Ok(collection)
    }

    fn save(&self, collection: &FeatureCollection, path: &Path, layer: Option<&str>) -> Result<()> {
        let file = match VectorFormat::from_path(path) {
            VectorFormat::SingleFile => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        fs::create_dir_all(parent)?;
                    }
                }
                path.to_path_buf()
            }
            VectorFormat::Directory => {
                let layer = required_layer(path, layer)?;
                fs::create_dir_all(path)?;
                layer_file(path, layer)
            }
        };
        fs::write(&file, to_geojson_string(collection)?)?;
        log::debug!("wrote {} features to {}", collection.len(), file.display());
        Ok(())
    }
}

/// Keeps collections in memory, keyed by path and layer.
#[derive(Debug, Default)]
pub struct MemoryStore {
    layers: Mutex<HashMap<(PathBuf, Option<String>), FeatureCollection>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    pub fn insert(&self, path: &Path, layer: Option<&str>, collection: FeatureCollection) {
        let mut layers = self.layers.lock().unwrap_or_else(|e| e.into_inner());
        layers.insert((path.to_path_buf(), layer.map(String::from)), collection);
    }

    pub fn get(&self, path: &Path, layer: Option<&str>) -> Option<FeatureCollection> {
        let layers = self.layers.lock().unwrap_or_else(|e| e.into_inner());
        layers.get(&(path.to_path_buf(), layer.map(String::from))).cloned()
    }

    pub fn len(&self) -> usize {
        self.layers.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl GeometryIo for MemoryStore {
    fn load(&self, path: &Path, layer: Option<&str>) -> Result<FeatureCollection> {
        self.get(path, layer).ok_or_else(|| {
            MapChangeError::InputNotFound(match layer {
                Some(l) => format!("layer {} in {}", l, path.display()),
                None => path.display().to_string(),
            })
        })
    }

    fn save(&self, collection: &FeatureCollection, path: &Path, layer: Option<&str>) -> Result<()> {
        self.insert(path, layer, collection.clone());
        Ok(())
    }
}
