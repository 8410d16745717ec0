/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 03/09/2026
Last Modified: 18/10/2026
License: MIT
*/

use crate::algorithms::DEFAULT_MERGE_PRECISION;
use crate::error::Result;
use crate::parallel::DEFAULT_BATCH_SIZE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A structure to hold environment settings. Backed by a settings.json file
/// next to the executable.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Configs {
    pub verbose_mode: bool,
    pub working_directory: String,
    /// Upper bound on worker threads; -1 uses the default pool size.
    pub max_procs: isize,
    /// Number of features handed to a worker at a time.
    pub batch_size: usize,
    /// Decimal places used when matching line endpoints.
    pub merge_precision: u32,
}

impl Default for Configs {
    fn default() -> Configs {
        Configs {
            verbose_mode: true,
            working_directory: String::new(),
            max_procs: -1,
            batch_size: DEFAULT_BATCH_SIZE,
            merge_precision: DEFAULT_MERGE_PRECISION,
        }
    }
}

/// Location of settings.json: the directory holding the running executable,
/// or the current directory when that cannot be determined.
pub fn settings_file() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = match exe.parent() {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir()?,
    };
    Ok(dir.join("settings.json"))
}

/// Reads settings.json, falling back to the defaults when it does not exist.
pub fn get_configs() -> Result<Configs> {
    read_configs(&settings_file()?)
}

pub fn save_configs(configs: &Configs) -> Result<()> {
    write_configs(configs, &settings_file()?)
}

pub fn read_configs(path: &Path) -> Result<Configs> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(serde_json::from_str(&contents)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Configs::default()),
        Err(e) => Err(e.into()),
    }
}

pub fn write_configs(configs: &Configs, path: &Path) -> Result<()> {
    let configs_json = serde_json::to_string_pretty(configs)?;
    fs::write(path, configs_json)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::MapChangeError;

    fn temp_file(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mapchange_configs_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn settings_live_next_to_the_executable() {
        let file = settings_file().unwrap();
        assert_eq!(file.file_name().and_then(|n| n.to_str()), Some("settings.json"));
        let exe = std::env::current_exe().unwrap();
        assert_eq!(file.parent(), exe.parent());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = temp_file("does_not_exist.json");
        assert_eq!(read_configs(&path).unwrap(), Configs::default());
    }

    #[test]
    fn saved_settings_are_read_back() {
        let path = temp_file("settings.json");
        let mut configs = Configs::default();
        configs.max_procs = 2;
        configs.working_directory = "/data/".to_string();
        write_configs(&configs, &path).unwrap();
        assert_eq!(read_configs(&path).unwrap(), configs);
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let path = temp_file("partial.json");
        fs::write(&path, r#"{"verbose_mode": false}"#).unwrap();
        let configs = read_configs(&path).unwrap();
        assert!(!configs.verbose_mode);
        assert_eq!(configs.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let path = temp_file("broken.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(read_configs(&path), Err(MapChangeError::Json(_))));
    }
}
