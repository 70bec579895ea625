use crate::error::Result;
use crate::models::Settings;
use directories::ProjectDirs;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "pdftools", "pdftools")
}

pub fn get_config_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// The launcher hands each workflow its own cache directory; fall back to the
/// platform cache dir when run outside of it.
pub fn get_cache_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("alfred_workflow_cache") {
        return PathBuf::from(dir);
    }
    project_dirs()
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("pdftools"))
}

pub fn atomic_write(path: &Path, data: &str) -> std::io::Result<()> {
    let tmp_path = path.with_extension("tmp");

    {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(data.as_bytes())?;
        file.sync_all()?;
    }

    fs::rename(&tmp_path, path)?;

    Ok(())
}

pub fn load_settings() -> Settings {
    load_settings_from(&get_config_dir().join("settings.json"))
}

pub fn load_settings_from(path: &Path) -> Settings {
    let Ok(data) = fs::read_to_string(path) else {
        return Settings::default();
    };
    match serde_json::from_str::<Settings>(&data) {
        Ok(settings) => settings,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupted settings, using defaults");
            Settings::default()
        }
    }
}

pub fn save_settings(settings: &Settings) -> Result<PathBuf> {
    let dir = get_config_dir();
    fs::create_dir_all(&dir)?;
    let path = dir.join("settings.json");
    let data = serde_json::to_string_pretty(settings)?;
    atomic_write(&path, &data)?;
    Ok(path)
}
