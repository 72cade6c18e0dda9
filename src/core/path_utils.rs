/*
 * Path helpers shared by the configuration layer and the open/save flows: locating
 * (and creating) the per-user configuration directory, and deriving the display name
 * and containing folder of a document path.
 */
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/*
 * Returns the local (non-roaming) configuration directory for `app_name`, creating it
 * when missing. `None` if the platform has no such location or it cannot be created;
 * callers treat that as "no persisted configuration".
 */
pub fn app_config_dir(app_name: &str) -> Option<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", app_name)?;
    let config_dir = project_dirs.config_local_dir();
    if !config_dir.exists() {
        if let Err(e) = fs::create_dir_all(config_dir) {
            log::error!("PathUtils: Failed to create config directory {config_dir:?}: {e}");
            return None;
        }
        log::debug!("PathUtils: Created config directory {config_dir:?}.");
    }
    Some(config_dir.to_path_buf())
}

// The file name shown in the window title, falling back to the full path.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

pub fn containing_dir(path: &Path) -> Option<PathBuf> {
    path.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
}
