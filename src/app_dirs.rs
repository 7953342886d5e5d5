use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Offline-queue database under $HOME/.local/state/pacer
    pub fn queue_db_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("pacer");
            Some(state_dir.join("queue.db"))
        } else {
            ProjectDirs::from("", "", "pacer")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("queue.db"))
        }
    }
}
