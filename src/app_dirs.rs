use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Where settings and history live.
    pub fn data_dir() -> PathBuf {
        if let Some(dir) = Self::home_state_dir() {
            return dir;
        }
        ProjectDirs::from("", "", "typur")
            .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".typur"))
    }

    fn home_state_dir() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("typur"),
        )
    }
}
