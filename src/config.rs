use std::path::PathBuf;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_REPO: &str = "google/transit";
pub const DEFAULT_DATA_DIR: &str = "data/raw-digest";
pub const MAX_PER_PAGE: u32 = 100;

/// Resolved runtime settings. Built once by the CLI and passed down.
#[derive(Clone, Debug)]
pub struct Settings {
    pub api_base: String,
    pub repo: String,
    pub data_dir: PathBuf,
    pub per_page: u32,
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_owned(),
            repo: DEFAULT_REPO.to_owned(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            per_page: MAX_PER_PAGE,
            timeout_secs: 10,
        }
    }
}

impl Settings {
    /// GitHub rejects page sizes above 100.
    pub fn page_size(&self) -> u32 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }
}
