use std::path::{Path, PathBuf};

use crate::network::BaselinePolicy;

pub const PRODUCTION_FILE: &str = "production_data.csv";
pub const MACHINE_FILE: &str = "machine_health.json";
pub const DATABASE_FILE: &str = "diagnostics.db";

/// Locations of the external stores and the save policy, handed to the
/// load/save collaborators explicitly
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub database: PathBuf,
    pub baseline_policy: BaselinePolicy,
}

impl Config {
    /// Default layout under a data directory
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        Config {
            database: data_dir.join(DATABASE_FILE),
            data_dir,
            baseline_policy: BaselinePolicy::default(),
        }
    }

    pub fn with_database<P: Into<PathBuf>>(mut self, database: P) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_baseline_policy(mut self, policy: BaselinePolicy) -> Self {
        self.baseline_policy = policy;
        self
    }

    pub fn production_csv(&self) -> PathBuf {
        self.data_dir.join(PRODUCTION_FILE)
    }

    pub fn machine_json(&self) -> PathBuf {
        self.data_dir.join(MACHINE_FILE)
    }
}
