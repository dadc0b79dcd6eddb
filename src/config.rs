//! Run configuration and its defaults. All values are immutable once the
//! batch starts and shared read-only across concurrent pipeline units.

use std::path::PathBuf;
use std::time::Duration;

pub const APP_NAME: &str = "Platefile";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_CONCURRENCY: usize = 5;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 1500;
pub const DEFAULT_GROUP_THRESHOLD_SECS: i64 = 8;
pub const DEFAULT_VISION_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";

/// Everything one batch run needs, assembled by the CLI.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub api_key: String,
    pub input_dir: PathBuf,
    pub output_csv: PathBuf,
    pub concurrency: usize,
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub group_threshold_secs: i64,
    pub batch_tags: Vec<String>,
    /// When set, one plain-text file per recipe is written here.
    pub text_export_dir: Option<PathBuf>,
    pub vision_model: String,
    pub text_model: String,
}

impl RunConfig {
    pub fn new(api_key: String, input_dir: PathBuf, output_csv: PathBuf) -> Self {
        Self {
            api_key,
            input_dir,
            output_csv,
            concurrency: DEFAULT_CONCURRENCY,
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            group_threshold_secs: DEFAULT_GROUP_THRESHOLD_SECS,
            batch_tags: Vec::new(),
            text_export_dir: None,
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
        }
    }
}

pub fn default_log_filter() -> String {
    "platefile=info".to_string()
}
