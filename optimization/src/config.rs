use serde::Deserialize;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://cloudoptimization.googleapis.com";

fn default_endpoint() -> Url {
    Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid URL")
}

/// Optimization service configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Base URL of the optimization service
    #[serde(default = "default_endpoint")]
    pub endpoint: Url,
    /// Google Cloud project the optimization requests are billed to
    #[serde(default)]
    pub project_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            endpoint: default_endpoint(),
            project_id: None,
        }
    }
}
