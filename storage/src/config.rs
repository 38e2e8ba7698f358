use serde::Deserialize;

#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
pub enum StoreType {
    Filesystem {
        base_dir: String,
    },
    Gcs {
        bucket: String,
        project_id: Option<String>,
        /// Service account key as a JSON document. Application Default
        /// Credentials are used when absent.
        credentials: Option<String>,
    },
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct Config {
    #[serde(flatten)]
    pub r#type: StoreType,
}
