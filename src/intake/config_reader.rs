use std::fs;
use std::path::{Path, PathBuf};

use crate::intake::*;

const DEFAULT_ALERT_SUBJECT: &str = "Event Safety Alert";

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(rename = "objectDirectory")]
    pub object_directory: Option<String>,
    #[serde(rename = "recordDirectory")]
    pub record_directory: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertSettings {
    pub topic: Option<String>,
    pub subject: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct PdfSettings {
    #[serde(rename = "structuredExtraction")]
    pub structured_extraction: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntakeConfig {
    pub storage: Option<StorageSettings>,
    pub alerts: Option<AlertSettings>,
    pub pdf: Option<PdfSettings>,
    // Directory of the config file, relative paths are resolved against it.
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl IntakeConfig {
    pub fn object_directory(&self) -> Option<PathBuf> {
        let dir = self.storage.as_ref()?.object_directory.as_ref()?;
        Some(self.resolve(dir))
    }

    pub fn record_directory(&self) -> Option<PathBuf> {
        let dir = self.storage.as_ref()?.record_directory.as_ref()?;
        Some(self.resolve(dir))
    }

    pub fn alert_topic(&self) -> Option<String> {
        self.alerts
            .as_ref()
            .and_then(|a| a.topic.clone())
            .filter(|t| !t.is_empty())
    }

    pub fn alert_subject(&self) -> String {
        self.alerts
            .as_ref()
            .and_then(|a| a.subject.clone())
            .unwrap_or_else(|| DEFAULT_ALERT_SUBJECT.to_string())
    }

    pub fn structured_pdf_extraction(&self) -> bool {
        self.pdf
            .as_ref()
            .and_then(|p| p.structured_extraction)
            .unwrap_or(true)
    }

    fn resolve(&self, dir: &str) -> PathBuf {
        match &self.base_dir {
            Some(base) if Path::new(dir).is_relative() => base.join(dir),
            _ => PathBuf::from(dir),
        }
    }
}

pub fn parse_config(contents: &str, path: &str) -> IntakeResult<IntakeConfig> {
    let mut config: IntakeConfig =
        serde_json::from_str(contents).context(ParsingConfigSnafu { path })?;
    config.base_dir = Path::new(path).parent().map(|p| p.to_path_buf());
    Ok(config)
}

pub fn read_config(path: &str) -> IntakeResult<IntakeConfig> {
    let contents = fs::read_to_string(path).context(OpeningConfigSnafu { path })?;
    debug!("read_config: {:?}", contents);
    let config = parse_config(&contents, path)?;
    info!("config: {:?}", config);
    Ok(config)
}
