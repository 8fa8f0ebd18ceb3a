use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use solance_chat::orchestrator::{BusyPolicy, ChatSettings};
use solance_core::models::endpoint::EndpointTable;
use solance_core::models::usage::MAX_DAILY_MESSAGES;
use solance_llm::gemini::DEFAULT_BASE_URL;
use solance_llm::request::GenerationConfig;

/// Current config version. Bump this when adding fields or changing shape.
/// Each bump requires a corresponding entry in [`migrate`].
pub const CURRENT_VERSION: u32 = 1;

const APP_DIR: &str = "solance";

/// Non-secret settings. API keys never live here; see [`crate::secrets`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolanceConfig {
    /// Schema version. Missing or 0 = pre-versioned config.
    pub config_version: u32,
    pub daily_limit: u32,
    pub title_max_chars: usize,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub busy_policy: BusyPolicy,
    pub api_base_url: String,
    /// Where conversations and usage are stored. Defaults to the
    /// platform data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for SolanceConfig {
    fn default() -> Self {
        let generation = GenerationConfig::default();
        Self {
            config_version: CURRENT_VERSION,
            daily_limit: MAX_DAILY_MESSAGES,
            title_max_chars: ChatSettings::default().title_max_chars,
            temperature: generation.temperature,
            max_output_tokens: generation.max_output_tokens,
            busy_policy: BusyPolicy::default(),
            api_base_url: DEFAULT_BASE_URL.to_string(),
            data_dir: None,
        }
    }
}

impl SolanceConfig {
    pub fn chat_settings(&self) -> ChatSettings {
        ChatSettings {
            daily_limit: self.daily_limit,
            title_max_chars: self.title_max_chars,
            busy_policy: self.busy_policy,
            generation: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        }
    }

    /// The configured data directory, or the platform default.
    pub fn resolve_data_dir(&self) -> eyre::Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => {
                let base = dirs::data_dir().ok_or_else(|| eyre::eyre!("no data directory found"))?;
                Ok(base.join(APP_DIR))
            }
        }
    }
}

/// Redacted summary safe to print.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigInfo {
    pub config_path: String,
    /// `None` when running without persistence.
    pub data_dir: Option<String>,
    pub daily_limit: u32,
    pub busy_policy: BusyPolicy,
    pub api_base_url: String,
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub model: String,
    pub credentials: usize,
    pub key_hints: Vec<String>,
}

pub fn default_config_path() -> eyre::Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| eyre::eyre!("no config directory found"))?;
    Ok(base.join(APP_DIR).join("config.json"))
}

/// Load the config at `path`, writing the defaults there on first run.
/// If the defaults cannot be written they are still used for this run.
pub fn load_or_init_config(path: &Path) -> eyre::Result<SolanceConfig> {
    if path.exists() {
        return load_config(path);
    }
    let config = SolanceConfig::default();
    if let Err(e) = save_config(path, &config) {
        tracing::warn!(path = %path.display(), error = %e, "could not write default config");
    }
    Ok(config)
}

pub fn load_config(path: &Path) -> eyre::Result<SolanceConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read config at {}: {e}", path.display()))?;

    // Parse as raw JSON so we can run migrations before deserializing.
    let json: serde_json::Value = serde_json::from_str(&contents)?;
    let on_disk_version = json
        .get("config_version")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as u32;

    let migrated = migrate(json, on_disk_version)?;
    let config: SolanceConfig = serde_json::from_value(migrated)?;
    Ok(config)
}

/// Run sequential migrations from `from_version` up to [`CURRENT_VERSION`].
///
/// Each migration is a pure transform on the raw JSON value. A file with no
/// `config_version` was written by hand in the v1 shape and only gets the
/// version stamped.
pub fn migrate(mut json: serde_json::Value, from_version: u32) -> eyre::Result<serde_json::Value> {
    if from_version > CURRENT_VERSION {
        return Err(eyre::eyre!(
            "config_version {from_version} is newer than this build supports ({CURRENT_VERSION}). \
             Please update solance."
        ));
    }

    let obj = json
        .as_object_mut()
        .ok_or_else(|| eyre::eyre!("config is not a JSON object"))?;
    obj.insert(
        "config_version".to_string(),
        serde_json::Value::Number(CURRENT_VERSION.into()),
    );

    // Future migrations go here:
    // if from_version < 2 { ... }

    Ok(json)
}

pub fn save_config(path: &Path, config: &SolanceConfig) -> eyre::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| eyre::eyre!("config path {} has no parent directory", path.display()))?;
    std::fs::create_dir_all(dir)?;

    // Always write the current version, regardless of what was loaded.
    let mut stamped = config.clone();
    stamped.config_version = CURRENT_VERSION;

    let json = serde_json::to_string_pretty(&stamped)?;

    let mut tmp_path = path.as_os_str().to_owned();
    tmp_path.push(".tmp");
    let tmp_path = PathBuf::from(tmp_path);
    std::fs::write(&tmp_path, json.as_bytes())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp_path, path)?;

    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}

pub fn config_info(
    config: &SolanceConfig,
    config_path: &Path,
    data_dir: Option<&Path>,
    table: &EndpointTable,
) -> ConfigInfo {
    let models = table
        .endpoints()
        .iter()
        .map(|endpoint| ModelInfo {
            model: endpoint.model.clone(),
            credentials: endpoint.credentials.len(),
            key_hints: endpoint.credentials.iter().map(|k| k.hint()).collect(),
        })
        .collect();

    ConfigInfo {
        config_path: config_path.display().to_string(),
        data_dir: data_dir.map(|d| d.display().to_string()),
        daily_limit: config.daily_limit,
        busy_policy: config.busy_policy,
        api_base_url: config.api_base_url.clone(),
        models,
    }
}
