use chatkit_session::{ImageTransport, SessionConfig, TemplateRegistry};
use chatkit_types::AttachmentKind;
use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionSettings,
    pub http: HttpConfig,
    pub storage: StorageConfig,
    pub templates: TemplatesConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Empty string disables the greeting turn
    pub greeting: String,
    pub native_images: bool,
    pub event_buffer: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            greeting: chatkit_session::DEFAULT_GREETING.to_string(),
            native_images: true,
            event_buffer: 256,
        }
    }
}

/// Request timeouts; unset means no limit
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
}

impl HttpConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Defaults to `<config dir>/chatkit/models.json`
    pub models_path: Option<PathBuf>,
}

/// Per-kind template overrides; an empty string clears the template
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    pub code: Option<String>,
    pub chart: Option<String>,
    pub table: Option<String>,
}

impl TemplatesConfig {
    pub fn registry(&self) -> TemplateRegistry {
        let mut registry = TemplateRegistry::default();
        let overrides = [
            (AttachmentKind::Code, &self.code),
            (AttachmentKind::Chart, &self.chart),
            (AttachmentKind::Table, &self.table),
        ];

        for (kind, template) in overrides {
            match template.as_deref() {
                None => {}
                Some("") => {
                    registry.clear(kind);
                }
                Some(template) => registry.set(kind, template),
            }
        }
        registry
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables prefixed `CHATKIT`, e.g. `CHATKIT_HTTP__TIMEOUT_SECS`
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("CHATKIT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));
        builder.build()?.try_deserialize()
    }

    pub fn session_config(&self) -> SessionConfig {
        let transport = if self.session.native_images {
            ImageTransport::Native
        } else {
            ImageTransport::Markdown
        };

        let config = SessionConfig::default()
            .with_image_transport(transport)
            .with_templates(self.templates.registry());

        if self.session.greeting.is_empty() {
            config.without_greeting()
        } else {
            config.with_greeting(self.session.greeting.as_str())
        }
    }
}
