use std::path::PathBuf;
use std::time::Duration;

/// Process configuration, loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_dir: PathBuf,
    pub log_level: &'static str,
    pub ffmpeg_path: String,
    /// Explicit sidecar project directory; discovered relative to the
    /// executable when unset.
    pub sidecar_dir: Option<PathBuf>,
    pub qr_timeout: Duration,
}

impl Config {
    pub fn load() -> Self {
        Self {
            db_dir: PathBuf::from(env_or("DB_DIR", "store")),
            log_level: normalize_level(&env_or("LOG_LEVEL", "INFO")),
            ffmpeg_path: env_or("FFMPEG_PATH", "ffmpeg"),
            sidecar_dir: std::env::var("SIDECAR_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            qr_timeout: Duration::from_secs(180),
        }
    }

    /// Per-crate directives for the tracing filter.
    pub fn log_directives(&self) -> Vec<String> {
        [
            "wren",
            "wren_core",
            "wren_db",
            "wren_media",
            "wren_wa",
            "wren_ipc",
            "wren_service",
            "wren_mcp",
        ]
        .iter()
        .map(|target| format!("{target}={}", self.log_level))
        .collect()
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn normalize_level(level: &str) -> &'static str {
    match level.to_ascii_uppercase().as_str() {
        "DEBUG" => "debug",
        "WARN" => "warn",
        "ERROR" => "error",
        _ => "info",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_normalize_with_info_fallback() {
        assert_eq!(normalize_level("debug"), "debug");
        assert_eq!(normalize_level("WARN"), "warn");
        assert_eq!(normalize_level("Error"), "error");
        assert_eq!(normalize_level("verbose"), "info");
        assert_eq!(normalize_level(""), "info");
    }

    #[test]
    fn directives_cover_every_crate() {
        let cfg = Config {
            db_dir: PathBuf::from("store"),
            log_level: "warn",
            ffmpeg_path: "ffmpeg".to_string(),
            sidecar_dir: None,
            qr_timeout: Duration::from_secs(180),
        };
        let directives = cfg.log_directives();
        assert!(directives.contains(&"wren_db=warn".to_string()));
        assert_eq!(directives.len(), 8);
    }
}
