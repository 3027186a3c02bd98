use std::path::PathBuf;

use crate::options::OptionKey;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid [remote].{key} = {value} in {path}: {reason}")]
    InvalidSetting {
        path: PathBuf,
        key: &'static str,
        value: u64,
        reason: &'static str,
    },

    // ── Option resolution ──
    #[error("unknown option '{name}'; known options: {}", OptionKey::flag_names().join(", "))]
    UnknownOption { name: String },

    #[error("required option '{}' is not set; pass --{}=<value> or add it to [options] in sling.toml", key.flag(), key.flag())]
    MissingOption { key: OptionKey },

    #[error("invalid value {value:?} for option '{}': {reason}", key.flag())]
    InvalidOption {
        key: OptionKey,
        value: String,
        reason: &'static str,
    },

    #[error("could not resolve home directory for {path}")]
    HomeDir { path: String },
}
