// Configuration module
// Public interface for logger configuration and loading

pub mod constants;
mod loader;
mod settings;

pub use loader::{load_config, parse_config};
pub use settings::{
    BinSize, GroupSpec, LocalConfig, LogMode, LoggerConfig, RemoteConfig, RemoteMode,
};
