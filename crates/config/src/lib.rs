//! Client configuration: where the API lives and where local state is kept.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{
        clear_config_dir, config_dir, discover_and_load, load_config, set_config_dir,
        storage_path, update_config, update_config_at,
    },
    schema::{ApiConfig, DEFAULT_API_URL, PlazaConfig, StorageConfig},
};
