pub mod config;
pub mod credentials;
pub mod monitor;
pub mod prefs;
pub mod status;
pub mod update;
