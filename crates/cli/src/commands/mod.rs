//! CLI commands for the SPA test.

pub mod screen;
pub mod show_config;

pub use screen::{run_screen, ScreenArgs};
pub use show_config::{run_show_config, ConfigArgs};
pub use spa_test::{run_spa_test, TestArgs};
