//! Config command implementation.

use chrono::{DateTime, Utc};

use crate::cli::args::{ConfigCommand, OutputFormat};
use crate::core::models::RobotOutput;
use crate::error::Result;
use crate::render::structured::render_json;
use crate::storage::ResolvedConfig;

/// Execute a config subcommand.
pub fn execute(command: ConfigCommand, config: &ResolvedConfig, now: DateTime<Utc>) -> Result<()> {
    match (command, config.format) {
        (ConfigCommand::Path, OutputFormat::Text) => {
            println!("{}", config.config_path.display());
        }
        (ConfigCommand::Path, OutputFormat::Json) => {
            let data = serde_json::json!({
                "path": config.config_path.display().to_string(),
                "exists": config.config_path.exists(),
                "source": config.sources.config_path.to_string(),
            });
            println!("{}", render_json(&RobotOutput::new("config", now, data), config.pretty)?);
        }
        (ConfigCommand::Show, OutputFormat::Text) => {
            let state = if config.config_path.exists() {
                "loaded"
            } else {
                "not found, defaults in use"
            };
            println!("# {} ({state})", config.config_path.display());
            print!("{}", config.file.to_toml()?);
        }
        (ConfigCommand::Show, OutputFormat::Json) => {
            let output = RobotOutput::new("config", now, &config.file);
            println!("{}", render_json(&output, config.pretty)?);
        }
    }
    Ok(())
}
