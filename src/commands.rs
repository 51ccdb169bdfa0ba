//! CLI command definitions
//!
//! Defines the clap commands for the scenario driver.

use clap::Subcommand;
use std::path::PathBuf;

use crate::common::parse_key_value;

#[derive(Subcommand)]
pub enum Commands {
    /// Run one or more YAML scenarios
    Run {
        /// Scenario files
        #[arg(required = true)]
        scenarios: Vec<PathBuf>,

        /// Set a variable (KEY=VALUE), overriding the scenario's
        #[arg(long = "var", value_parser = parse_key_value)]
        vars: Vec<(String, String)>,

        /// Pin a port (NAME=PORT) instead of allocating it
        #[arg(long = "port", value_parser = parse_port)]
        ports: Vec<(String, u16)>,

        /// Override the XDS version
        #[arg(long)]
        xds: Option<u32>,

        /// Stop after the first failing scenario
        #[arg(long)]
        fail_fast: bool,
    },

    /// Render a single config template
    Render {
        /// Template file
        template: PathBuf,

        /// Output file
        #[arg(long, short)]
        output: PathBuf,

        /// Set a variable (KEY=VALUE)
        #[arg(long = "var", value_parser = parse_key_value)]
        vars: Vec<(String, String)>,

        /// Set a port (NAME=PORT)
        #[arg(long = "port", value_parser = parse_port)]
        ports: Vec<(String, u16)>,

        /// XDS version (default from config)
        #[arg(long)]
        xds: Option<u32>,
    },
}

/// Parse `NAME=PORT`
pub fn parse_port(s: &str) -> Result<(String, u16), String> {
    let (name, value) = parse_key_value(s)?;
    let port = value
        .trim()
        .parse::<u16>()
        .map_err(|e| format!("invalid port '{}': {}", value, e))?;
    Ok((name, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("Admin=15000").unwrap(), ("Admin".to_string(), 15000));
        assert!(parse_port("Admin=99999").is_err());
        assert!(parse_port("Admin").is_err());
    }
}
