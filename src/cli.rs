//! Command-line argument parsing for query-console.

use clap::Parser;
use std::path::PathBuf;

/// Output format for headless mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Box-drawn tables, the same layout the terminal UI uses.
    #[default]
    Text,
    /// Rendered tables as JSON.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {s}. Expected: text or json")),
        }
    }
}

/// A terminal query console for SQLite databases.
#[derive(Parser, Debug)]
#[command(name = "query-console")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// SQLite database file to load on start
    #[arg(value_name = "DATABASE")]
    pub database: Option<PathBuf>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Row count above which confirmation is requested before rendering
    #[arg(short = 't', long, value_name = "ROWS", env = "QUERY_CONSOLE_THRESHOLD")]
    pub threshold: Option<usize>,

    // === Headless mode options ===
    /// Run once without the terminal UI and print the results
    #[arg(long)]
    pub headless: bool,

    /// SQL to execute in headless mode (defaults to the stored query)
    #[arg(short = 'e', long, value_name = "SQL")]
    pub exec: Option<String>,

    /// Render every row of large results in headless mode
    #[arg(long)]
    pub show_all: bool,

    /// Output format for headless mode
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub output: String,

    /// Save the database to this file after executing (headless mode)
    #[arg(long, value_name = "PATH")]
    pub save: Option<PathBuf>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::Config::default_path)
    }

    /// Returns true if headless mode is enabled.
    pub fn is_headless(&self) -> bool {
        self.headless
    }

    /// Parses the output format from the --output argument.
    pub fn parse_output_format(&self) -> std::result::Result<OutputFormat, String> {
        self.output.parse()
    }

    /// Validates argument combinations.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.headless {
            for (flag, set) in [
                ("--exec", self.exec.is_some()),
                ("--show-all", self.show_all),
                ("--save", self.save.is_some()),
            ] {
                if set {
                    return Err(format!("{flag} requires --headless"));
                }
            }
        }

        if self.threshold == Some(0) {
            return Err("--threshold must be greater than zero".to_string());
        }

        self.parse_output_format()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_args(args: &[&str]) -> Cli {
        Cli::parse_from(args)
    }

    #[test]
    fn test_parse_database_argument() {
        let cli = parse_args(&["query-console", "chinook.db"]);
        assert_eq!(cli.database, Some(PathBuf::from("chinook.db")));
        assert!(!cli.is_headless());
    }

    #[test]
    fn test_no_arguments() {
        let cli = parse_args(&["query-console"]);
        assert!(cli.database.is_none());
        assert!(cli.threshold.is_none());
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_parse_config_path() {
        let cli = parse_args(&["query-console", "--config", "/path/to/config.toml"]);
        assert_eq!(cli.config_path(), PathBuf::from("/path/to/config.toml"));
    }

    #[test]
    fn test_parse_threshold() {
        let cli = parse_args(&["query-console", "--threshold", "200"]);
        assert_eq!(cli.threshold, Some(200));

        let cli = parse_args(&["query-console", "-t", "10"]);
        assert_eq!(cli.threshold, Some(10));
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let cli = parse_args(&["query-console", "--threshold", "0"]);
        assert!(cli.validate().unwrap_err().contains("greater than zero"));
    }

    #[test]
    fn test_parse_headless_run() {
        let cli = parse_args(&[
            "query-console",
            "data.db",
            "--headless",
            "--exec",
            "SELECT 1",
            "--show-all",
            "--save",
            "out.db",
        ]);
        assert!(cli.is_headless());
        assert_eq!(cli.exec, Some("SELECT 1".to_string()));
        assert!(cli.show_all);
        assert_eq!(cli.save, Some(PathBuf::from("out.db")));
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_headless_flags_require_headless() {
        let cli = parse_args(&["query-console", "--exec", "SELECT 1"]);
        assert_eq!(cli.validate().unwrap_err(), "--exec requires --headless");

        let cli = parse_args(&["query-console", "--save", "out.db"]);
        assert_eq!(cli.validate().unwrap_err(), "--save requires --headless");
    }

    #[test]
    fn test_parse_output_format() {
        let cli = parse_args(&["query-console", "--output", "json"]);
        assert_eq!(cli.parse_output_format().unwrap(), OutputFormat::Json);

        let cli = parse_args(&["query-console", "--output", "TEXT"]);
        assert_eq!(cli.parse_output_format().unwrap(), OutputFormat::Text);

        let cli = parse_args(&["query-console", "--output", "csv"]);
        assert!(cli.parse_output_format().is_err());
        assert!(cli.validate().is_err());
    }
}
