//! Configuration and CLI argument handling

use clap::Parser;

use crate::state::DurationFields;

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "hourglass-timer")]
#[command(about = "A countdown timer engine with an HTTP control surface")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Initial countdown hours
    #[arg(long, default_value = "0", value_parser = clap::value_parser!(u32).range(0..=99))]
    pub hours: u32,

    /// Initial countdown minutes
    #[arg(long, default_value = "0", value_parser = clap::value_parser!(u32).range(0..=60))]
    pub minutes: u32,

    /// Initial countdown seconds
    #[arg(long, default_value = "6", value_parser = clap::value_parser!(u32).range(0..=60))]
    pub seconds: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Initial countdown length, `None` if any component is out of range
    pub fn initial_duration(&self) -> Option<DurationFields> {
        DurationFields::new(self.hours, self.minutes, self.seconds)
    }
}
