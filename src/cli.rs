use clap::{Parser, Subcommand};

/// Canteen — token counter service with AI menu suggestions
#[derive(Parser)]
#[command(name = "canteen", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind (defaults to CANTEEN_PORT, then 8080)
        #[arg(short, long)]
        port: Option<u16>,

        /// Load the sample counter orders at startup
        #[arg(long)]
        seed_demo: bool,
    },

    /// Ask the configured model for item suggestions and print them
    Suggest {
        /// Pretend the local hour is this value (0-23)
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..24))]
        hour: Option<u32>,

        /// Override the weekday name (e.g. Friday)
        #[arg(long)]
        day: Option<String>,
    },
}
