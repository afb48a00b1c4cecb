pub mod shell;

use std::path::PathBuf;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Send one message and print the reply
    Ask {
        message: String,

        #[arg(short, long, default_value = "default")]
        scenario: String,

        /// Override the scenario's temperature
        #[arg(short, long)]
        temperature: Option<f32>,

        /// Print the reply as it is generated
        #[arg(long)]
        stream: bool,
    },

    /// List available scenarios
    Scenarios,

    /// Show one scenario including its system prompt
    Scenario { key: String },

    /// List models installed on the inference server
    Models,

    /// Check whether the inference server is reachable
    Status,

    /// Answer every line of a file (or stdin with `-`) in order
    Batch {
        file: PathBuf,

        #[arg(short, long, default_value = "default")]
        scenario: String,

        #[arg(short, long)]
        temperature: Option<f32>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the REST API server
    Serve {
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// Bind to 0.0.0.0 instead of 127.0.0.1, exposing the server on all network interfaces
        #[arg(long)]
        public: bool,
    },

    /// Start the web app backend (cookie-bound sessions)
    Web {
        #[arg(short, long, default_value = "5000")]
        port: u16,

        /// Bind to 0.0.0.0 instead of 127.0.0.1, exposing the server on all network interfaces
        #[arg(long)]
        public: bool,
    },

    /// Interactive chat shell
    Shell {
        #[arg(short, long, default_value = "default")]
        scenario: String,

        /// Start with conversation history enabled
        #[arg(long)]
        history: bool,
    },
}
