// Subcommand handlers. Each one sends its requests through a `Session` and
// reports whether every reply succeeded; main.rs turns that into the exit code.

pub mod admin;
pub mod query;
pub mod replay;
pub mod walk;

use anyhow::Result;
use walkgraph_cli::client::Client;
use walkgraph_cli::output::{render, OutputFormat};
use walkgraph_cli::terminal::ColorPalette;
use walkgraph_service_shared::{Request, Response};

/// A connected client plus the chosen presentation.
pub struct Session {
    pub client: Client,
    pub format: OutputFormat,
    pub palette: ColorPalette,
}

impl Session {
    /// Send `request`, print the reply and return whether it succeeded.
    ///
    /// Failed replies go to stderr in text mode; JSON output keeps every
    /// reply on stdout so it can be piped.
    pub async fn execute(&mut self, request: &Request) -> Result<bool> {
        let response = self.client.send(request).await?;
        self.print(&response);
        Ok(response.is_ok())
    }

    fn print(&self, response: &Response) {
        let line = render(response, self.format, &self.palette);
        if response.is_ok() || self.format == OutputFormat::Json {
            println!("{line}");
        } else {
            eprintln!("{line}");
        }
    }
}
