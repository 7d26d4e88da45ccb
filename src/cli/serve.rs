use anyhow::Result;
use colored::Colorize;

use crate::core::config::WingmanConfig;
use crate::core::style;
use crate::server;

pub async fn run(mut config: WingmanConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    eprintln!(
        "{} {}",
        "wingman:".bold().cyan(),
        format!("serving on http://{}", config.bind_address()).bold()
    );
    eprintln!(
        "{}",
        style::summary_line(
            "Default model",
            &format!("{}/{}", config.model.provider, config.model.model)
        )
    );
    eprintln!("{}", style::summary_line("Ollama", &config.ollama.base_url));
    eprintln!("{}", style::hint("  Press Ctrl-C to stop."));

    server::serve(&config).await
}
