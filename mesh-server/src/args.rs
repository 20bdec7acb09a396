use clap::Parser;
use mesh_core::config::MeshConfig;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Mesh security simulator API server", long_about = None)]
pub struct Args {
    /// Configuration file (TOML). Defaults to ./mesh.toml when present.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Port to listen on, overriding the configuration.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Base URL of the log collaborator, overriding the configuration.
    #[arg(long)]
    pub log_source_url: Option<String>,
}

impl Args {
    /// Applies command-line overrides on top of the loaded configuration.
    ///
    /// The log collaborator is served by this process by default, so a
    /// default log source URL follows the port actually listened on.
    pub fn apply(self, config: &mut MeshConfig) {
        let default_url = MeshConfig::default().log_source_url;

        if let Some(port) = self.port {
            config.server_port = port;
        }
        if config.log_source_url == default_url {
            config.log_source_url = format!("http://localhost:{}", config.server_port);
        }
        if let Some(url) = self.log_source_url {
            config.log_source_url = url;
        }
    }
}
