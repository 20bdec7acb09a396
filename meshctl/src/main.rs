mod client;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client::MeshClient;
use mesh_core::model::{Node, Notification};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "meshctl")]
#[command(about = "CLI for the Mesh Security Simulator API")]
struct Cli {
    /// Base URL of mesh-server
    #[arg(short, long, default_value = "http://localhost:5000")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List nodes with status and metrics
    Nodes,
    /// Add a healthy node with random metrics
    Add,
    /// Rename a node
    Rename { id: String, name: String },
    /// Inject a fault into a node (or the selected one)
    Fault { id: Option<String> },
    /// Restore the baseline nodes
    Reset,
    /// Select a node and print its log
    Select { id: String },
    /// Comment on a node, optionally suggesting an action
    Comment {
        node: String,
        content: String,
        #[arg(short, long, default_value = "")]
        user: String,
        #[arg(short, long, value_enum)]
        action: Option<Action>,
    },
    /// Approve a pending comment
    Approve { id: String },
    /// Reject a pending comment
    Reject { id: String },
    /// Show the notification log
    Notifications,
    /// Show nodes and mesh edges
    Topology,
    /// Start or pause the simulation
    Toggle,
}

#[derive(Clone, Copy, ValueEnum)]
enum Action {
    Isolate,
    Restore,
}

impl Action {
    fn as_str(&self) -> &'static str {
        match self {
            Action::Isolate => "isolate",
            Action::Restore => "restore",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = MeshClient::new(cli.server);

    match cli.command {
        Commands::Nodes => {
            let response = client.get("/nodes").await?;
            let nodes: Vec<Node> = serde_json::from_value(response["nodes"].clone())
                .context("Unexpected node list")?;
            print_nodes(&nodes);
        }
        Commands::Add => print_response(client.post("/nodes", None).await?),
        Commands::Rename { id, name } => {
            let response = client
                .put(&format!("/nodes/{}/name", id), json!({ "name": name }))
                .await?;
            print_response(response);
        }
        Commands::Fault { id } => {
            let path = match id {
                Some(id) => format!("/nodes/{}/fault", id),
                None => "/fault".to_string(),
            };
            print_response(client.post(&path, None).await?);
        }
        Commands::Reset => print_response(client.post("/reset", None).await?),
        Commands::Select { id } => {
            let response = client.post(&format!("/select/{}", id), None).await?;
            match response["logOutput"].as_str() {
                Some(log) => println!("{}", log),
                None => print_response(response),
            }
        }
        Commands::Comment {
            node,
            content,
            user,
            action,
        } => {
            let body = json!({
                "userName": user,
                "content": content,
                "action": action.map(|a| a.as_str()),
            });
            let response = client
                .post(&format!("/nodes/{}/comments", node), Some(body))
                .await?;
            print_response(response);
        }
        Commands::Approve { id } => {
            print_response(client.post(&format!("/comments/{}/approve", id), None).await?)
        }
        Commands::Reject { id } => {
            print_response(client.post(&format!("/comments/{}/reject", id), None).await?)
        }
        Commands::Notifications => {
            let response = client.get("/notifications").await?;
            let notifications: Vec<Notification> =
                serde_json::from_value(response["notifications"].clone())
                    .context("Unexpected notification list")?;
            for n in notifications {
                println!(
                    "{} [{:?}] {}: {}",
                    n.timestamp().format("%H:%M:%S"),
                    n.severity(),
                    n.title(),
                    n.message()
                );
            }
        }
        Commands::Topology => print_response(client.get("/topology").await?),
        Commands::Toggle => print_response(client.post("/simulation/toggle", None).await?),
    }

    Ok(())
}

fn print_nodes(nodes: &[Node]) {
    println!(
        "{:<6} | {:<20} | {:<12} | {:>8} | {:>6} | {:>7}",
        "ID", "NAME", "STATUS", "LATENCY", "USAGE", "ANOMALY"
    );
    println!("{:-<6}-+-{:-<20}-+-{:-<12}-+-{:->8}-+-{:->6}-+-{:->7}", "", "", "", "", "", "");
    for node in nodes {
        let m = node.metrics();
        println!(
            "{:<6} | {:<20} | {:<12} | {:>8.1} | {:>6.2} | {:>7.2}",
            node.id().as_str(),
            node.label(),
            node.status().as_str(),
            m.latency,
            m.resource_usage,
            m.anomaly_score
        );
    }
}

fn print_response(resp: Value) {
    match resp["status"].as_str() {
        Some("ERROR") => eprintln!("ERROR: {}", resp["msg"].as_str().unwrap_or("unknown")),
        _ => match resp["msg"].as_str() {
            Some(msg) => println!("SUCCESS: {}", msg),
            None => match serde_json::to_string_pretty(&resp) {
                Ok(text) => println!("{}", text),
                Err(_) => println!("{}", resp),
            },
        },
    }
}
