//! `edgeroute` command-line entrypoint.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use edgeroute::actions::RouteResponse;
use edgeroute::catalog::{builtin_tools, load_tools};
use edgeroute::{HybridRouter, Message, RouterConfig, ToolSpec};

/// Utterances exercised by `edgeroute demo`.
const SAMPLE_QUERIES: &[&str] = &[
    "What is the weather in San Francisco?",
    "Set an alarm for 10 AM.",
    "Send a message to Alice saying good morning.",
    "Find Bob in my contacts and text him saying the meeting moved to 3 PM.",
    "Play some jazz music.",
    "Set a timer for 5 minutes.",
    "Remind me about the meeting at 3:00 PM.",
];

#[derive(Parser, Debug)]
#[command(name = "edgeroute")]
#[command(author, version, long_about = None)]
#[command(about = "Route utterances to tool calls, on-device first")]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Route one utterance and print the result
    Route {
        /// The utterance to route
        #[arg(required = true)]
        utterance: Vec<String>,

        /// Print the flat JSON response
        #[arg(long)]
        json: bool,

        /// Override the model-accept threshold for this request
        #[arg(long)]
        threshold: Option<f64>,

        /// JSON tool catalog (defaults to the built-in assistant tools)
        #[arg(long)]
        tools: Option<PathBuf>,
    },
    /// Route the sample queries and print a latency breakdown
    Demo {
        #[arg(short, long)]
        verbose: bool,
    },
    /// List the tool catalog
    Tools {
        #[arg(long)]
        tools: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("edgeroute=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = RouterConfig::load_or_default(cli.config.as_deref())
        .context("failed to load router config")?;

    match cli.command {
        Commands::Route {
            utterance,
            json,
            threshold,
            tools,
        } => {
            let router = HybridRouter::from_config(&config)?;
            let tools = resolve_tools(tools.as_deref())?;
            run_route(&router, &tools, &utterance.join(" "), json, threshold).await
        }
        Commands::Demo { verbose } => {
            let router = HybridRouter::from_config(&config)?;
            run_demo(&router, &builtin_tools(), verbose).await;
            Ok(())
        }
        Commands::Tools { tools } => {
            print_tools(&resolve_tools(tools.as_deref())?);
            Ok(())
        }
    }
}

fn resolve_tools(path: Option<&Path>) -> anyhow::Result<Vec<ToolSpec>> {
    match path {
        Some(path) => load_tools(path)
            .with_context(|| format!("failed to load tool catalog {}", path.display())),
        None => Ok(builtin_tools()),
    }
}

async fn run_route(
    router: &HybridRouter,
    tools: &[ToolSpec],
    utterance: &str,
    json: bool,
    threshold: Option<f64>,
) -> anyhow::Result<()> {
    let transcript = utterance.trim();
    let result = router
        .route(&[Message::user(transcript)], tools, threshold)
        .await;
    let mut response = RouteResponse::from_result(transcript, result);
    if transcript.is_empty() {
        response = response.with_warning("Nothing to route. Please type a request.");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_response(&response);
    }
    Ok(())
}

fn print_response(response: &RouteResponse) {
    println!("Transcript: {}", response.transcript);
    println!("Source:     {}", response.source);
    println!("Confidence: {:.4}", response.confidence);
    println!("Calls:      {}", response.function_calls.len());
    for call in &response.function_calls {
        println!(
            "  - {}({})",
            call.name,
            serde_json::Value::Object(call.arguments.clone())
        );
    }
    for action in &response.actions {
        println!("  > {action}");
    }
    println!("Assistant:  {}", response.assistant_response);
}

async fn run_demo(router: &HybridRouter, tools: &[ToolSpec], verbose: bool) {
    println!(
        "Simulating {} queries (model: {}, cloud: {})",
        SAMPLE_QUERIES.len(),
        if router.has_model() { "on" } else { "off" },
        if router.has_cloud() { "on" } else { "off" },
    );

    let mut routed = 0;
    let mut total_ms = 0.0;
    for (i, query) in SAMPLE_QUERIES.iter().enumerate() {
        println!("\n[{}/{}] {}", i + 1, SAMPLE_QUERIES.len(), query);

        let result = router.route(&[Message::user(*query)], tools, None).await;
        let routing_ms = result.total_time_ms;

        let started = Instant::now();
        let response = RouteResponse::from_result(query, result);
        let execution_ms = started.elapsed().as_secs_f64() * 1000.0;

        print_response(&response);
        println!("Latency:    routing {routing_ms:.1}ms + execution {execution_ms:.1}ms");
        if verbose {
            println!(
                "Stage:      {} (on-device: {})",
                response.source,
                response.source.is_on_device()
            );
        }

        if !response.function_calls.is_empty() {
            routed += 1;
        }
        total_ms += routing_ms + execution_ms;
    }

    println!("\nRouted {routed}/{} queries", SAMPLE_QUERIES.len());
    println!("Avg latency: {:.1}ms", total_ms / SAMPLE_QUERIES.len() as f64);
}

fn print_tools(tools: &[ToolSpec]) {
    for tool in tools {
        println!("{}: {}", tool.name, tool.description);
        for (name, param) in &tool.parameters.properties {
            let required = if tool.parameters.required.contains(name) {
                " (required)"
            } else {
                ""
            };
            println!("    {name}: {:?}{required}  {}", param.kind, param.description);
        }
    }
}
