//! # WAF CLI
//!
//! Thin HTTP client for operating the `waf-api` configuration surface,
//! grounded in the teacher's `router-cli`: authenticate once per
//! invocation with username/password, then issue the requested
//! subcommand's request with the bearer token attached.

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "wafctl")]
#[command(about = "CLI tool for the multi-tenant WAF control plane", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Use credentials from WAF_USER/WAF_PASS environment variables.
    #[arg(long, global = true)]
    osenv: bool,

    #[arg(short, long, global = true)]
    user: Option<String>,

    #[arg(short, long, global = true)]
    pass: Option<String>,

    #[arg(long, global = true, default_value = "http://localhost:8080")]
    api_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List rules in the global store, or a route's store with --route.
    ListRules {
        #[arg(long)]
        route: Option<String>,
    },
    /// Create or update a rule from a JSON file.
    PutRule {
        #[arg(long)]
        route: Option<String>,
        #[arg(long)]
        file: PathBuf,
    },
    /// Delete a rule by id.
    DeleteRule {
        #[arg(long)]
        route: Option<String>,
        id: String,
    },
    /// List configured routes.
    ListRoutes,
    /// Create or update a route from a JSON file.
    PutRoute {
        #[arg(long)]
        file: PathBuf,
    },
    /// Delete a route by id.
    DeleteRoute { id: String },
    /// List configured error pages.
    ListErrorPages,
    /// Create or update an error page from a JSON file.
    PutErrorPage {
        #[arg(long)]
        file: PathBuf,
    },
    /// Send a synthetic request through the evaluation pipeline.
    Evaluate {
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Serialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let (username, password) = credentials(&cli)?;
    debug!("using API at {}", cli.api_url);

    let client = Client::new();
    let token = authenticate(&client, &cli.api_url, &username, &password)?;

    match &cli.command {
        Commands::ListRules { route } => list_rules(&client, &cli.api_url, &token, route.as_deref())?,
        Commands::PutRule { route, file } => put_rule(&client, &cli.api_url, &token, route.as_deref(), file)?,
        Commands::DeleteRule { route, id } => delete_rule(&client, &cli.api_url, &token, route.as_deref(), id)?,
        Commands::ListRoutes => list_routes(&client, &cli.api_url, &token)?,
        Commands::PutRoute { file } => put_route(&client, &cli.api_url, &token, file)?,
        Commands::DeleteRoute { id } => delete_route(&client, &cli.api_url, &token, id)?,
        Commands::ListErrorPages => list_error_pages(&client, &cli.api_url, &token)?,
        Commands::PutErrorPage { file } => put_error_page(&client, &cli.api_url, &token, file)?,
        Commands::Evaluate { file } => evaluate(&client, &cli.api_url, file)?,
    }

    Ok(())
}

fn credentials(cli: &Cli) -> Result<(String, String)> {
    if cli.osenv {
        let username = std::env::var("WAF_USER").context("WAF_USER environment variable not set")?;
        let password = std::env::var("WAF_PASS").context("WAF_PASS environment variable not set")?;
        Ok((username, password))
    } else if let (Some(user), Some(pass)) = (&cli.user, &cli.pass) {
        Ok((user.clone(), pass.clone()))
    } else {
        bail!("no credentials provided; use --osenv or --user/--pass");
    }
}

fn authenticate(client: &Client, base_url: &str, username: &str, password: &str) -> Result<String> {
    info!("authenticating as {username}");
    let response = client
        .post(format!("{base_url}/api/v1/users/login"))
        .json(&LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })
        .send()
        .context("failed to send login request")?;

    if !response.status().is_success() {
        bail!("login failed with status {}", response.status());
    }
    Ok(response.json::<LoginResponse>().context("failed to parse login response")?.token)
}

fn read_json_file(path: &PathBuf) -> Result<Value> {
    let mut file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    serde_json::from_str(&contents).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn rules_path(route: Option<&str>) -> String {
    match route {
        Some(route_id) => format!("routes/{route_id}/rules"),
        None => "global/rules".to_string(),
    }
}

fn list_rules(client: &Client, base_url: &str, token: &str, route: Option<&str>) -> Result<()> {
    let response = client
        .get(format!("{base_url}/api/v1/{}", rules_path(route)))
        .bearer_auth(token)
        .send()
        .context("failed to list rules")?;
    print_response(response)
}

fn put_rule(client: &Client, base_url: &str, token: &str, route: Option<&str>, file: &PathBuf) -> Result<()> {
    let body = read_json_file(file)?;
    let response = client
        .post(format!("{base_url}/api/v1/{}", rules_path(route)))
        .bearer_auth(token)
        .json(&body)
        .send()
        .context("failed to create or update rule")?;
    print_response(response)
}

fn delete_rule(client: &Client, base_url: &str, token: &str, route: Option<&str>, id: &str) -> Result<()> {
    let response = client
        .delete(format!("{base_url}/api/v1/{}/{id}", rules_path(route)))
        .bearer_auth(token)
        .send()
        .context("failed to delete rule")?;
    print_response(response)
}

fn list_routes(client: &Client, base_url: &str, token: &str) -> Result<()> {
    let response = client
        .get(format!("{base_url}/api/v1/routes"))
        .bearer_auth(token)
        .send()
        .context("failed to list routes")?;
    print_response(response)
}

fn put_route(client: &Client, base_url: &str, token: &str, file: &PathBuf) -> Result<()> {
    let body = read_json_file(file)?;
    let response = client
        .post(format!("{base_url}/api/v1/routes"))
        .bearer_auth(token)
        .json(&body)
        .send()
        .context("failed to create or update route")?;
    print_response(response)
}

fn delete_route(client: &Client, base_url: &str, token: &str, id: &str) -> Result<()> {
    let response = client
        .delete(format!("{base_url}/api/v1/routes/{id}"))
        .bearer_auth(token)
        .send()
        .context("failed to delete route")?;
    print_response(response)
}

fn list_error_pages(client: &Client, base_url: &str, token: &str) -> Result<()> {
    let response = client
        .get(format!("{base_url}/api/v1/global/error-pages"))
        .bearer_auth(token)
        .send()
        .context("failed to list error pages")?;
    print_response(response)
}

fn put_error_page(client: &Client, base_url: &str, token: &str, file: &PathBuf) -> Result<()> {
    let body = read_json_file(file)?;
    let response = client
        .post(format!("{base_url}/api/v1/global/error-pages"))
        .bearer_auth(token)
        .json(&body)
        .send()
        .context("failed to create or update error page")?;
    print_response(response)
}

/// Unlike the other subcommands, `evaluate` hits the unauthenticated
/// ingestion endpoint directly — it exercises the pipeline, not the
/// configuration API.
fn evaluate(client: &Client, base_url: &str, file: &PathBuf) -> Result<()> {
    let body = read_json_file(file)?;
    let response = client
        .post(format!("{base_url}/api/v1/ingress/evaluate"))
        .json(&body)
        .send()
        .context("failed to send evaluation request")?;
    println!("status: {}", response.status());
    for (name, value) in response.headers() {
        if name.as_str().starts_with("x-waf-") {
            println!("{name}: {}", value.to_str().unwrap_or(""));
        }
    }
    Ok(())
}

fn print_response(response: reqwest::blocking::Response) -> Result<()> {
    let status = response.status();
    let text = response.text().context("failed to read response body")?;
    if !status.is_success() {
        bail!("request failed with status {status}: {text}");
    }
    println!("{text}");
    Ok(())
}
