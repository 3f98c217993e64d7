//! RouteKit CLI - probe registered routes from the terminal
//!
//! Usage:
//!   routekit list --routes routes.json [--query api] [--stats]
//!   routekit show item-detail --routes routes.json
//!   routekit probe item-detail --routes routes.json --base https://example.com \
//!       -p pk=7 -X GET -H 'Accept: application/json' --bearer abc123

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args as ClapArgs, Parser, Subcommand};

use routekit::{
    AuthSpec, ExecutionRequest, Method, Probe, ProbeOutcome, RouteDescriptor, RouteTable,
    SecurityConfig,
};

/// RouteKit - route table browser with guarded request execution
#[derive(Parser, Debug)]
#[command(name = "routekit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Route table JSON file
    #[arg(long, global = true, default_value = "routes.json")]
    routes: PathBuf,

    /// Security configuration JSON file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List routes, optionally filtered by a search query
    List {
        /// Case-insensitive search over pattern, name, and view
        #[arg(long)]
        query: Option<String>,

        /// Print summary counts instead of the listing
        #[arg(long)]
        stats: bool,
    },
    /// Show one route: pattern, methods, parameters
    Show {
        /// Route name (optionally namespaced) or exact pattern
        selector: String,
    },
    /// Execute a probe request against a route
    Probe(ProbeArgs),
}

#[derive(ClapArgs, Debug)]
struct ProbeArgs {
    /// Route name (optionally namespaced) or exact pattern
    selector: String,

    /// Target base URL (scheme + host), e.g. https://api.example.com
    #[arg(long)]
    base: String,

    /// Path parameter binding, repeatable: -p name=value
    #[arg(short = 'p', long = "param")]
    params: Vec<String>,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    /// Extra header, repeatable: -H 'Name: value'
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Request body (sent for POST/PUT/PATCH only)
    #[arg(short = 'd', long)]
    data: Option<String>,

    /// Bearer token auth
    #[arg(long, conflicts_with_all = ["token", "basic", "session"])]
    bearer: Option<String>,

    /// Token-scheme auth
    #[arg(long, conflicts_with_all = ["basic", "session"])]
    token: Option<String>,

    /// Basic auth as user:password
    #[arg(long, conflicts_with = "session")]
    basic: Option<String>,

    /// Session cookie id
    #[arg(long)]
    session: Option<String>,

    /// Print the curl equivalent without sending anything
    #[arg(long)]
    curl_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            SecurityConfig::from_json(&text)?
        }
        None => SecurityConfig::default(),
    };

    let text = std::fs::read_to_string(&cli.routes)
        .with_context(|| format!("failed to read route table: {}", cli.routes.display()))?;
    let table = RouteTable::from_json(&text)?;

    let probe = Probe::builder().routes(table).config(config).build()?;

    match cli.command {
        Command::List { query, stats } => list(&probe, query.as_deref(), stats),
        Command::Show { selector } => show(&probe, &selector),
        Command::Probe(args) => run_probe(&probe, args).await,
    }
}

fn list(probe: &Probe, query: Option<&str>, stats: bool) -> Result<()> {
    let routes = probe.routes();

    if stats {
        let table = RouteTable::from_routes(routes);
        let stats = table.stats();
        println!("routes:     {}", stats.total);
        println!("named:      {}", stats.named);
        println!("namespaces: {}", stats.namespaces.join(", "));
        return Ok(());
    }

    let query = query.map(str::to_lowercase);
    for route in routes {
        if let Some(q) = &query {
            let hit = route.pattern().to_lowercase().contains(q)
                || route
                    .full_name()
                    .is_some_and(|n| n.to_lowercase().contains(q))
                || route.view().is_some_and(|v| v.to_lowercase().contains(q));
            if !hit {
                continue;
            }
        }
        print_route_line(&route);
    }
    Ok(())
}

fn print_route_line(route: &RouteDescriptor) {
    let methods = route
        .methods()
        .iter()
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(",");
    match route.full_name() {
        Some(name) => println!("{:<40} {:<20} [{}]", route.pattern(), name, methods),
        None => println!("{:<40} {:<20} [{}]", route.pattern(), "-", methods),
    }
}

fn show(probe: &Probe, selector: &str) -> Result<()> {
    let Some(route) = probe.find_route(selector) else {
        bail!("no such route: {selector}");
    };

    println!("pattern:   {}", route.pattern());
    if let Some(name) = route.full_name() {
        println!("name:      {name}");
    }
    if let Some(view) = route.view() {
        println!("view:      {view}");
    }
    let methods = route
        .methods()
        .iter()
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    println!("methods:   {methods}");
    if route.params().is_empty() {
        println!("params:    (none)");
    } else {
        println!("params:");
        for param in route.params() {
            println!("  {:<16} {}", param.name(), param.ty().name());
        }
    }
    Ok(())
}

async fn run_probe(probe: &Probe, args: ProbeArgs) -> Result<()> {
    let bindings = parse_bindings(&args.params)?;
    let url = probe.resolve_url(&args.selector, &bindings, &args.base)?;

    let method: Method = args.method.parse()?;
    let mut request = ExecutionRequest::new(method, url).auth(parse_auth(&args)?);
    for header in &args.headers {
        let (name, value) = header
            .split_once(':')
            .with_context(|| format!("malformed header (want 'Name: value'): {header}"))?;
        request = request.header(name.trim(), value.trim());
    }
    if let Some(data) = args.data {
        request = request.body(data);
    }

    if args.curl_only {
        println!("{}", routekit::curl_command(&request));
        return Ok(());
    }

    let report = probe.run(&request).await;
    match report.outcome {
        ProbeOutcome::Response(result) => {
            println!("{} {}", result.status, result.status_text);
            println!("elapsed: {} ms", result.elapsed.as_millis());
            for (name, value) in &result.headers {
                println!("{name}: {value}");
            }
            println!();
            println!("{}", result.body_display());
        }
        ProbeOutcome::Failed { kind, message } => {
            eprintln!("probe failed ({kind}): {message}");
        }
    }
    println!();
    println!("curl equivalent:");
    println!("{}", report.curl);
    Ok(())
}

fn parse_bindings(params: &[String]) -> Result<HashMap<String, String>> {
    let mut bindings = HashMap::new();
    for param in params {
        let (name, value) = param
            .split_once('=')
            .with_context(|| format!("malformed binding (want name=value): {param}"))?;
        bindings.insert(name.to_string(), value.to_string());
    }
    Ok(bindings)
}

fn parse_auth(args: &ProbeArgs) -> Result<AuthSpec> {
    if let Some(token) = &args.bearer {
        return Ok(AuthSpec::Bearer {
            token: token.clone(),
        });
    }
    if let Some(token) = &args.token {
        return Ok(AuthSpec::Token {
            token: token.clone(),
        });
    }
    if let Some(basic) = &args.basic {
        let (username, password) = basic
            .split_once(':')
            .context("malformed --basic (want user:password)")?;
        return Ok(AuthSpec::Basic {
            username: username.to_string(),
            password: password.to_string(),
        });
    }
    if let Some(session_id) = &args.session {
        return Ok(AuthSpec::Session {
            session_id: session_id.clone(),
        });
    }
    Ok(AuthSpec::None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings_parse_name_value_pairs() {
        let bindings = parse_bindings(&["pk=7".to_string(), "slug=a-b".to_string()]).unwrap();
        assert_eq!(bindings["pk"], "7");
        assert_eq!(bindings["slug"], "a-b");
    }

    #[test]
    fn malformed_binding_is_an_error() {
        assert!(parse_bindings(&["justvalue".to_string()]).is_err());
    }

    #[test]
    fn binding_value_may_contain_equals() {
        let bindings = parse_bindings(&["q=a=b".to_string()]).unwrap();
        assert_eq!(bindings["q"], "a=b");
    }
}
