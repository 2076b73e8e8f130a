//! CLI command implementations

use std::fmt::Write as _;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Subcommand;
use smotrelka_core::SmotrelkaConfig;
use smotrelka_search::consolidation::{display_label, extract_identifiers};
use smotrelka_search::registry::category_label;
use smotrelka_search::{
    EnrichedRecord, ProviderKey, SearchRequest, SearchResponse, SearchService, StaticBackend,
};
use tracing::info;

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Search the catalog and print consolidated titles
    Search {
        /// Query words
        #[arg(required = true)]
        query: Vec<String>,
        /// Titles per page
        #[arg(short, long)]
        limit: Option<usize>,
        /// Titles to skip
        #[arg(short, long)]
        offset: Option<usize>,
        /// Only rows from this provider (repeatable)
        #[arg(long = "provider")]
        providers: Vec<String>,
        /// Only rows in this category (repeatable)
        #[arg(long = "category")]
        categories: Vec<String>,
        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
        /// Serve rows from a JSON fixture instead of Meilisearch
        #[arg(long)]
        fixture: Option<PathBuf>,
    },
    /// Start the JSON API server
    Server {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
        /// Serve rows from a JSON fixture instead of Meilisearch
        #[arg(long)]
        fixture: Option<PathBuf>,
    },
}

/// Handle the CLI command
///
/// # Errors
/// Returns the error of the command that failed
pub async fn handle_command(command: Commands) -> anyhow::Result<()> {
    let config = SmotrelkaConfig::from_env();

    match command {
        Commands::Search {
            query,
            limit,
            offset,
            providers,
            categories,
            json,
            fixture,
        } => {
            let mut request = SearchRequest::new(query.join(" "))
                .with_providers(providers)
                .with_categories(categories);
            request.limit = limit;
            request.offset = offset;
            run_search(&config, request, json, fixture.as_deref()).await
        }
        Commands::Server {
            host,
            port,
            fixture,
        } => start_server(config, host, port, fixture.as_deref()).await,
    }
}

/// Builds the search service, from a fixture file or the configured backend.
async fn build_service(config: &SmotrelkaConfig, fixture: Option<&Path>) -> anyhow::Result<SearchService> {
    match fixture {
        Some(path) => {
            let backend = StaticBackend::from_file(path).await?;
            info!("Serving {} fixture rows from {}", backend.len(), path.display());
            Ok(SearchService::new(Arc::new(backend), config.search.clone()))
        }
        None => {
            config.validate()?;
            Ok(SearchService::from_config(config)?)
        }
    }
}

/// Run one search and print the result
///
/// # Errors
/// - Configuration is invalid or the fixture cannot be loaded
/// - The search backend fails
pub async fn run_search(
    config: &SmotrelkaConfig,
    request: SearchRequest,
    json: bool,
    fixture: Option<&Path>,
) -> anyhow::Result<()> {
    let service = build_service(config, fixture).await?;
    let response = service
        .search(&request)
        .await
        .with_context(|| format!("search for '{}' failed", request.query))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print!("{}", render_response(&response));
    }

    Ok(())
}

/// Start the web server for API access
///
/// # Errors
/// - Host/port do not form a valid address
/// - The server fails to bind or stops with an error
pub async fn start_server(
    mut config: SmotrelkaConfig,
    host: Option<String>,
    port: Option<u16>,
    fixture: Option<&Path>,
) -> anyhow::Result<()> {
    config.server.bind_address = bind_address(config.server.bind_address, host.as_deref(), port)?;

    let service = build_service(&config, fixture).await?;

    println!("Starting Smotrelka API server...");
    println!("Search: http://{}/api/search?q=...", config.server.bind_address);
    println!("Providers: http://{}/api/providers", config.server.bind_address);
    println!();
    println!("Press Ctrl+C to stop the server");

    smotrelka_web::run_server(&config.server, service).await?;
    Ok(())
}

fn bind_address(current: SocketAddr, host: Option<&str>, port: Option<u16>) -> anyhow::Result<SocketAddr> {
    let host = host.map_or_else(|| current.ip().to_string(), str::to_string);
    let port = port.unwrap_or(current.port());
    format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid bind address {host}:{port}"))
}

/// Human-readable listing of a search response.
fn render_response(response: &SearchResponse) -> String {
    let mut out = String::new();

    if response.hits.is_empty() {
        out.push_str("No titles found.\n");
        return out;
    }

    for record in &response.hits {
        out.push_str(&render_record(record));
    }

    let total = response.estimated_total_hits.unwrap_or(response.hits.len());
    let _ = writeln!(out, "{:-<60}", "");
    let _ = writeln!(
        out,
        "{} of ~{} titles{}",
        response.hits.len(),
        total,
        if response.has_more { ", more available" } else { "" }
    );
    out
}

fn render_record(record: &EnrichedRecord) -> String {
    let mut out = String::new();
    let category = record.hit.category.as_deref();
    let category_name = category.map_or("unknown", |c| category_label(c).unwrap_or(c));
    let _ = writeln!(out, "{} [{}]", display_label(&record.hit), category_name);

    let sources: Vec<String> = extract_identifiers(&record.hit)
        .iter()
        .map(|(registry, id)| registry.source_url(id, category))
        .collect();
    if !sources.is_empty() {
        let _ = writeln!(out, "  {:<8} {}", "sources", sources.join(" "));
    }

    for provider in record.provider_ids.available_providers() {
        let ids: Vec<String> = record
            .provider_ids
            .iter()
            .filter(|(key, _, _)| *key == provider)
            .flat_map(|(_, registry, entries)| {
                entries
                    .iter()
                    .map(move |entry| format!("{registry}={}", entry.id))
            })
            .collect();
        let _ = writeln!(out, "  {:<8} {}", provider.label(), ids.join(" "));
    }

    let others = unplayable_providers(record);
    if !others.is_empty() {
        let _ = writeln!(out, "  (no usable ids for: {})", others.join(", "));
    }
    out
}

/// Providers that listed identifiers but accept none of them as lookup keys.
fn unplayable_providers(record: &EnrichedRecord) -> Vec<&'static str> {
    let available = record.provider_ids.available_providers();
    ProviderKey::ALL
        .into_iter()
        .filter(|provider| !available.contains(provider))
        .filter(|&provider| record.provider_ids.iter().any(|(key, _, _)| key == provider))
        .map(ProviderKey::label)
        .collect()
}

#[cfg(test)]
mod tests {
    use smotrelka_search::{RawHit, SourceRegistry, consolidate};

    use super::*;

    fn heat() -> Vec<RawHit> {
        vec![
            RawHit {
                id: 1,
                title_en: Some("Heat".to_string()),
                year: Some(1995),
                category: Some("movie".to_string()),
                provider: Some("lumex".to_string()),
                ..Default::default()
            }
            .with_identifier(SourceRegistry::Kinopoisk, 409),
            RawHit {
                id: 2,
                title_en: Some("Heat".to_string()),
                provider: Some("flixcdn".to_string()),
                ..Default::default()
            }
            .with_identifier(SourceRegistry::Shikimori, 7)
            .with_identifier(SourceRegistry::Kinopoisk, "409"),
        ]
    }

    #[test]
    fn test_render_record() {
        let records = consolidate(heat());
        let rendered = render_record(&records[0]);

        assert!(rendered.starts_with("Heat (1995) [Фильм]\n"));
        assert!(rendered.contains("sources  https://www.kinopoisk.ru/film/409/\n"));
        assert!(rendered.contains("FlixCDN  kinopoisk=409 shikimori=7"));
        assert!(rendered.contains("Lumex    kinopoisk=409"));
    }

    #[test]
    fn test_render_empty_response() {
        assert_eq!(render_response(&SearchResponse::empty()), "No titles found.\n");
    }

    #[test]
    fn test_bind_address() {
        let current: SocketAddr = "127.0.0.1:3000".parse().unwrap();

        assert_eq!(bind_address(current, None, None).unwrap(), current);
        assert_eq!(
            bind_address(current, Some("0.0.0.0"), Some(8080)).unwrap(),
            "0.0.0.0:8080".parse::<SocketAddr>().unwrap()
        );
        assert!(bind_address(current, Some("not a host"), None).is_err());
    }

    #[tokio::test]
    async fn test_build_service_reports_missing_fixture() {
        let config = SmotrelkaConfig::for_testing();
        let result = build_service(&config, Some(Path::new("/no/such/fixture.json"))).await;
        assert!(result.is_err());
    }
}
