//! Service synthesis
//!
//! Turns a server record into the source of an Express service: rate
//! limiter, the selected authentication middleware, health and usage routes,
//! one mock route per endpoint and an error fallback.

pub mod builder;
pub mod endpoint;
pub mod escape;
pub mod handlers;
pub mod middleware;
pub mod templates;

use askama::Template;
use chrono::SecondsFormat;
use platform_models::{GenerationResult, ServerRecord};
use thiserror::Error;
use tracing::{debug, warn};

use crate::spec::extract_endpoints;
use builder::{SectionKind, SourceBuilder};
use escape::js_single_quoted;
use middleware::AuthVariant;
use templates::{ErrorsTemplate, HealthTemplate, ListenTemplate, PreludeTemplate, UsageTemplate};

pub use endpoint::{derive_endpoint, DOMAIN_SUFFIX};

pub const INVALID_SPEC_ERROR: &str = "Invalid OpenAPI specification";

/// Errors raised while synthesizing source
#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),

    #[error("mock payload serialization failed: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Generate the service source and public endpoint of a server
///
/// Never fails outright: problems are reported through the result.
/// Output depends only on the record, so repeated calls are byte-identical.
pub fn generate_server(server: &ServerRecord) -> GenerationResult {
    let has_paths = server
        .open_api_spec
        .get("paths")
        .is_some_and(|paths| paths.is_object());
    if !has_paths {
        return GenerationResult::failed(INVALID_SPEC_ERROR);
    }

    match synthesize(server) {
        Ok(code) => {
            debug!(server_id = %server.id, bytes = code.len(), "Generated service source");
            GenerationResult::generated(code, derive_endpoint(&server.name, server.environment))
        }
        Err(e) => {
            warn!(server_id = %server.id, "Code generation failed: {}", e);
            GenerationResult::failed(e.to_string())
        }
    }
}

/// Assemble the source sections of a server
pub fn build_source(server: &ServerRecord) -> Result<SourceBuilder, CodegenError> {
    let doc = &server.open_api_spec;
    let endpoints = extract_endpoints(doc);
    let generated_at = server
        .created_at
        .to_rfc3339_opts(SecondsFormat::Millis, true);
    let server_name = js_single_quoted(&server.name);
    let uptime = js_single_quoted(&server.uptime);

    let mut source = SourceBuilder::new();
    source
        .section(SectionKind::Prelude)
        .fragment(PreludeTemplate.render()?);
    source
        .section(SectionKind::RateLimit)
        .fragment(middleware::rate_limit(server.rate_limit)?);
    source
        .section(SectionKind::Auth)
        .fragment(AuthVariant::for_scheme(server.authentication).render()?);
    source.section(SectionKind::Health).fragment(
        HealthTemplate {
            server_name: &server_name,
            environment: server.environment.as_str(),
        }
        .render()?,
    );
    source.section(SectionKind::Usage).fragment(
        UsageTemplate {
            request_count: server.request_count,
            uptime: &uptime,
        }
        .render()?,
    );

    let routes = source.section(SectionKind::Handlers);
    for endpoint in &endpoints {
        routes.fragment(handlers::render_handler(doc, endpoint, &generated_at)?);
    }

    source
        .section(SectionKind::Errors)
        .fragment(ErrorsTemplate.render()?);
    source.section(SectionKind::Listen).fragment(
        ListenTemplate {
            server_name: &server_name,
        }
        .render()?,
    );

    Ok(source)
}

fn synthesize(server: &ServerRecord) -> Result<String, CodegenError> {
    Ok(build_source(server)?.build())
}
