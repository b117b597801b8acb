//! Public URL derivation

use platform_models::Environment;

/// Domain under which every deployed server is published
pub const DOMAIN_SUFFIX: &str = "mcp.dev";

/// Derive the public URL of a server
///
/// Every character outside `[a-z0-9]` of the lowercased name becomes `-`;
/// non-production environments are prefixed.
pub fn derive_endpoint(name: &str, environment: Environment) -> String {
    let subdomain: String = name
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                '-'
            }
        })
        .collect();

    match environment {
        Environment::Production => format!("https://{}.{}", subdomain, DOMAIN_SUFFIX),
        other => format!("https://{}-{}.{}", other.as_str(), subdomain, DOMAIN_SUFFIX),
    }
}
