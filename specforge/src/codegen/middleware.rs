//! Rate limit and authentication middleware variants

use askama::Template;
use platform_models::AuthScheme;

use crate::codegen::templates::{
    ApiKeyAuthTemplate, BasicAuthTemplate, BearerAuthTemplate, PassThroughAuthTemplate,
    RateLimitTemplate,
};
use crate::codegen::CodegenError;

/// Rate limit window of the synthesized service
pub const RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Render the rate limiter allowing `max` requests per window
pub fn rate_limit(max: u32) -> Result<String, CodegenError> {
    let fragment = RateLimitTemplate {
        window_secs: RATE_LIMIT_WINDOW_SECS,
        max,
    }
    .render()?;
    Ok(fragment)
}

/// Authentication middleware emitted as `authenticateToken`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthVariant {
    /// `X-API-Key` or bearer-style header against `API_KEY`
    ApiKey,

    /// `Authorization: Bearer` against `BEARER_TOKEN`
    Bearer,

    /// HTTP Basic against `BASIC_AUTH_USER` / `BASIC_AUTH_PASS`
    Basic,

    PassThrough,
}

impl AuthVariant {
    pub fn for_scheme(scheme: AuthScheme) -> Self {
        match scheme {
            AuthScheme::ApiKey => AuthVariant::ApiKey,
            AuthScheme::BearerToken => AuthVariant::Bearer,
            AuthScheme::BasicAuth => AuthVariant::Basic,
            AuthScheme::None => AuthVariant::PassThrough,
        }
    }

    /// Whether requests can be rejected with 401/403
    pub fn is_enforcing(&self) -> bool {
        !matches!(self, AuthVariant::PassThrough)
    }

    pub fn render(&self) -> Result<String, CodegenError> {
        let fragment = match self {
            AuthVariant::ApiKey => ApiKeyAuthTemplate.render()?,
            AuthVariant::Bearer => BearerAuthTemplate.render()?,
            AuthVariant::Basic => BasicAuthTemplate.render()?,
            AuthVariant::PassThrough => PassThroughAuthTemplate.render()?,
        };
        Ok(fragment)
    }
}
