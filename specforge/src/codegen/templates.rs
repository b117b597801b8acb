//! Section templates of the synthesized service

use askama::Template;

#[derive(Template)]
#[template(path = "service/prelude.js", escape = "none")]
pub struct PreludeTemplate;

#[derive(Template)]
#[template(path = "service/rate_limit.js", escape = "none")]
pub struct RateLimitTemplate {
    pub window_secs: u64,
    pub max: u32,
}

#[derive(Template)]
#[template(path = "service/auth_api_key.js", escape = "none")]
pub struct ApiKeyAuthTemplate;

#[derive(Template)]
#[template(path = "service/auth_bearer_token.js", escape = "none")]
pub struct BearerAuthTemplate;

#[derive(Template)]
#[template(path = "service/auth_basic.js", escape = "none")]
pub struct BasicAuthTemplate;

#[derive(Template)]
#[template(path = "service/auth_none.js", escape = "none")]
pub struct PassThroughAuthTemplate;

/// Unauthenticated `/health` route
#[derive(Template)]
#[template(path = "service/health.js", escape = "none")]
pub struct HealthTemplate<'a> {
    pub server_name: &'a str,
    pub environment: &'a str,
}

/// Authenticated `/usage` route
#[derive(Template)]
#[template(path = "service/usage.js", escape = "none")]
pub struct UsageTemplate<'a> {
    pub request_count: u64,
    pub uptime: &'a str,
}

/// One mock route per endpoint
#[derive(Template)]
#[template(path = "service/handler.js", escape = "none")]
pub struct HandlerTemplate<'a> {
    pub comment: &'a str,
    pub method: &'a str,
    pub route: &'a str,
    pub payload: &'a str,
}

#[derive(Template)]
#[template(path = "service/errors.js", escape = "none")]
pub struct ErrorsTemplate;

#[derive(Template)]
#[template(path = "service/listen.js", escape = "none")]
pub struct ListenTemplate<'a> {
    pub server_name: &'a str,
}
