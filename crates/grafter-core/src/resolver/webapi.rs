//! Checkmk web API implementation of [`GraphResolver`].
//!
//! Asks the `get_graph_recipes` action which graphs the backend knows for a
//! query context. Transport failures and error responses surface as errors
//! so callers can tell "resolver unreachable" apart from "no graphs match",
//! which is an empty (and perfectly valid) recipe list.

use super::{GraphMetric, GraphResolver, GraphSpec};
use crate::config::{DatasourceConfig, ResolverConfig};
use crate::document::Context;
use crate::error::{GrafterError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

/// Graph-recipe client for one Checkmk site.
pub struct WebApiResolver {
    client: reqwest::Client,
    endpoint: Url,
    username: String,
    secret: String,
}

/// Envelope of every web API response.
#[derive(Debug, Deserialize)]
struct WebApiResponse {
    #[serde(default)]
    result_code: i64,
    #[serde(default)]
    result: Value,
}

impl WebApiResolver {
    /// Create a resolver for the Checkmk site at `base_url`, authenticating
    /// as the given automation user.
    pub fn new(
        base_url: &str,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<Self> {
        let endpoint = Url::parse(&format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            ResolverConfig::WEBAPI_PATH
        ))
        .map_err(|e| GrafterError::Config {
            message: format!("Invalid Checkmk site URL {:?}: {}", base_url, e),
        })?;

        let client = reqwest::Client::builder()
            .timeout(ResolverConfig::REQUEST_TIMEOUT)
            .connect_timeout(ResolverConfig::CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            username: username.into(),
            secret: secret.into(),
        })
    }

    /// Create a resolver from a stored datasource configuration.
    pub fn for_datasource(config: &DatasourceConfig) -> Result<Self> {
        Self::new(&config.url, &config.username, &config.secret)
    }

    /// Template specification the recipe endpoint expects: the context
    /// narrowed down to site, host and service.
    fn recipe_request(context: &Context) -> Value {
        json!({
            "specification": [
                "template",
                {
                    "site": context.site(),
                    "host_name": context.host_name(),
                    "service_description": context.service_description(),
                }
            ]
        })
    }
}

#[async_trait]
impl GraphResolver for WebApiResolver {
    async fn resolve(&self, context: &Context) -> Result<Vec<GraphSpec>> {
        let request = Self::recipe_request(context);
        debug!(
            "Requesting graph recipes for host={:?} service={:?}",
            context.host_name(),
            context.service_description()
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .query(&[
                ("_username", self.username.as_str()),
                ("_secret", self.secret.as_str()),
                ("action", ResolverConfig::RECIPES_ACTION),
            ])
            .body(format!("request={}", serde_json::to_string(&request)?))
            .send()
            .await
            .map_err(|e| GrafterError::Resolver {
                message: format!("graph recipe request failed: {}", e),
                source: Some(e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GrafterError::WebApi {
                message: format!("graph recipe request returned HTTP {}", status.as_u16()),
                status_code: Some(status.as_u16()),
            });
        }

        let payload: WebApiResponse =
            response.json().await.map_err(|e| GrafterError::Resolver {
                message: format!("unreadable graph recipe response: {}", e),
                source: Some(e),
            })?;

        if payload.result_code != 0 {
            return Err(GrafterError::WebApi {
                message: format!(
                    "web API reported result_code {}: {}",
                    payload.result_code, payload.result
                ),
                status_code: None,
            });
        }

        parse_recipes(&payload.result)
    }
}

/// Parse the raw recipe list into [`GraphSpec`]s.
///
/// Individual recipes are never dropped on parse trouble: legacy targets
/// index into this list, so positions must stay stable. Unreadable fields
/// degrade to empty values instead.
fn parse_recipes(result: &Value) -> Result<Vec<GraphSpec>> {
    let Some(items) = result.as_array() else {
        return Err(GrafterError::WebApi {
            message: format!("graph recipe result is not a list: {}", result),
            status_code: None,
        });
    };
    Ok(items.iter().map(parse_recipe).collect())
}

fn parse_recipe(recipe: &Value) -> GraphSpec {
    GraphSpec {
        title: recipe
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        // The template recipe carries its id at specification[1].graph_id.
        graph_id: recipe
            .pointer("/specification/1/graph_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        metrics: recipe
            .get("metrics")
            .and_then(Value::as_array)
            .map(|metrics| metrics.iter().map(parse_metric).collect())
            .unwrap_or_default(),
    }
}

fn parse_metric(metric: &Value) -> GraphMetric {
    GraphMetric {
        title: metric
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        expression: metric
            .get("expression")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
    }
}
