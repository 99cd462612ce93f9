use std::{str::FromStr, time::Duration};

use anyhow::{Context, Result, anyhow};
use reqwest::{
    Client, StatusCode,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use serde_json::Value;
use stackup_util::{interpolate_env, redact_sensitive};
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

use super::{ActionError, ActionProvider, HttpProviderConfig};

/// Sends every operation as `POST {base_url}/{operation}` with the resolved
/// configuration as the JSON body.
///
/// Calls block on a runtime owned by the provider, so the scheduler stays
/// synchronous.
pub struct HttpProvider {
    provider_id: String,
    base_url: String,
    client: Client,
    runtime: Runtime,
}

impl HttpProvider {
    pub fn new(provider_id: impl Into<String>, config: &HttpProviderConfig) -> Result<Self> {
        let provider_id = provider_id.into();
        let headers = build_headers(config).with_context(|| format!("invalid headers for provider '{provider_id}'"))?;
        debug!(
            provider = %provider_id,
            base_url = %config.base_url,
            headers = %redact_sensitive(&format_headers(&headers)),
            "configuring http provider"
        );

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout_secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }
        let client = builder.build().context("could not create the HTTP client")?;
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("could not start the HTTP runtime")?;

        Ok(Self {
            provider_id,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            runtime,
        })
    }

    fn endpoint(&self, operation: &str) -> String {
        format!("{}/{}", self.base_url, operation.trim_start_matches('/'))
    }
}

impl ActionProvider for HttpProvider {
    fn invoke(&self, operation: &str, config: &Value) -> Result<Value, ActionError> {
        let url = self.endpoint(operation);
        debug!(provider = %self.provider_id, operation = %operation, url = %url, "http provider call");

        let request = self.client.post(&url).json(config);
        let (status, body) = self
            .runtime
            .block_on(async move {
                let response = request.send().await?;
                let status = response.status();
                let body = response.text().await?;
                Ok::<_, reqwest::Error>((status, body))
            })
            .map_err(|error| ActionError::new("TransportError", error.to_string()))?;

        if status.is_success() {
            Ok(serde_json::from_str(&body).unwrap_or(Value::Null))
        } else {
            Err(ActionError::new("HttpError", failure_message(status, &body)).with_status(status.as_u16()))
        }
    }
}

fn build_headers(config: &HttpProviderConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, raw_value) in &config.headers {
        let value = interpolate_env(raw_value)?;
        let header_name = HeaderName::from_str(name).map_err(|error| anyhow!("header '{name}': {error}"))?;
        let header_value = HeaderValue::from_str(&value).map_err(|error| anyhow!("header '{name}': {error}"))?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

fn format_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value.to_str().unwrap_or("<binary>")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prefers a JSON `message` field, then the raw body, then the status reason.
fn failure_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body)
        && let Some(Value::String(message)) = fields.get("message")
    {
        return message.clone();
    }
    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }
    status.canonical_reason().unwrap_or("request failed").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use mockito::Matcher;
    use serde_json::json;

    fn config(base_url: String) -> HttpProviderConfig {
        HttpProviderConfig {
            base_url,
            headers: IndexMap::new(),
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn posts_the_config_and_parses_the_response() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/createBucket")
            .match_header("x-api-key", "secret")
            .match_body(Matcher::Json(json!({"Bucket": "assets"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"Location":"/assets"}"#)
            .create();

        let mut config = config(format!("{}/", server.url()));
        config.headers.insert("x-api-key".into(), "${env:STACKUP_TEST_API_KEY}".into());
        let provider = temp_env::with_var("STACKUP_TEST_API_KEY", Some("secret"), || HttpProvider::new("S3", &config)).unwrap();

        let output = provider.invoke("createBucket", &json!({"Bucket": "assets"})).unwrap();
        assert_eq!(output, json!({"Location": "/assets"}));
        mock.assert();
    }

    #[test]
    fn empty_or_non_json_success_bodies_are_null() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("POST", "/deleteBucket").with_status(204).create();

        let provider = HttpProvider::new("S3", &config(server.url())).unwrap();
        assert_eq!(provider.invoke("deleteBucket", &Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn error_statuses_become_http_errors() {
        let mut server = mockito::Server::new();
        let _conflict = server
            .mock("POST", "/createBucket")
            .with_status(409)
            .with_body(r#"{"message":"bucket already exists"}"#)
            .create();
        let _plain = server.mock("POST", "/createQueue").with_status(500).with_body("boom").create();
        let _empty = server.mock("POST", "/createTopic").with_status(503).create();

        let provider = HttpProvider::new("S3", &config(server.url())).unwrap();

        let error = provider.invoke("createBucket", &json!({})).unwrap_err();
        assert_eq!(error, ActionError::new("HttpError", "bucket already exists").with_status(409));

        let error = provider.invoke("createQueue", &json!({})).unwrap_err();
        assert_eq!(error.message, "boom");
        assert_eq!(error.status_code, Some(500));

        let error = provider.invoke("createTopic", &json!({})).unwrap_err();
        assert_eq!(error.message, "Service Unavailable");
    }

    #[test]
    fn unreachable_endpoints_are_transport_errors() {
        let provider = HttpProvider::new("S3", &config("http://127.0.0.1:9".into())).unwrap();

        let error = provider.invoke("createBucket", &json!({})).unwrap_err();
        assert_eq!(error.name, "TransportError");
        assert_eq!(error.status_code, None);
    }

    #[test]
    fn missing_header_variables_fail_construction() {
        let mut config = config("http://localhost".into());
        config.headers.insert("authorization".into(), "Bearer ${env:STACKUP_TEST_MISSING_TOKEN}".into());

        let result = temp_env::with_var_unset("STACKUP_TEST_MISSING_TOKEN", || HttpProvider::new("S3", &config));
        assert!(result.is_err());
    }
}
