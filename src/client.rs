use async_trait::async_trait;
use log::{info, warn};
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

use crate::config::AdminSettings;
use crate::error::{AdminError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// A single request ready to be sent. `body` is only sent for POST and PUT.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body),
        }
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Put,
            path: path.into(),
            body: Some(body),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            path: path.into(),
            body: None,
        }
    }
}

/// Parsed response. `ok` mirrors a 2xx status; `data` is the JSON body whatever the status.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub ok: bool,
    pub data: Value,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;

    async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.send(ApiRequest::get(path)).await
    }

    async fn post(&self, path: &str, payload: Value) -> Result<ApiResponse> {
        self.send(ApiRequest::post(path, payload)).await
    }

    async fn put(&self, path: &str, payload: Value) -> Result<ApiResponse> {
        self.send(ApiRequest::put(path, payload)).await
    }

    async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.send(ApiRequest::delete(path)).await
    }
}

/// reqwest-backed transport talking to the SRMS server
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    basic_auth: String,
}

impl HttpTransport {
    pub fn new(settings: &AdminSettings) -> Result<Self> {
        let client = create_http_client(settings.timeout_secs)?;
        Ok(Self {
            client,
            base_url: settings.host.trim_end_matches('/').to_string(),
            basic_auth: settings.basic_auth.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = self.url(&request.path);
        info!("{} {}", request.method, url);

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Delete => self.client.delete(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
        };

        if matches!(request.method, Method::Post | Method::Put) {
            let body = request.body.unwrap_or_else(|| Value::Object(Default::default()));
            builder = builder.json(&body);
        }

        builder = add_auth_if_needed(builder, &self.basic_auth);

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(
                "{} {} returned {} {}",
                request.method,
                url,
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            );
        }

        let data = parse_json_body(&body)?;
        Ok(ApiResponse {
            ok: status.is_success(),
            data,
        })
    }
}

fn create_http_client(timeout_secs: Option<u64>) -> Result<Client> {
    let mut builder = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .cookie_store(true);
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

fn add_auth_if_needed(request: reqwest::RequestBuilder, basic_auth: &str) -> reqwest::RequestBuilder {
    if basic_auth.is_empty() {
        return request;
    }

    match basic_auth.split_once(':') {
        Some((user, pass)) => request.basic_auth(user, Some(pass)),
        None => {
            warn!("Basic auth format should be 'username:password', sending without it");
            request
        }
    }
}

fn check_html_response(body: &str) -> Result<()> {
    let trimmed = body.trim_start();
    if trimmed.starts_with("<!DOCTYPE") || trimmed.starts_with("<!doctype") || trimmed.starts_with("<html") {
        return Err(AdminError::UnexpectedHtml);
    }
    Ok(())
}

fn parse_json_body(body: &str) -> Result<Value> {
    check_html_response(body)?;
    serde_json::from_str(body).map_err(|e| AdminError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn html_body_is_rejected() {
        let err = parse_json_body("<!DOCTYPE html><html></html>").unwrap_err();
        assert!(matches!(err, AdminError::UnexpectedHtml));

        let err = parse_json_body("  <html><body>404</body></html>").unwrap_err();
        assert!(matches!(err, AdminError::UnexpectedHtml));
    }

    #[test]
    fn garbage_body_is_decode_error() {
        assert!(matches!(parse_json_body(""), Err(AdminError::Decode(_))));
        assert!(matches!(parse_json_body("ok"), Err(AdminError::Decode(_))));
    }

    #[test]
    fn json_body_keeps_key_order() {
        let data = parse_json_body(r#"{"z":1,"a":2}"#).unwrap();
        assert_eq!(data, json!({"z": 1, "a": 2}));
        let keys: Vec<&String> = data.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn url_joins_without_double_slash() {
        let settings = AdminSettings {
            host: "http://localhost:5013/".to_string(),
            ..AdminSettings::default()
        };
        let transport = HttpTransport::new(&settings).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:5013");
        assert_eq!(transport.url("/api/menu"), "http://localhost:5013/api/menu");
        assert_eq!(transport.url("logout"), "http://localhost:5013/logout");
    }
}
