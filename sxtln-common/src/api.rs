///! API client for the sextillion service
///!
///! Every call follows the same path: build the request, attach the bearer
///! credential, execute, then decode the response into a [`Document`].

use crate::config::Config;
use crate::error::{Error, Result};
use crate::transport::TransportConfig;
use crate::value::Document;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use url::Url;

const JSON_CONTENT_TYPE: &str = "application/json";
const JSON_BODY_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Bearer credential attached to outgoing requests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Credentials {
    #[default]
    Anonymous,
    ApiKey(String),
    Token(String),
}

impl Credentials {
    /// A session token from `auth login` takes priority over a static API key
    pub fn from_config(config: &Config) -> Self {
        if !config.token.is_empty() {
            Credentials::Token(config.token.clone())
        } else if !config.api_key.is_empty() {
            Credentials::ApiKey(config.api_key.clone())
        } else {
            Credentials::Anonymous
        }
    }

    pub fn bearer(&self) -> Option<&str> {
        match self {
            Credentials::Anonymous => None,
            Credentials::ApiKey(v) | Credentials::Token(v) => Some(v),
        }
    }
}

/// A successfully decoded response
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Document,
}

/// Verb-oriented operations against the service
#[async_trait]
pub trait Api: Send + Sync {
    /// GET
    async fn fetch(&self, path: &str) -> Result<ApiResponse>;

    /// DELETE
    async fn remove(&self, path: &str) -> Result<ApiResponse>;

    /// POST; `None` omits the payload entirely
    async fn submit(&self, path: &str, body: Option<&Document>) -> Result<ApiResponse>;
}

pub struct ApiClient {
    base_url: Url,
    client: reqwest::Client,
    credentials: Credentials,
}

impl ApiClient {
    pub fn new(base_url: &str, credentials: Credentials) -> Result<Self> {
        Self::with_transport(base_url, credentials, &TransportConfig::default())
    }

    pub fn with_transport(
        base_url: &str,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            base_url,
            client: transport.build()?,
            credentials,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Join a relative endpoint onto the base URL
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        Ok(self.base_url.join(endpoint.trim_start_matches('/'))?)
    }

    /// Build request with authentication header
    fn build_request(
        &self,
        method: Method,
        url: Url,
        body: Option<&Document>,
    ) -> Result<reqwest::RequestBuilder> {
        let mut request = self.client.request(method, url);

        if let Some(bearer) = self.credentials.bearer() {
            request = request.header(AUTHORIZATION, format!("bearer {}", bearer));
        }

        match body {
            Some(body) => {
                let payload = serde_json::to_vec(body)?;
                request = request.header(CONTENT_TYPE, JSON_BODY_CONTENT_TYPE);
                if !payload.is_empty() {
                    request = request.header(CONTENT_LENGTH, payload.len());
                }
                request = request.body(payload);
            }
            None => {
                request = request.header(CONTENT_TYPE, JSON_CONTENT_TYPE);
            }
        }

        Ok(request)
    }

    async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Document>,
    ) -> Result<ApiResponse> {
        let url = self.endpoint_url(endpoint)?;
        let response = self
            .build_request(method.clone(), url.clone(), body)?
            .send()
            .await?;

        tracing::debug!(%method, %url, status = response.status().as_u16(), "api call");
        decode_response(&method, &url, response).await
    }
}

#[async_trait]
impl Api for ApiClient {
    async fn fetch(&self, path: &str) -> Result<ApiResponse> {
        self.execute(Method::GET, path, None).await
    }

    async fn remove(&self, path: &str) -> Result<ApiResponse> {
        self.execute(Method::DELETE, path, None).await
    }

    async fn submit(&self, path: &str, body: Option<&Document>) -> Result<ApiResponse> {
        self.execute(Method::POST, path, body).await
    }
}

async fn decode_response(
    method: &Method,
    url: &Url,
    response: reqwest::Response,
) -> Result<ApiResponse> {
    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let bytes = response.bytes().await?;

    if status != StatusCode::OK {
        return Err(Error::UnexpectedStatus {
            method: method.to_string(),
            url: url.to_string(),
            status: status.as_u16(),
            body: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }

    let body = if is_structured(&content_type) {
        if bytes.is_empty() {
            Document::new()
        } else {
            decode_structured(url, &bytes)?
        }
    } else {
        Document::raw(bytes.to_vec())
    };

    Ok(ApiResponse {
        status: status.as_u16(),
        body,
    })
}

fn is_structured(content_type: &str) -> bool {
    content_type.contains("json") || content_type.contains("yaml") || content_type.contains("yml")
}

/// JSON first, YAML as a fallback
fn decode_structured(url: &Url, bytes: &[u8]) -> Result<Document> {
    match serde_json::from_slice(bytes) {
        Ok(doc) => Ok(doc),
        Err(json_err) => serde_yaml::from_slice(bytes).map_err(|_| Error::MalformedBody {
            url: url.to_string(),
            reason: json_err.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Value, RAW_BODY_KEY};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, credentials: Credentials) -> ApiClient {
        ApiClient::new(&server.uri(), credentials).unwrap()
    }

    #[test]
    fn test_token_takes_priority_over_api_key() {
        let mut config = Config::default();
        assert_eq!(Credentials::from_config(&config), Credentials::Anonymous);

        config.api_key = "key".to_string();
        assert_eq!(
            Credentials::from_config(&config),
            Credentials::ApiKey("key".to_string())
        );

        config.token = "tok".to_string();
        assert_eq!(Credentials::from_config(&config).bearer(), Some("tok"));
    }

    #[test]
    fn test_endpoint_url_joins_onto_base_path() {
        let api = ApiClient::new("https://api.sextillion.io", Credentials::Anonymous).unwrap();
        assert_eq!(
            api.endpoint_url("/sc/cluster").unwrap().as_str(),
            "https://api.sextillion.io/sc/cluster"
        );

        let api = ApiClient::new("https://staging.example.com/v1", Credentials::Anonymous).unwrap();
        assert_eq!(
            api.endpoint_url("/sc/cluster/abc/kubeconfig").unwrap().as_str(),
            "https://staging.example.com/v1/sc/cluster/abc/kubeconfig"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(matches!(
            ApiClient::new("not a url", Credentials::Anonymous),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_json_response_decodes_to_same_structure() {
        let server = MockServer::start().await;
        let payload = json!({
            "clusters": [
                {"clusterId": "c-1", "name": "alpha", "nodeCount": 3, "stageIndex": 9},
                {"clusterId": "c-2", "name": "beta", "nodeCount": 1, "stageIndex": 4}
            ]
        });
        Mock::given(method("GET"))
            .and(path("/sc/cluster"))
            .and(header("authorization", "bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&payload))
            .expect(1)
            .mount(&server)
            .await;

        let api = client(&server, Credentials::Token("tok".to_string()));
        let response = api.fetch("/sc/cluster").await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, serde_json::from_value::<Document>(payload).unwrap());
    }

    #[tokio::test]
    async fn test_yaml_response_decodes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sc/cluster/c-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("clusterId: c-1\nstageIndex: 7\n", "application/x-yaml"),
            )
            .mount(&server)
            .await;

        let body = client(&server, Credentials::Anonymous)
            .fetch("/sc/cluster/c-1")
            .await
            .unwrap()
            .body;
        assert_eq!(body.require_str("clusterId").unwrap(), "c-1");
        assert_eq!(body.require_i64("stageIndex").unwrap(), 7);
    }

    #[tokio::test]
    async fn test_plain_text_is_wrapped_under_body_key() {
        let server = MockServer::start().await;
        let kubeconfig = "apiVersion: v1\nkind: Config\n";
        Mock::given(method("GET"))
            .and(path("/sc/cluster/c-1/kubeconfig"))
            .respond_with(ResponseTemplate::new(200).set_body_string(kubeconfig))
            .mount(&server)
            .await;

        let body = client(&server, Credentials::Anonymous)
            .fetch("/sc/cluster/c-1/kubeconfig")
            .await
            .unwrap()
            .body;
        assert_eq!(body.len(), 1);
        assert_eq!(
            body.get(RAW_BODY_KEY),
            Some(&Value::Bytes(kubeconfig.as_bytes().to_vec()))
        );
    }

    #[tokio::test]
    async fn test_empty_structured_body_is_empty_document() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/sc/cluster/c-1"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("", "application/json"))
            .mount(&server)
            .await;

        let response = client(&server, Credentials::Anonymous)
            .remove("/sc/cluster/c-1")
            .await
            .unwrap();
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_structured_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sc/cluster"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("clusters: [unclosed", "application/json"),
            )
            .mount(&server)
            .await;

        let err = client(&server, Credentials::Anonymous)
            .fetch("/sc/cluster")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedBody { .. }));
    }

    #[tokio::test]
    async fn test_non_200_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/check"))
            .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
            .mount(&server)
            .await;

        let err = client(&server, Credentials::Token("old".to_string()))
            .fetch("/auth/check")
            .await
            .unwrap_err();
        match err {
            Error::UnexpectedStatus {
                method,
                url,
                status,
                body,
            } => {
                assert_eq!(method, "GET");
                assert!(url.ends_with("/auth/check"));
                assert_eq!(status, 401);
                assert_eq!(body, "token expired");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_sends_json_body() {
        let server = MockServer::start().await;
        let request = Document::new()
            .with("name", "alpha")
            .with("nodeCount", 2i64)
            .with("nodeType", "b1");
        Mock::given(method("POST"))
            .and(path("/sc/cluster"))
            .and(header("content-type", "application/json; charset=UTF-8"))
            .and(body_json(json!({"name": "alpha", "nodeCount": 2, "nodeType": "b1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"clusterId": "c-9"})))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server, Credentials::ApiKey("key".to_string()))
            .submit("/sc/cluster", Some(&request))
            .await
            .unwrap();
        assert_eq!(response.body.require_str("clusterId").unwrap(), "c-9");

        let received = server.received_requests().await.unwrap();
        let sent = &received[0];
        assert_eq!(
            sent.headers.get("authorization").unwrap().to_str().unwrap(),
            "bearer key"
        );
        assert_eq!(
            sent.headers.get("content-length").unwrap().to_str().unwrap(),
            sent.body.len().to_string()
        );
    }

    #[tokio::test]
    async fn test_submit_without_body_sends_no_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        client(&server, Credentials::Anonymous)
            .submit("/auth/refresh", None)
            .await
            .unwrap();

        let received = server.received_requests().await.unwrap();
        assert!(received[0].body.is_empty());
        assert!(received[0].headers.get("authorization").is_none());
    }
}
