use crate::backend::{ProvisioningBackend, ResourceRef};
use crate::errors::{ApiError, HttpError, Result};
use async_trait::async_trait;
use log::{debug, error, info, trace};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use topoplan_core::{
    Certificate, DnsRecord, EdgeResources, InstancePlacement, Listener, ListenerRule,
    NetworkTopology, TargetGroup, TenantCredential,
};
use topoplan_utils::{mask_secret, ResourceKind};
use url::Url;

/// Provisioning API used when no base URL is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Trait for providing configuration to the provisioning client
/// This allows the CLI to implement config without circular dependencies
pub trait BackendConfig {
    type Error;

    /// Get the API key for authentication
    fn get_api_key(&self) -> std::result::Result<String, Self::Error>;

    /// Get the base URL for the API (optional, defaults to the local backend)
    fn get_base_url(&self) -> std::result::Result<Option<String>, Self::Error> {
        Ok(None)
    }
}

/// Body the provisioning API answers every create call with
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedResource {
    physical_id: String,
}

/// HTTP client for a remote provisioning API
#[derive(Debug, Clone)]
pub struct HttpProvisioningClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl HttpProvisioningClient {
    /// Create a new provisioning client
    pub fn new(api_key: String, base_url: Option<String>) -> Result<Self> {
        let raw = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&raw)?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ApiError::Config(format!(
                "unsupported scheme '{}' in base URL {}",
                base_url.scheme(),
                raw
            )));
        }

        debug!("Creating HttpProvisioningClient");
        debug!("  API Key: {}", mask_secret(&api_key));
        debug!("  Base URL: {}", base_url);

        Ok(Self {
            client: Client::new(),
            api_key,
            base_url,
        })
    }

    /// Create a client from any configuration implementing BackendConfig
    pub fn from_config<C>(config: &C) -> std::result::Result<Self, C::Error>
    where
        C: BackendConfig,
        C::Error: From<ApiError>,
    {
        debug!("Creating HttpProvisioningClient from config");
        let api_key = config.get_api_key()?;
        let base_url = config.get_base_url()?;

        match &base_url {
            Some(url) => debug!("Got custom base URL from config: {}", url),
            None => debug!("Using default base URL"),
        }

        Ok(Self::new(api_key, base_url)?)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Collection endpoint for one resource kind
    pub fn endpoint(&self, kind: ResourceKind) -> String {
        format!(
            "{}/v1/{}",
            self.base_url.as_str().trim_end_matches('/'),
            kind.as_str()
        )
    }

    /// POST one declaration and read back the backend's id for it
    async fn post<T>(&self, kind: ResourceKind, logical_id: &str, body: &T) -> Result<ResourceRef>
    where
        T: Serialize + Sync + ?Sized,
    {
        let url = self.endpoint(kind);

        debug!("HTTP POST request to: {} ({})", url, logical_id);
        trace!("  Authorization: Bearer {}", mask_secret(&self.api_key));
        trace!(
            "Request body: {}",
            serde_json::to_string_pretty(body).unwrap_or_else(|_| "Invalid JSON".to_string())
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!("POST request failed: {:?}", e);
                HttpError::Request(e)
            })?;

        debug!("Response status: {}", response.status());

        let response = self.handle_response(response).await?;
        let created: CreatedResource = response.json().await.map_err(HttpError::Request)?;

        info!("Created {} {} as {}", kind, logical_id, created.physical_id);

        Ok(ResourceRef::new(kind, logical_id, created.physical_id))
    }

    /// Handle HTTP response and convert errors
    async fn handle_response(&self, response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        error!("Request failed with status: {}", status);
        debug!("Error response body: {}", error_text);

        let api_error = match status {
            StatusCode::UNAUTHORIZED => HttpError::AuthenticationFailed,
            StatusCode::FORBIDDEN => HttpError::InvalidApiKey,
            StatusCode::CONFLICT => HttpError::Conflict(error_text),
            StatusCode::TOO_MANY_REQUESTS => HttpError::RateLimited,
            StatusCode::SERVICE_UNAVAILABLE => HttpError::ServiceUnavailable,
            StatusCode::REQUEST_TIMEOUT => HttpError::Timeout,
            _ => HttpError::HttpError {
                status: status.as_u16(),
                message: error_text,
            },
        };

        Err(ApiError::Http(api_error))
    }

    /// Test connection to the API
    pub async fn test_connection(&self) -> Result<bool> {
        let url = format!("{}/v1/health", self.base_url.as_str().trim_end_matches('/'));
        debug!("Testing API connection at {}", url);

        match self.client.get(&url).bearer_auth(&self.api_key).send().await {
            Ok(response) if response.status().is_success() => {
                info!("API connection successful");
                Ok(true)
            }
            Ok(response) => {
                error!("API health check returned {}", response.status());
                Ok(false)
            }
            Err(e) => {
                error!("API connection failed: {:?}", e);
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl ProvisioningBackend for HttpProvisioningClient {
    async fn create_network(&self, network: &NetworkTopology) -> Result<ResourceRef> {
        self.post(ResourceKind::Network, &network.name, network).await
    }

    async fn create_edge(&self, edge: &EdgeResources) -> Result<Vec<ResourceRef>> {
        let mut created = vec![
            self.post(ResourceKind::HostedZone, &edge.zone.name, &edge.zone)
                .await?,
        ];

        for group in [
            &edge.app_security_group,
            &edge.lb_security_group,
            &edge.step_security_group,
        ] {
            created.push(
                self.post(ResourceKind::SecurityGroup, &group.name, group)
                    .await?,
            );
        }

        created.push(
            self.post(
                ResourceKind::LoadBalancer,
                &edge.load_balancer.name,
                &edge.load_balancer,
            )
            .await?,
        );

        for bastion in &edge.bastions {
            created.push(
                self.post(ResourceKind::Instance, &bastion.name, bastion)
                    .await?,
            );
        }

        Ok(created)
    }

    async fn create_instance(&self, placement: &InstancePlacement) -> Result<ResourceRef> {
        self.post(ResourceKind::Instance, placement.instance.as_str(), placement)
            .await
    }

    async fn create_target_group(&self, target_group: &TargetGroup) -> Result<ResourceRef> {
        self.post(ResourceKind::TargetGroup, &target_group.name, target_group)
            .await
    }

    async fn create_listener(&self, listener: &Listener) -> Result<ResourceRef> {
        self.post(ResourceKind::Listener, &listener.name, listener)
            .await
    }

    async fn create_certificate(&self, certificate: &Certificate) -> Result<ResourceRef> {
        self.post(ResourceKind::Certificate, &certificate.name, certificate)
            .await
    }

    async fn create_rule(&self, rule: &ListenerRule) -> Result<ResourceRef> {
        self.post(ResourceKind::ListenerRule, &rule.name, rule).await
    }

    async fn create_record(&self, record: &DnsRecord) -> Result<ResourceRef> {
        self.post(ResourceKind::DnsRecord, &record.name, record).await
    }

    async fn create_credential(&self, credential: &TenantCredential) -> Result<ResourceRef> {
        self.post(ResourceKind::Credential, &credential.identity, credential)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use topoplan_core::{derive_plan, DeploymentSettings};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn plan() -> topoplan_core::TopologyPlan {
        derive_plan(&DeploymentSettings {
            prefix: "demo".to_string(),
            domain: "example.com".to_string(),
            sub_domains: vec!["shop".to_string()],
            instance_count: 1,
            use_cert: false,
            temp_priority: 0,
        })
        .unwrap()
    }

    struct StaticConfig(Option<String>);

    impl BackendConfig for StaticConfig {
        type Error = ApiError;

        fn get_api_key(&self) -> Result<String> {
            Ok("test-key-12345678".to_string())
        }

        fn get_base_url(&self) -> Result<Option<String>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_endpoints() {
        let client =
            HttpProvisioningClient::new("key".to_string(), Some("https://api.test/".to_string()))
                .unwrap();

        assert_eq!(
            client.endpoint(ResourceKind::TargetGroup),
            "https://api.test/v1/target-groups"
        );
        assert_eq!(
            client.endpoint(ResourceKind::Network),
            "https://api.test/v1/networks"
        );
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(matches!(
            HttpProvisioningClient::new("key".to_string(), Some("not a url".to_string())),
            Err(ApiError::Url(_))
        ));
        assert!(matches!(
            HttpProvisioningClient::new("key".to_string(), Some("ftp://api.test".to_string())),
            Err(ApiError::Config(_))
        ));
    }

    #[test]
    fn test_multibyte_key_is_accepted() {
        let key = "€€€€abcdefgh".to_string();
        assert_eq!(mask_secret(&key), "€€€€****efgh");

        let client = HttpProvisioningClient::new(key, None).unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8080/");
    }

    #[test]
    fn test_from_config_defaults_base_url() {
        let client = HttpProvisioningClient::from_config(&StaticConfig(None)).unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8080/");
    }

    #[tokio::test]
    async fn test_create_network_posts_declaration() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/networks"))
            .and(header("authorization", "Bearer test-key-12345678"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({ "physicalId": "vpc-0abc" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client =
            HttpProvisioningClient::from_config(&StaticConfig(Some(server.uri()))).unwrap();
        let created = client.create_network(&plan().network).await.unwrap();

        assert_eq!(created.kind, ResourceKind::Network);
        assert_eq!(created.logical_id, "vpc-demo");
        assert_eq!(created.physical_id, "vpc-0abc");
    }

    #[tokio::test]
    async fn test_create_edge_posts_every_resource() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "physicalId": "edge-id" })),
            )
            .mount(&server)
            .await;

        let client =
            HttpProvisioningClient::from_config(&StaticConfig(Some(server.uri()))).unwrap();
        let created = client.create_edge(&plan().edge).await.unwrap();

        // zone, three security groups, load balancer, two step hosts
        assert_eq!(created.len(), 7);
        assert_eq!(created[0].kind, ResourceKind::HostedZone);
        assert_eq!(created[4].logical_id, "demo-alb");
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/networks"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/listeners"))
            .respond_with(ResponseTemplate::new(409).set_body_string("port 80 taken"))
            .mount(&server)
            .await;

        let client =
            HttpProvisioningClient::from_config(&StaticConfig(Some(server.uri()))).unwrap();
        let plan = plan();

        let err = client.create_network(&plan.network).await.unwrap_err();
        assert!(matches!(err, ApiError::Http(HttpError::AuthenticationFailed)));

        let listener = &plan.listeners.as_ref().unwrap().http;
        let err = client.create_listener(listener).await.unwrap_err();
        match err {
            ApiError::Http(HttpError::Conflict(message)) => assert_eq!(message, "port 80 taken"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connection_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client =
            HttpProvisioningClient::from_config(&StaticConfig(Some(server.uri()))).unwrap();
        assert!(client.test_connection().await.unwrap());
    }
}
