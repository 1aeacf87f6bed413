use anyhow::{Context, Result, bail};
use reqwest::{Client, Response, Url};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::model::{NamespaceDescriptor, NamespaceScope, PodRecord};

pub trait PodSource {
    fn list_namespaces(&self) -> impl Future<Output = Result<Vec<NamespaceDescriptor>>> + Send;

    fn list_pods(
        &self,
        scope: &NamespaceScope,
    ) -> impl Future<Output = Result<Vec<PodRecord>>> + Send;
}

#[derive(Debug, Clone)]
pub struct ApiGateway {
    client: Client,
    base: Url,
}

impl ApiGateway {
    pub fn new(server: &str, request_timeout: Duration) -> Result<Self> {
        let base = Url::parse(server.trim())
            .with_context(|| format!("invalid server url {server:?}"))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            bail!("server url must be http(s), got {server:?}");
        }

        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .context("failed to build http client")?;

        Ok(Self { client, base })
    }

    pub fn server(&self) -> &str {
        self.base.as_str()
    }

    pub fn namespaces_url(&self) -> Url {
        self.endpoint(&["api", "namespaces"])
    }

    pub fn pods_url(&self, scope: &NamespaceScope) -> Url {
        let mut url = self.endpoint(&["api", "pods"]);
        if let Some(namespace) = scope.namespace() {
            url.query_pairs_mut().append_pair("namespace", namespace);
        }
        url
    }

    pub fn descriptor_url(&self, namespace: &str, name: &str) -> Url {
        self.endpoint(&["api", "pods", namespace, name])
    }

    pub async fn fetch_descriptor(&self, namespace: &str, name: &str) -> Result<String> {
        let url = self.descriptor_url(namespace, name);
        let response = self
            .get(url.clone())
            .await
            .with_context(|| format!("failed to fetch manifest for {namespace}/{name}"))?;
        response
            .text()
            .await
            .with_context(|| format!("failed to read manifest body from {url}"))
    }

    fn endpoint(&self, parts: &[&str]) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(parts);
        }
        url
    }

    async fn get(&self, url: Url) -> Result<Response> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            bail!("GET {url} returned {status}");
        }
        Ok(response)
    }
}

impl PodSource for ApiGateway {
    async fn list_namespaces(&self) -> Result<Vec<NamespaceDescriptor>> {
        let url = self.namespaces_url();
        let response = self
            .get(url.clone())
            .await
            .context("failed to fetch namespaces")?;
        response
            .json::<Vec<NamespaceDescriptor>>()
            .await
            .with_context(|| format!("failed to decode namespace list from {url}"))
    }

    async fn list_pods(&self, scope: &NamespaceScope) -> Result<Vec<PodRecord>> {
        let url = self.pods_url(scope);
        let response = self
            .get(url.clone())
            .await
            .with_context(|| format!("failed to fetch pods for scope {scope}"))?;
        response
            .json::<Vec<PodRecord>>()
            .await
            .with_context(|| format!("failed to decode pod list from {url}"))
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiGateway, PodSource};
    use crate::model::NamespaceScope;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn gateway(server: &str) -> ApiGateway {
        ApiGateway::new(server, Duration::from_secs(5)).expect("gateway should build")
    }

    async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let read = socket.read(&mut chunk).await.expect("read");
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..read]);
                if request.windows(4).any(|window| window == b"\r\n\r\n") {
                    break;
                }
            }
            socket
                .write_all(response.as_bytes())
                .await
                .expect("write");
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&request)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string()
        });

        (format!("http://{addr}"), handle)
    }

    #[test]
    fn all_scope_omits_namespace_query() {
        let gateway = gateway("http://localhost:8080");
        assert_eq!(
            gateway.pods_url(&NamespaceScope::All).as_str(),
            "http://localhost:8080/api/pods"
        );
        assert_eq!(
            gateway
                .pods_url(&NamespaceScope::Named("kube-system".to_string()))
                .as_str(),
            "http://localhost:8080/api/pods?namespace=kube-system"
        );
        assert_eq!(
            gateway.namespaces_url().as_str(),
            "http://localhost:8080/api/namespaces"
        );
    }

    #[test]
    fn urls_respect_base_path_and_encode_segments() {
        let gateway = gateway("https://ops.example.com/explorer/");
        assert_eq!(
            gateway.descriptor_url("shop", "web/0").as_str(),
            "https://ops.example.com/explorer/api/pods/shop/web%2F0"
        );
        assert_eq!(
            gateway
                .pods_url(&NamespaceScope::Named("a&b".to_string()))
                .as_str(),
            "https://ops.example.com/explorer/api/pods?namespace=a%26b"
        );
    }

    #[test]
    fn rejects_non_http_servers() {
        assert!(ApiGateway::new("not a url", Duration::from_secs(1)).is_err());
        assert!(ApiGateway::new("ftp://files.example.com", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn lists_pods_for_named_scope() {
        let body = r#"[{"name":"api-0","namespace":"shop","status":"Running","restarts":1}]"#;
        let (server, request) = serve_once("200 OK", body).await;

        let pods = gateway(&server)
            .list_pods(&NamespaceScope::Named("shop".to_string()))
            .await
            .expect("pods should load");

        assert_eq!(pods.len(), 1);
        assert_eq!(pods[0].name, "api-0");
        assert_eq!(pods[0].restarts, 1);
        assert_eq!(
            request.await.expect("server task"),
            "GET /api/pods?namespace=shop HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn lists_namespaces() {
        let body = r#"[{"name":"default","status":"Active"},{"name":"shop","status":"Active"}]"#;
        let (server, request) = serve_once("200 OK", body).await;

        let namespaces = gateway(&server)
            .list_namespaces()
            .await
            .expect("namespaces should load");

        assert_eq!(namespaces.len(), 2);
        assert_eq!(namespaces[1].name, "shop");
        assert_eq!(
            request.await.expect("server task"),
            "GET /api/namespaces HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let (server, _request) =
            serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;

        let error = gateway(&server)
            .list_pods(&NamespaceScope::All)
            .await
            .expect_err("500 should fail");

        let rendered = format!("{error:#}");
        assert!(rendered.contains("failed to fetch pods"), "{rendered}");
        assert!(rendered.contains("500"), "{rendered}");
    }

    #[tokio::test]
    async fn connection_refused_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let result = gateway(&format!("http://{addr}")).list_namespaces().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn descriptor_is_returned_verbatim() {
        let yaml = "apiVersion: v1\nkind: Pod\nmetadata:\n  name: api-0\n";
        let (server, request) = serve_once("200 OK", yaml).await;

        let text = gateway(&server)
            .fetch_descriptor("shop", "api-0")
            .await
            .expect("descriptor should load");

        assert_eq!(text, yaml);
        assert_eq!(
            request.await.expect("server task"),
            "GET /api/pods/shop/api-0 HTTP/1.1"
        );
    }
}
