//! Proxy integration tests: a real listener in front of a mock upstream.

use std::net::SocketAddr;
use std::time::Duration;

use qrm_proxy::{ProxySettings, serve};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use url::Url;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct RunningProxy {
    addr: SocketAddr,
    stop: Option<oneshot::Sender<()>>,
}

impl Drop for RunningProxy {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

async fn start_proxy(target: &str, allowed_hosts: Vec<String>) -> RunningProxy {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let settings = ProxySettings {
        listen: addr,
        target: Url::parse(target).unwrap(),
        allowed_hosts,
        timeout: Some(Duration::from_secs(5)),
    };
    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        serve(listener, &settings, async {
            let _ = rx.await;
        })
        .await
        .unwrap();
    });
    RunningProxy {
        addr,
        stop: Some(tx),
    }
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_list_path_is_rewritten() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1/list"))
        .and(query_param("api_key", "k"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "data": {"content": []}})),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let proxy = start_proxy(&upstream.uri(), vec![]).await;
    let response = client()
        .get(format!("http://{}/api/list/?api_key=k", proxy.addr))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_validate_path_changes_origin() {
    let upstream = MockServer::start().await;
    let upstream_host = upstream.address().to_string();
    Mock::given(method("POST"))
        .and(path("/api/1/validate"))
        .and(query_param("api_key", "k"))
        .and(header("host", upstream_host.as_str()))
        .and(header("content-type", "application/json"))
        .and(body_string("{}"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "data": {"user_id": "42"}})),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let proxy = start_proxy(&upstream.uri(), vec![]).await;
    let response = client()
        .post(format!("http://{}/api/?api_key=k", proxy.addr))
        .header("content-type", "application/json")
        .body("{}")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["user_id"], "42");
}

#[tokio::test]
async fn test_upstream_status_is_passed_through() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1/list"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"success": false})))
        .mount(&upstream)
        .await;

    let proxy = start_proxy(&upstream.uri(), vec![]).await;
    let response = client()
        .get(format!("http://{}/api/list/?api_key=bad", proxy.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_unmatched_path_is_not_found() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let proxy = start_proxy(&upstream.uri(), vec![]).await;
    let response = client()
        .get(format!("http://{}/index.html", proxy.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_unknown_host_is_forbidden() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let proxy = start_proxy(&upstream.uri(), vec!["tunnel.test".to_string()]).await;
    let response = client()
        .get(format!("http://{}/api/list/", proxy.addr))
        .header("host", "evil.example")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let response = client()
        .get(format!("http://{}/index.html", proxy.addr))
        .header("host", "tunnel.test")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404, "allowed host reaches the router");
}

#[tokio::test]
async fn test_unreachable_upstream_is_bad_gateway() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let dead = listener.local_addr().unwrap();
    drop(listener);

    let proxy = start_proxy(&format!("http://{dead}"), vec![]).await;
    let response = client()
        .get(format!("http://{}/api/list/?api_key=k", proxy.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 502);
}
