use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::net::SocketAddr;
use tally::{http_server, AppState};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

struct TestServer {
    addr: SocketAddr,
    client: Client,
    state: AppState,
    _shutdown: oneshot::Sender<()>,
}

impl TestServer {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = AppState::default();
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(http_server::serve(listener, state.clone(), async move {
            let _ = rx.await;
        }));
        Self {
            addr,
            client: Client::new(),
            state,
            _shutdown: tx,
        }
    }

    async fn get(&self, path: &str, session: Option<&str>) -> Response {
        let mut request = self.client.get(format!("http://{}{}", self.addr, path));
        if let Some(id) = session {
            request = request.header(COOKIE, format!("session_id={id}"));
        }
        request.send().await.unwrap()
    }
}

fn minted_session(response: &Response) -> Option<String> {
    let cookie = response.headers().get(SET_COOKIE)?.to_str().ok()?;
    let pair = cookie.split(';').next()?;
    pair.strip_prefix("session_id=").map(str::to_string)
}

#[tokio::test]
async fn test_root_creates_session_cookie() {
    let server = TestServer::start().await;
    let response = server.get("/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let id = minted_session(&response).expect("new session cookie");
    assert!(!id.is_empty());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Server is working");
}

#[tokio::test]
async fn test_same_session_across_requests() {
    let server = TestServer::start().await;
    let first = server.get("/add/5", None).await;
    let id = minted_session(&first).unwrap();

    let second = server.get("/add/3", Some(&id)).await;
    assert_eq!(second.status(), StatusCode::OK);
    assert!(minted_session(&second).is_none());
    let body: Value = second.json().await.unwrap();
    assert_eq!(body["value"], 8.0);
    assert_eq!(server.state.store.len().await, 1);
}

#[tokio::test]
async fn test_sequence_then_compute_matches_live_value() {
    let server = TestServer::start().await;
    let id = minted_session(&server.get("/", None).await).unwrap();

    let mut last = 0.0;
    for path in ["/add/10", "/multiply/2", "/sub/5", "/divide/3"] {
        let response = server.get(path, Some(&id)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["message"], "Operation successful");
        last = body["value"].as_f64().unwrap();
    }
    assert_eq!(last, 5.0);

    let current: Value = server.get("/currentValue", Some(&id)).await.json().await.unwrap();
    assert_eq!(current["value"], 5.0);

    let computed: f64 = server.get("/compute", Some(&id)).await.json().await.unwrap();
    assert_eq!(computed, 5.0);

    let history: Value = server.get("/my_action_history", Some(&id)).await.json().await.unwrap();
    let actions = history["actions"].as_array().unwrap();
    assert_eq!(actions.len(), 4);
    assert_eq!(actions[0]["type"], "add");
    assert_eq!(actions[3]["type"], "divide");
    assert_eq!(actions[3]["operand"], "3");
}

#[tokio::test]
async fn test_divide_by_zero_is_bad_request() {
    let server = TestServer::start().await;
    let response = server.get("/divide/0.0", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    // the session is still minted even though the operation failed
    let id = minted_session(&response).unwrap();
    let body: Value = response.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().contains("Division cannot be done with 0"));

    let history: Value = server.get("/my_action_history", Some(&id)).await.json().await.unwrap();
    assert_eq!(history["message"], "No history was found");
}

#[tokio::test]
async fn test_invalid_operand_is_bad_request() {
    let server = TestServer::start().await;
    let response = server.get("/add/abc", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let response = server.get("/multiply/inf", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_track_logs_without_touching_live_value() {
    let server = TestServer::start().await;
    let id = minted_session(&server.get("/", None).await).unwrap();

    let response = server.get("/track/add/5", Some(&id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = server.get("/track/multiply/3", Some(&id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = server.get("/track/divide/0", Some(&id)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let response = server.get("/track/pow/2", Some(&id)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let computed: f64 = server.get("/compute", Some(&id)).await.json().await.unwrap();
    assert_eq!(computed, 15.0);
    let current: Value = server.get("/currentValue", Some(&id)).await.json().await.unwrap();
    assert_eq!(current["value"], 0.0);
}

#[tokio::test]
async fn test_compute_on_empty_history_is_zero() {
    let server = TestServer::start().await;
    let response = server.get("/compute", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let computed: f64 = response.json().await.unwrap();
    assert_eq!(computed, 0.0);
}

#[tokio::test]
async fn test_clear_resets_value() {
    let server = TestServer::start().await;
    let id = minted_session(&server.get("/add/12", None).await).unwrap();
    let body: Value = server.get("/clear", Some(&id)).await.json().await.unwrap();
    assert_eq!(body["value"], 0.0);
    let computed: f64 = server.get("/compute", Some(&id)).await.json().await.unwrap();
    assert_eq!(computed, 0.0);
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::start().await;
    let response = server.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "OK");
    assert!(server.state.store.is_empty().await);
}
