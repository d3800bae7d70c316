use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get};
use axum::{Json, Router};
use pretty_assertions::assert_eq;
use roster_store::StoreHandle;
use roster_sync::{ApiError, HttpUserApi, RosterConfig, UserApi, UserSync};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Backend {
    users: Vec<Value>,
    headers: Vec<HeaderMap>,
}

type Shared = Arc<Mutex<Backend>>;

async fn list_users(State(backend): State<Shared>, headers: HeaderMap) -> Json<Value> {
    let mut backend = backend.lock().unwrap();
    backend.headers.push(headers);
    Json(Value::Array(backend.users.clone()))
}

async fn remove_user(State(backend): State<Shared>, Path(id): Path<u64>) -> StatusCode {
    let mut backend = backend.lock().unwrap();
    let before = backend.users.len();
    backend.users.retain(|user| user["id"] != json!(id));
    if backend.users.len() == before {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    }
}

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn backend_with(users: Vec<Value>) -> (Shared, HttpUserApi) {
    let backend: Shared = Arc::new(Mutex::new(Backend {
        users,
        ..Backend::default()
    }));
    let router = Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", delete(remove_user))
        .with_state(backend.clone());
    let addr = serve(router).await;
    (backend, client_for(addr))
}

fn client_for(addr: SocketAddr) -> HttpUserApi {
    let config = RosterConfig {
        api_base_url: format!("http://{addr}/"),
        ..RosterConfig::default()
    };
    HttpUserApi::new(&config).unwrap()
}

fn leanne() -> Value {
    json!({
        "id": 1,
        "name": "Leanne Graham",
        "username": "Bret",
        "email": "Sincere@april.biz",
        "address": {
            "street": "Kulas Light",
            "suite": "Apt. 556",
            "city": "Gwenborough",
            "zipcode": "92998-3874",
            "geo": { "lat": "-37.3159", "lng": "81.1496" }
        },
        "phone": "1-770-736-8031 x56442",
        "website": "hildegard.org",
        "company": {
            "name": "Romaguera-Crona",
            "catchPhrase": "Multi-layered client-server neural-net",
            "bs": "harness real-time e-markets"
        }
    })
}

fn ervin() -> Value {
    json!({ "id": 2, "name": "Ervin Howell", "email": "Shanna@melissa.tv" })
}

#[tokio::test]
async fn fetch_decodes_users_and_sends_json_headers() {
    let (backend, api) = backend_with(vec![leanne(), ervin()]).await;

    let users = api.fetch_users().await.unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[0].name, "Leanne Graham");
    assert_eq!(users[0].company.name, "Romaguera-Crona");
    assert_eq!(users[0].address.city, "Gwenborough");
    assert_eq!(users[1].email, "Shanna@melissa.tv");

    let backend = backend.lock().unwrap();
    let headers = &backend.headers[0];
    assert_eq!(headers["content-type"], "application/json");
    assert_eq!(headers["accept"], "application/json");
    assert_eq!(headers["x-requested-with"], "XMLHttpRequest");
}

#[tokio::test]
async fn delete_targets_the_user_url() {
    let (backend, api) = backend_with(vec![leanne(), ervin()]).await;

    api.delete_user(1).await.unwrap();

    let ids: Vec<Value> = backend
        .lock()
        .unwrap()
        .users
        .iter()
        .map(|user| user["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!(2)]);
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let (_backend, api) = backend_with(vec![ervin()]).await;

    let err = api.delete_user(42).await.unwrap_err();

    assert_eq!(err, ApiError::Status { status: 404 });
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let router = Router::new().route("/users", get(|| async { "not json" }));
    let api = client_for(serve(router).await);

    let err = api.fetch_users().await.unwrap_err();

    assert!(matches!(err, ApiError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn server_error_on_fetch_is_reported() {
    let router = Router::new().route(
        "/users",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let api = client_for(serve(router).await);

    let err = api.fetch_users().await.unwrap_err();

    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let api = client_for(addr);

    let err = api.fetch_users().await.unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn session_over_http_deletes_and_reconciles() {
    let (backend, api) = backend_with(vec![leanne(), ervin()]).await;
    let store = StoreHandle::default();
    let sync = UserSync::new(Arc::new(api), store.clone(), &RosterConfig::default());

    sync.fetch_all().await.unwrap();
    store.set_search_query("ervin");
    assert_eq!(store.projection().len(), 1);

    store.set_search_query("");
    sync.delete(1).await.unwrap();

    let rows = store.projection();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Ervin Howell");
    assert_eq!(backend.lock().unwrap().users.len(), 1);
    assert_eq!(sync.cached().map(|users| users.len()), Some(1));
}
