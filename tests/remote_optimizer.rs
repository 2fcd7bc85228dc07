use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use composite_designer::optimizer::{
    ConvergencePoint, CostContribution, MaterialProperty, MaterialSpec, MixtureProperty, MixtureSpec,
    OptimizationRequest, OptimizationResult, Optimizer, RankedDesign,
};
use composite_designer::{DesignerError, RemoteOptimizer};

#[derive(Default)]
struct StubState {
    requests: Mutex<Vec<(Option<String>, OptimizationRequest)>>,
}

async fn optimize_handler(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(request): Json<OptimizationRequest>,
) -> Json<OptimizationResult> {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let first = request.mixtures[0].properties[0].property.clone();
    state.requests.lock().unwrap().push((auth, request));

    Json(OptimizationResult {
        ranked_designs: vec![RankedDesign {
            cost: 0.25,
            values: vec![12.0, 0.5],
        }],
        convergence_trace: vec![ConvergencePoint {
            generation: 0,
            best_cost: 0.25,
            average_cost: 0.75,
        }],
        best_composition: vec![CostContribution {
            property: first,
            contribution: 1.0,
        }],
    })
}

async fn spawn_stub(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn sample_request() -> OptimizationRequest {
    OptimizationRequest {
        materials: vec![MaterialSpec {
            name: "mat_0".into(),
            properties: vec![MaterialProperty {
                property: "bulk_modulus".into(),
                lower_bound: 10.0,
                upper_bound: 90.0,
            }],
        }],
        mixtures: vec![MixtureSpec {
            name: "mixture".into(),
            properties: vec![MixtureProperty {
                property: "bulk_modulus".into(),
                desired_value: 42.0,
            }],
        }],
    }
}

#[tokio::test]
async fn test_remote_round_trip_with_api_key() {
    let state = Arc::new(StubState::default());
    let app = Router::new()
        .route("/optimize", post(optimize_handler))
        .with_state(state.clone());
    let addr = spawn_stub(app).await;

    let remote = RemoteOptimizer::new(format!("http://{}/", addr), Some("token-1".into()));
    let result = remote.optimize(sample_request()).await.unwrap();

    assert_eq!(result.ranked_designs[0].cost, 0.25);
    assert_eq!(result.best_composition[0].property.as_str(), "bulk_modulus");

    let seen = state.requests.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0.as_deref(), Some("Bearer token-1"));
    assert_eq!(seen[0].1, sample_request());
}

#[tokio::test]
async fn test_remote_without_api_key_sends_no_auth() {
    let state = Arc::new(StubState::default());
    let app = Router::new()
        .route("/optimize", post(optimize_handler))
        .with_state(state.clone());
    let addr = spawn_stub(app).await;

    let remote = RemoteOptimizer::new(format!("http://{}", addr), None);
    remote.optimize(sample_request()).await.unwrap();

    assert_eq!(state.requests.lock().unwrap()[0].0, None);
}

#[tokio::test]
async fn test_remote_server_error_is_surfaced() {
    let app = Router::new().route(
        "/optimize",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "solver crashed") }),
    );
    let addr = spawn_stub(app).await;

    let remote = RemoteOptimizer::new(format!("http://{}", addr), None);
    let err = remote.optimize(sample_request()).await.unwrap_err();

    assert!(matches!(err, DesignerError::Optimizer(ref msg) if msg.contains("500")));
}

#[tokio::test]
async fn test_wire_format_uses_camel_case_keys() {
    let seen: Arc<Mutex<Option<serde_json::Value>>> = Arc::default();
    let sink = seen.clone();
    let app = Router::new().route(
        "/optimize",
        post(move |Json(body): Json<serde_json::Value>| async move {
            *sink.lock().unwrap() = Some(body);
            Json(json!({
                "rankedDesigns": [{"cost": 0.5, "values": [1.0, 0.5]}],
                "convergenceTrace": [{"generation": 3, "bestCost": 0.5, "averageCost": 0.9}],
                "bestComposition": [{"property": "bulk_modulus", "contribution": 0.7}]
            }))
        }),
    );
    let addr = spawn_stub(app).await;

    let remote = RemoteOptimizer::new(format!("http://{}", addr), None);
    let result = remote.optimize(sample_request()).await.unwrap();

    assert_eq!(
        seen.lock().unwrap().clone().unwrap(),
        json!({
            "materials": [{
                "name": "mat_0",
                "properties": [{"property": "bulk_modulus", "lowerBound": 10.0, "upperBound": 90.0}]
            }],
            "mixtures": [{
                "name": "mixture",
                "properties": [{"property": "bulk_modulus", "desiredValue": 42.0}]
            }]
        })
    );
    assert_eq!(result.convergence_trace[0].average_cost, 0.9);
    assert_eq!(result.best_composition[0].contribution, 0.7);
}
