use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tabular_sync::store::memory::{MeasureDefinitionSeed, MemoryModel, MemoryTable};
use tabular_sync::{MeasureRef, MemoryModelServer, UpdateError, UpdateOutcome, UpdateState};
use tokio::net::TcpListener;

// Test client wrapper for making API calls
struct TestClient {
    client: Client,
    base_url: String,
}

impl TestClient {
    fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    async fn post(&self, path: &str, json: Value) -> reqwest::Result<reqwest::Response> {
        self.client
            .post(&format!("{}{}", self.base_url, path))
            .json(&json)
            .send()
            .await
    }

    async fn get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client
            .get(&format!("{}{}", self.base_url, path))
            .send()
            .await
    }
}

fn sales_model() -> MemoryModel {
    MemoryModel {
        name: "Model1".to_string(),
        version: 7,
        last_update: chrono::Utc::now(),
        tables: vec![MemoryTable {
            name: "Sales".to_string(),
            measures: vec![
                MeasureDefinitionSeed {
                    name: "Total".to_string(),
                    expression: "SUM ( Sales[Amount] )".to_string(),
                },
                MeasureDefinitionSeed {
                    name: "Count".to_string(),
                    expression: "COUNTROWS ( Sales )".to_string(),
                },
            ],
        }],
    }
}

/// Serve the app on an ephemeral port and return its base URL
async fn spawn_app(server: MemoryModelServer) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let address = listener.local_addr().expect("No local address");
    let app = tabular_sync::app(server, "Data Source=localhost;Initial Catalog=Model1");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    format!("http://{}", address)
}

async fn current_etag(client: &TestClient, database: &str) -> String {
    let response = client
        .get(&format!("/databases/{}", database))
        .await
        .expect("Failed to fetch database");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Invalid database JSON");
    body["etag"].as_str().expect("Missing etag").to_string()
}

#[tokio::test]
async fn test_measure_update_workflow() {
    let engine = MemoryModelServer::with_models([sales_model()]);
    let client = TestClient::new(spawn_app(engine.clone()).await);

    // Health
    let health = client.get("/health").await.expect("Health request failed");
    assert!(health.status().is_success());

    // Browse
    let etag = current_etag(&client, "Model1").await;
    assert_eq!(etag, engine.snapshot("Model1").unwrap().etag());

    let listing: Value = client
        .get("/databases/Model1/measures")
        .await
        .expect("Failed to list measures")
        .json()
        .await
        .expect("Invalid listing JSON");
    assert_eq!(listing["database"]["etag"], json!(etag));
    assert_eq!(listing["measures"].as_array().unwrap().len(), 2);
    assert_eq!(listing["measures"][0]["tableName"], "Sales");
    assert_eq!(listing["measures"][0]["name"], "Count");

    // Submit an edit rendered against the current ETag
    let response = client
        .post(
            "/databases/Model1/measures",
            json!({
                "measures": [{
                    "tableName": "Sales",
                    "name": "Total",
                    "expression": "SUM(Sales[Amount])",
                    "etag": etag,
                    "errors": []
                }]
            }),
        )
        .await
        .expect("Update request failed");
    assert_eq!(response.status(), StatusCode::OK);
    let outcome: UpdateOutcome = response.json().await.expect("Invalid outcome JSON");
    assert_eq!(outcome.state, UpdateState::Committed);
    assert_eq!(outcome.applied_count, 1);
    assert!(outcome.committed);
    assert_eq!(
        engine
            .expression("Model1", &MeasureRef::new("Sales", "Total"))
            .as_deref(),
        Some("SUM(Sales[Amount])")
    );

    // The same ETag is now stale
    let response = client
        .post(
            "/databases/Model1/measures",
            json!({
                "measures": [{
                    "tableName": "Sales",
                    "name": "Count",
                    "expression": "COUNTROWS(Sales)",
                    "etag": etag
                }]
            }),
        )
        .await
        .expect("Update request failed");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let outcome: UpdateOutcome = response.json().await.expect("Invalid outcome JSON");
    assert_eq!(outcome.state, UpdateState::ConflictAborted);
    assert_eq!(outcome.applied_count, 0);
    assert_eq!(
        outcome.failure,
        Some(UpdateError::Conflict {
            measure: MeasureRef::new("Sales", "Count")
        })
    );

    // Refetch and retry; the entry with formatting errors is skipped
    let fresh = current_etag(&client, "Model1").await;
    assert_ne!(fresh, etag);
    let response = client
        .post(
            "/databases/Model1/measures",
            json!({
                "measures": [
                    {
                        "tableName": "Sales",
                        "name": "Count",
                        "expression": "COUNTROWS(Sales)",
                        "etag": fresh
                    },
                    {
                        "tableName": "Sales",
                        "name": "Total",
                        "expression": "SUM(Sales[Amount]",
                        "etag": fresh,
                        "errors": ["(1, 18) Syntax error: missing ')'"]
                    }
                ]
            }),
        )
        .await
        .expect("Update request failed");
    assert_eq!(response.status(), StatusCode::OK);
    let outcome: UpdateOutcome = response.json().await.expect("Invalid outcome JSON");
    assert_eq!(outcome.applied_count, 1);
    assert_eq!(outcome.skipped_count, 1);
    assert_eq!(
        engine
            .expression("Model1", &MeasureRef::new("Sales", "Total"))
            .as_deref(),
        Some("SUM(Sales[Amount])")
    );
    assert_eq!(engine.open_sessions(), 0);
}

#[tokio::test]
async fn test_unknown_database_is_not_found() {
    let client = TestClient::new(spawn_app(MemoryModelServer::with_models([sales_model()])).await);

    let response = client.get("/databases/Missing").await.expect("Request failed");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.expect("Invalid error JSON");
    assert_eq!(body["problem"], "database_not_found");

    let response = client
        .post("/databases/Missing/measures", json!({ "measures": [] }))
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let outcome: UpdateOutcome = response.json().await.expect("Invalid outcome JSON");
    assert_eq!(outcome.state, UpdateState::Failed);
}

#[tokio::test]
async fn test_save_failure_reports_engine_diagnostics() {
    let engine = MemoryModelServer::with_models([sales_model()]);
    let client = TestClient::new(spawn_app(engine.clone()).await);
    let etag = current_etag(&client, "Model1").await;

    let response = client
        .post(
            "/databases/Model1/measures",
            json!({
                "measures": [{
                    "tableName": "Sales",
                    "name": "Total",
                    "expression": "SUM(Sales[Amount]",
                    "etag": etag
                }]
            }),
        )
        .await
        .expect("Update request failed");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let outcome: UpdateOutcome = response.json().await.expect("Invalid outcome JSON");
    assert_eq!(outcome.state, UpdateState::Failed);
    match outcome.failure {
        Some(UpdateError::UpdateFailed { message }) => {
            assert!(message.contains("Measure 'Sales'[Total]"));
            assert!(message.contains("unclosed '('"));
        }
        other => panic!("Expected an update failure, got {:?}", other),
    }
    assert_eq!(engine.snapshot("Model1").unwrap().version, 7);
}
