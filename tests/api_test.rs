mod helpers;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use helpers::{body_json, get, send_json, test_app, test_config};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn health_reports_version() {
    let dir = tempfile::tempdir().unwrap();
    let response = get(test_app(dir.path()), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn ritual_crud_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = send_json(
        app.clone(),
        Method::POST,
        "/api/rituals",
        json!({"name": "Spiral", "description": "turns", "ritual_type": "deduction"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["id"].as_i64().unwrap();

    // alias route sees the same rows
    let listed = body_json(get(app.clone(), "/api/gene/rituals").await).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let response = send_json(
        app.clone(),
        Method::PUT,
        &format!("/api/rituals/{id}"),
        json!({"description": "turns inward"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["name"], "Spiral");
    assert_eq!(updated["description"], "turns inward");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri(format!("/api/rituals/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(app, &format!("/api/rituals/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[tokio::test]
async fn duplicate_and_blank_rituals_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let first = send_json(app.clone(), Method::POST, "/api/rituals", json!({"name": "Echo"})).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let dup = send_json(app.clone(), Method::POST, "/api/rituals", json!({"name": "Echo"})).await;
    assert_eq!(dup.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(dup).await["code"], "CONFLICT");

    let blank = send_json(app, Method::POST, "/api/rituals", json!({"name": "  "})).await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(blank).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn vault_routes_read_flat_files() {
    let dir = tempfile::tempdir().unwrap();
    let sigils = dir.path().join("sigils");
    std::fs::create_dir_all(&sigils).unwrap();
    std::fs::write(
        sigils.join("a.json"),
        r#"[{"name": "x", "vector": [1.0]}, {"name": "y", "vector": [2.0]}]"#,
    )
    .unwrap();
    std::fs::write(sigils.join("b.json"), r#"[{"name": "x", "vector": [1.5]}]"#).unwrap();
    std::fs::write(sigils.join("bad.json"), "{}").unwrap();
    let app = test_app(dir.path());

    let names = body_json(get(app.clone(), "/api/vault/sigils").await).await;
    assert_eq!(names, json!(["a", "b", "bad"]));

    let glyphs = body_json(get(app.clone(), "/api/vault/sigils/a").await).await;
    assert_eq!(glyphs[1]["name"], "y");

    let diff = body_json(get(app.clone(), "/api/vault/diff?a=a&b=b").await).await;
    assert_eq!(diff["only_in_a"], json!(["y"]));
    assert_eq!(diff["differing"], json!(["x"]));
    assert_eq!(diff["identical"], false);

    let same = body_json(get(app.clone(), "/api/vault/diff?a=b&b=b").await).await;
    assert_eq!(same["identical"], true);
    assert_eq!(same["unchanged"], json!(["x"]));

    let missing = get(app.clone(), "/api/vault/sigils/nope").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let bad = get(app, "/api/vault/sigils/bad").await;
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(bad).await["code"], "INVALID_VAULT_DATA");
}

#[tokio::test]
async fn malformed_requests_use_the_error_payload() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let missing_name = send_json(app.clone(), Method::POST, "/api/rituals", json!({})).await;
    assert_eq!(missing_name.status(), StatusCode::BAD_REQUEST);
    let body = body_json(missing_name).await;
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(body["error"].as_str().unwrap().contains("name"));

    let bad_id = get(app.clone(), "/api/rituals/abc").await;
    assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(bad_id).await["code"], "BAD_REQUEST");

    let half_query = get(app.clone(), "/api/vault/diff?a=x").await;
    assert_eq!(half_query.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(half_query).await["code"], "BAD_REQUEST");

    let not_json = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/compress")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(not_json.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(not_json).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn database_vault_routes_start_empty() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let glyphs = body_json(get(app.clone(), "/api/vault/glyphs/evolved").await).await;
    assert_eq!(glyphs, json!([]));

    let stats = body_json(get(app.clone(), "/api/vault/stats").await).await;
    assert_eq!(stats["total_glyphs"], 0);

    let meta = get(app.clone(), "/api/vault/metadata").await;
    assert_eq!(meta.status(), StatusCode::NOT_FOUND);

    let bad_type = get(app, "/api/vault/glyphs?glyph_type=ancient").await;
    assert_eq!(bad_type.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn dream_loop_then_drift() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let empty = body_json(get(app.clone(), "/api/drift/status").await).await;
    assert_eq!(empty["status"], "empty");

    let response = send_json(app.clone(), Method::POST, "/api/dream-loop", json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report["status"], "success");
    assert_eq!(report["evolved_glyphs"], 3);

    // fresh seeds have no lineage, so every one is unlinked
    let drift = body_json(get(app, "/api/drift/status?sigil=default").await).await;
    assert_eq!(drift["status"], "ok");
    assert_eq!(drift["total"], 3);
    for entry in drift["drifted"].as_array().unwrap() {
        assert!(entry["categories"]
            .as_array()
            .unwrap()
            .contains(&json!("Unlinked")));
    }
}

#[tokio::test]
async fn compress_and_refine() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = send_json(
        app.clone(),
        Method::POST,
        "/api/compress",
        json!({"text": "Could you   utilize the vault system", "teach": "demo"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["text"], "use the vault");

    let ledger = std::fs::read_to_string(dir.path().join("ledger").join("ledger.jsonl")).unwrap();
    assert!(ledger.contains("\"label\":\"demo\""));

    let response = send_json(
        app,
        Method::POST,
        "/api/refine-script",
        json!({"script": "run()", "feedback": {"rating": 5, "comments": "needs docs"}}),
    )
    .await;
    let body = body_json(response).await;
    assert_eq!(
        body["refined_script"],
        "run()\n\n# 📚 Add inline documentation or usage comments"
    );
}

#[tokio::test]
async fn assistant_logs_interactions() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = send_json(
        app.clone(),
        Method::POST,
        "/api/assistant/respond",
        json!({"prompt": "how many glyphs?", "context": {"page": "glyphs", "glyphs": 12}}),
    )
    .await;
    let reply = body_json(response).await;
    assert_eq!(reply["offline"], false);
    assert_eq!(reply["ritual_hint"], "Your vault currently contains 12 glyphs.");

    let status = body_json(get(app.clone(), "/api/assistant/status").await).await;
    assert_eq!(status["recent_interactions"], 1);
    assert_eq!(status["last_interaction"]["prompt"], "how many glyphs?");

    let invoked = body_json(
        send_json(app, Method::POST, "/api/gene/invoke", json!({"prompt": "hello"})).await,
    )
    .await;
    assert_eq!(invoked["from"], "Gene");
    assert_eq!(invoked["output"], "🧠 Gene is reflecting on: 'hello'...");
}

#[tokio::test]
async fn sync_routes_report_progress() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let run = body_json(get(app.clone(), "/api/sync/vault").await).await;
    assert_eq!(run["status"], "success");
    assert_eq!(run["data"]["a0_saved"], true);

    let status = body_json(get(app.clone(), "/api/sync/status").await).await;
    assert_eq!(status["status"], "ready");
    assert_eq!(status["vaults"]["a0"], true);

    let logs = body_json(get(app, "/api/sync/logs?limit=1").await).await;
    assert_eq!(logs["showing_last"], 1);
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(test_config(dir.path()).server.cors_origins, vec!["http://localhost:3000"]);

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/rituals")
        .header("Origin", "http://localhost:3000")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .body(Body::empty())
        .unwrap();
    let response = test_app(dir.path()).oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "http://localhost:3000"
    );
    assert_eq!(
        response.headers().get("access-control-allow-credentials").unwrap(),
        "true"
    );
}
