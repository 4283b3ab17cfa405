use super::*;

use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::json;
use shared::{domain::HealthParameter, error::UploadError, protocol::UPLOAD_FIELD_NAME};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone)]
struct ReceivedPart {
    field: String,
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Clone, Default)]
struct UploadServerState {
    received: Arc<Mutex<Vec<ReceivedPart>>>,
}

async fn handle_upload(
    State(state): State<UploadServerState>,
    mut multipart: Multipart,
) -> Json<serde_json::Value> {
    while let Some(field) = multipart.next_field().await.expect("next field") {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.expect("field bytes").to_vec();
        state.received.lock().await.push(ReceivedPart {
            field: name,
            file_name,
            content_type,
            bytes,
        });
    }

    Json(json!([
        {"parameter": "Blood Glucose", "value": "120", "unit": "mg/dL", "range": "70-110"},
        {"parameter": "Hemoglobin", "value": 13.1, "unit": "g/dL", "range": "12.0-16.0"},
        {"parameter": "Impression", "value": "Mild hyperglycemia", "unit": "", "range": ""}
    ]))
}

async fn spawn_analysis_server() -> Result<(String, UploadServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = UploadServerState::default();
    let app = Router::new()
        .route("/api/v1/upload", post(handle_upload))
        .route(
            "/failing/upload",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        )
        .route("/html/upload", post(|| async { "<html>busy</html>" }))
        .route(
            "/object/upload",
            post(|| async { Json(json!({"detail": "no parameters"})) }),
        )
        .route("/empty/upload", post(|| async { Json(json!([])) }))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

fn report_pdf() -> SelectedFile {
    SelectedFile::new("report.pdf", b"%PDF-1.4 Blood Glucose 120".to_vec())
}

#[tokio::test]
async fn http_transport_posts_single_file_part() {
    let (server_url, state) = spawn_analysis_server().await.expect("spawn server");
    let transport = HttpUploadTransport::new(format!("{server_url}/api/v1/upload"));

    let rows = transport.upload(&report_pdf()).await.expect("upload");

    assert_eq!(
        rows,
        vec![
            HealthParameter::new("Blood Glucose", "120", "mg/dL", "70-110"),
            HealthParameter::new("Hemoglobin", "13.1", "g/dL", "12.0-16.0"),
            HealthParameter::new("Impression", "Mild hyperglycemia", "", ""),
        ]
    );

    let received = state.received.lock().await;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].field, UPLOAD_FIELD_NAME);
    assert_eq!(received[0].file_name.as_deref(), Some("report.pdf"));
    assert_eq!(received[0].content_type.as_deref(), Some("application/pdf"));
    assert_eq!(received[0].bytes, b"%PDF-1.4 Blood Glucose 120");
}

#[tokio::test]
async fn controller_renders_rows_from_analysis_service() {
    let (server_url, _state) = spawn_analysis_server().await.expect("spawn server");
    let controller = UploadController::new(
        HttpUploadTransport::new(format!("{server_url}/api/v1/upload")),
        NoticeBoard::new(),
    );
    controller.select_file(report_pdf()).expect("select");

    assert_eq!(
        controller.submit().await,
        SubmitOutcome::Succeeded { rows: 3 }
    );

    let view = controller.result_view();
    let insights: Vec<_> = view.rows().iter().map(|row| row.insight()).collect();
    assert_eq!(
        insights,
        [Insight::NeedsAttention, Insight::Normal, Insight::Normal]
    );
    assert_eq!(controller.state().selected_file(), None);
}

#[tokio::test]
async fn server_error_status_is_a_transport_failure() {
    let (server_url, _state) = spawn_analysis_server().await.expect("spawn server");
    let controller = UploadController::new(
        HttpUploadTransport::new(format!("{server_url}/failing/upload")),
        NoticeBoard::new(),
    );
    controller.select_file(report_pdf()).expect("select");

    assert_eq!(
        controller.submit().await,
        SubmitOutcome::Failed(UploadError::Status { status: 500 })
    );
    let state = controller.state();
    assert_eq!(state.phase(), UploadPhase::Failed);
    assert_eq!(state.selected_file(), Some(&report_pdf()));
    assert_eq!(controller.result_view(), ResultView::NoSubmission);
    assert_eq!(
        controller.notices().current().map(|n| n.kind),
        Some(NoticeKind::Error)
    );
}

#[tokio::test]
async fn non_json_or_non_array_body_is_a_decode_failure() {
    let (server_url, _state) = spawn_analysis_server().await.expect("spawn server");

    for path in ["html", "object"] {
        let transport = HttpUploadTransport::new(format!("{server_url}/{path}/upload"));
        let err = transport
            .upload(&report_pdf())
            .await
            .expect_err("must fail");
        assert!(matches!(err, UploadError::Decode(_)), "{path}: {err:?}");
    }
}

#[tokio::test]
async fn empty_array_is_a_successful_upload() {
    let (server_url, _state) = spawn_analysis_server().await.expect("spawn server");
    let controller = UploadController::new(
        HttpUploadTransport::new(format!("{server_url}/empty/upload")),
        NoticeBoard::new(),
    );
    controller.select_file(report_pdf()).expect("select");

    assert_eq!(
        controller.submit().await,
        SubmitOutcome::Succeeded { rows: 0 }
    );
    assert_eq!(controller.result_view(), ResultView::Empty);
}

#[tokio::test]
async fn unreachable_service_is_a_network_failure() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let transport = HttpUploadTransport::with_timeout(
        format!("http://{addr}/api/v1/upload"),
        Duration::from_secs(5),
    )
    .expect("client");
    let err = transport
        .upload(&report_pdf())
        .await
        .expect_err("must fail");

    assert!(matches!(err, UploadError::Network(_)), "{err:?}");
    assert!(err.user_message().starts_with("Upload error: "));
}

#[tokio::test]
async fn malformed_content_type_fails_before_sending() {
    let (server_url, state) = spawn_analysis_server().await.expect("spawn server");
    let transport = HttpUploadTransport::new(format!("{server_url}/api/v1/upload"));
    let file = report_pdf().with_mime_type("not a mime");

    let err = transport.upload(&file).await.expect_err("must fail");

    assert_eq!(
        err,
        UploadError::ContentType {
            mime_type: "not a mime".into()
        }
    );
    assert!(state.received.lock().await.is_empty());
}

#[tokio::test]
async fn load_file_names_selection_after_path() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = std::env::temp_dir().join(format!("healthify_load_file_test_{suffix}"));
    std::fs::create_dir_all(&temp_root).expect("temp root");
    let path = temp_root.join("cbc.png");
    std::fs::write(&path, [0x89, b'P', b'N', b'G']).expect("write");

    let file = load_file(&path).await.expect("load");
    assert_eq!(file.name, "cbc.png");
    assert_eq!(file.mime_type, "image/png");
    assert_eq!(file.bytes, [0x89, b'P', b'N', b'G']);

    assert!(load_file(&temp_root.join("missing.pdf")).await.is_err());
    std::fs::remove_dir_all(temp_root).expect("cleanup");
}

#[test]
fn http_transport_uses_configured_url() {
    let settings = ClientSettings {
        upload_url: "http://analysis.internal:9000/api/v1/upload".into(),
        ..ClientSettings::default()
    };
    let transport = http_transport(&settings).expect("transport");
    assert_eq!(transport.upload_url(), settings.upload_url);
}
