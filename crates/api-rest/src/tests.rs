//! Router-level tests driving the full axum app.

use crate::{router, AppState};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use base64::Engine;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use simward_core::model::*;
use simward_core::{EntityStore, MemoryStore};
use simward_files::BlobStore;
use simward_uuid::RecordId;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct Fixture {
    app: Router,
    store: Arc<MemoryStore>,
    // keeps the blob directory alive for the duration of the test
    _data_dir: TempDir,
    admin: User,
    instructor: User,
    student_a: User,
    student_b: User,
    group_a: Group,
    group_b: Group,
    session: Session,
    patient: Patient,
}

fn fixture() -> Fixture {
    let data_dir = TempDir::new().expect("temp dir");
    let store = Arc::new(MemoryStore::new());
    let blobs = Arc::new(BlobStore::open(data_dir.path()).expect("blob store"));
    let app = router(AppState::new(store.clone(), blobs));

    let admin = store
        .create_user(NewUser {
            username: "admin".into(),
            password: "admin-pw".into(),
            role: Role::Admin,
            first_name: "Avery".into(),
            last_name: "Quinn".into(),
        })
        .unwrap();
    let instructor = store
        .create_user(NewUser {
            username: "instructor".into(),
            password: "instructor-pw".into(),
            role: Role::Instructor,
            first_name: "Indra".into(),
            last_name: "Shaw".into(),
        })
        .unwrap();
    let student_a = store
        .create_user(NewUser {
            username: "group-a".into(),
            password: "pw-a".into(),
            role: Role::Student,
            first_name: "Group".into(),
            last_name: "A".into(),
        })
        .unwrap();
    let student_b = store
        .create_user(NewUser {
            username: "group-b".into(),
            password: "pw-b".into(),
            role: Role::Student,
            first_name: "Group".into(),
            last_name: "B".into(),
        })
        .unwrap();

    let session = store
        .create_session(NewSession {
            name: "Acute week".into(),
            instructor_id: instructor.id,
            active: true,
            time_remaining_secs: 3600,
        })
        .unwrap();
    let group_a = store
        .create_group(NewGroup {
            name: "Group A".into(),
            session_id: session.id,
        })
        .unwrap();
    let group_b = store
        .create_group(NewGroup {
            name: "Group B".into(),
            session_id: session.id,
        })
        .unwrap();
    store.add_group_member(group_a.id, student_a.id).unwrap();
    store.add_group_member(group_b.id, student_b.id).unwrap();

    let patient = store
        .create_patient(NewPatient {
            first_name: "Margaret".into(),
            last_name: "Hollis".into(),
            age: Some(67),
            sex: Some("F".into()),
            status: PatientStatus::Critical,
            chief_complaint: "Chest pain".into(),
            session_id: Some(session.id),
        })
        .unwrap();

    let version = store
        .create_data_version(NewDataVersion {
            name: "v1".into(),
            description: None,
        })
        .unwrap();
    store
        .create_group_data_assignment(NewGroupDataAssignment {
            group_id: group_a.id,
            data_version_id: version.id,
            patient_id: patient.id,
        })
        .unwrap();

    Fixture {
        app,
        store,
        _data_dir: data_dir,
        admin,
        instructor,
        student_a,
        student_b,
        group_a,
        group_b,
        session,
        patient,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("request");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    };
    (status, value)
}

fn get(path: &str, user: Option<RecordId>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user.to_string());
    }
    builder.body(Body::empty()).expect("request")
}

fn json_request(
    method: &str,
    path: &str,
    user: Option<RecordId>,
    body: Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(user) = user {
        builder = builder.header("x-user-id", user.to_string());
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request")
}

#[tokio::test]
async fn health_is_open() {
    let f = fixture();
    let (status, body) = send(&f.app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
}

#[tokio::test]
async fn login_round_trip_and_indistinguishable_failures() {
    let f = fixture();

    let (status, body) = send(
        &f.app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({"username": "instructor", "password": "instructor-pw"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], json!("instructor"));
    assert!(body["user"].get("password").is_none());

    let (wrong_status, wrong_body) = send(
        &f.app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({"username": "instructor", "password": "bad"}),
        ),
    )
    .await;
    let (ghost_status, ghost_body) = send(
        &f.app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({"username": "nobody", "password": "instructor-pw"}),
        ),
    )
    .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(ghost_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, ghost_body);
}

#[tokio::test]
async fn missing_user_header_is_unauthenticated() {
    let f = fixture();
    let (status, _) = send(&f.app, get("/api/patients", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn patient_listing_is_group_scoped() {
    let f = fixture();

    // staff see every patient
    let (status, body) = send(&f.app, get("/api/patients", Some(f.instructor.id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(1));

    // group A has an assignment for the patient
    let (_, body_a) = send(&f.app, get("/api/patients", Some(f.student_a.id))).await;
    assert_eq!(body_a["count"], json!(1));

    // group B has none
    let (_, body_b) = send(&f.app, get("/api/patients", Some(f.student_b.id))).await;
    assert_eq!(body_b["count"], json!(0));
}

#[tokio::test]
async fn patient_detail_enforces_assignment() {
    let f = fixture();
    let path = format!("/api/patients/{}", f.patient.id);

    let (ok_status, _) = send(&f.app, get(&path, Some(f.student_a.id))).await;
    assert_eq!(ok_status, StatusCode::OK);

    let (forbidden, _) = send(&f.app, get(&path, Some(f.student_b.id))).await;
    assert_eq!(forbidden, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn patient_create_requires_staff() {
    let f = fixture();
    let body = json!({
        "first_name": "New",
        "last_name": "Patient",
        "status": "stable",
        "chief_complaint": "Headache"
    });

    let (forbidden, _) = send(
        &f.app,
        json_request("POST", "/api/patients", Some(f.student_a.id), body.clone()),
    )
    .await;
    assert_eq!(forbidden, StatusCode::FORBIDDEN);

    let (created, created_body) = send(
        &f.app,
        json_request("POST", "/api/patients", Some(f.instructor.id), body),
    )
    .await;
    assert_eq!(created, StatusCode::CREATED);
    assert_eq!(created_body["status"], json!("stable"));
}

#[tokio::test]
async fn delete_patient_returns_404_on_missing() {
    let f = fixture();
    let path = format!("/api/patients/{}", f.patient.id);

    let (first, _) = send(
        &f.app,
        Request::builder()
            .method("DELETE")
            .uri(&path)
            .header("x-user-id", f.instructor.id.to_string())
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(first, StatusCode::NO_CONTENT);

    let (second, _) = send(
        &f.app,
        Request::builder()
            .method("DELETE")
            .uri(&path)
            .header("x-user-id", f.instructor.id.to_string())
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(second, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn asset_visibility_scenario() {
    let f = fixture();

    // instructor uploads an asset into the session
    let content = base64::engine::general_purpose::STANDARD.encode(b"slide deck");
    let (status, asset) = send(
        &f.app,
        json_request(
            "POST",
            &format!("/api/sessions/{}/assets", f.session.id),
            Some(f.instructor.id),
            json!({"filename": "slides.pdf", "kind": "handout", "content_base64": content}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let asset_id = asset["id"].as_str().unwrap().to_owned();

    // no row yet: group A sees nothing
    let (_, assets) = send(
        &f.app,
        get(
            &format!("/api/groups/{}/assets", f.group_a.id),
            Some(f.student_a.id),
        ),
    )
    .await;
    assert_eq!(assets.as_array().unwrap().len(), 0);

    // grant to group A
    let (status, row) = send(
        &f.app,
        json_request(
            "PUT",
            &format!("/api/assets/{}/visibility/{}", asset_id, f.group_a.id),
            Some(f.instructor.id),
            json!({"visible": true}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(row["visible"], json!(true));

    // group A sees it, group B does not
    let (_, assets_a) = send(
        &f.app,
        get(
            &format!("/api/groups/{}/assets", f.group_a.id),
            Some(f.student_a.id),
        ),
    )
    .await;
    assert_eq!(assets_a.as_array().unwrap().len(), 1);

    let (_, assets_b) = send(
        &f.app,
        get(
            &format!("/api/groups/{}/assets", f.group_b.id),
            Some(f.student_b.id),
        ),
    )
    .await;
    assert_eq!(assets_b.as_array().unwrap().len(), 0);

    // group B's student cannot read group A's asset list
    let (foreign, _) = send(
        &f.app,
        get(
            &format!("/api/groups/{}/assets", f.group_a.id),
            Some(f.student_b.id),
        ),
    )
    .await;
    assert_eq!(foreign, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn observation_bundle_round_trip() {
    let f = fixture();
    let path = format!("/api/patients/{}/observations", f.patient.id);

    let (status, created) = send(
        &f.app,
        json_request(
            "POST",
            &path,
            Some(f.student_a.id),
            json!({"heart_rate": {"rate": 91}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["heart_rates"].as_array().unwrap().len(), 1);
    assert_eq!(created["blood_pressures"].as_array().unwrap().len(), 0);

    let (_, listed) = send(
        &f.app,
        get(&format!("{}?ordering=-created_at", path), Some(f.student_a.id)),
    )
    .await;
    assert_eq!(listed["heart_rates"][0]["rate"], json!(91));
}

#[tokio::test]
async fn investigation_approval_gates_file_access() {
    let f = fixture();

    // instructor uploads a paginated patient file
    let content = base64::engine::general_purpose::STANDARD.encode(b"%PDF-1.4 report");
    let (status, file) = send(
        &f.app,
        json_request(
            "POST",
            &format!("/api/patients/{}/files", f.patient.id),
            Some(f.instructor.id),
            json!({
                "display_name": "FBC report",
                "category": "lab_report",
                "requires_pagination": true,
                "content_base64": content
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let file_id = file["id"].as_str().unwrap().to_owned();

    // group A raises a request
    let (status, request) = send(
        &f.app,
        json_request(
            "POST",
            &format!("/api/patients/{}/blood-test-requests", f.patient.id),
            Some(f.student_a.id),
            json!({"test_types": ["full_blood_count"], "details": "?anaemia"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["status"], json!("pending"));
    let request_id = request["id"].as_str().unwrap().to_owned();

    // before approval the file is gated
    let view_path = format!("/api/files/{}/view?page_range=1-3", file_id);
    let (gated, _) = send(&f.app, get(&view_path, Some(f.student_a.id))).await;
    assert_eq!(gated, StatusCode::FORBIDDEN);

    // approving without the mandatory page range is a 400
    let (bad, _) = send(
        &f.app,
        json_request(
            "PATCH",
            &format!("/api/blood-test-requests/{}", request_id),
            Some(f.instructor.id),
            json!({"status": "completed", "approved_files": [{"file_id": file_id}]}),
        ),
    )
    .await;
    assert_eq!(bad, StatusCode::BAD_REQUEST);

    // proper approval
    let (done, completed) = send(
        &f.app,
        json_request(
            "PATCH",
            &format!("/api/blood-test-requests/{}", request_id),
            Some(f.instructor.id),
            json!({
                "status": "completed",
                "approved_files": [{"file_id": file_id, "page_range": "1-3"}],
                "signed_off_name": "Dr Reed",
                "signed_off_role": "Consultant"
            }),
        ),
    )
    .await;
    assert_eq!(done, StatusCode::OK);
    assert_eq!(completed["status"], json!("completed"));

    // the requesting group can now view the approved pages
    let (ok, _) = send(&f.app, get(&view_path, Some(f.student_a.id))).await;
    assert_eq!(ok, StatusCode::OK);

    // pages outside the grant stay forbidden
    let (outside, _) = send(
        &f.app,
        get(
            &format!("/api/files/{}/view?page_range=1-5", file_id),
            Some(f.student_a.id),
        ),
    )
    .await;
    assert_eq!(outside, StatusCode::FORBIDDEN);

    // another group's student is rejected outright
    let (foreign, _) = send(&f.app, get(&view_path, Some(f.student_b.id))).await;
    assert_eq!(foreign, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_namespace_is_role_guarded() {
    let f = fixture();

    let (forbidden, _) = send(&f.app, get("/api/admin/users", Some(f.student_a.id))).await;
    assert_eq!(forbidden, StatusCode::FORBIDDEN);

    let (ok, body) = send(&f.app, get("/api/admin/users", Some(f.admin.id))).await;
    assert_eq!(ok, StatusCode::OK);
    assert_eq!(body["count"], json!(4));
}

#[tokio::test]
async fn document_release_lifecycle() {
    let f = fixture();

    let (_, document) = send(
        &f.app,
        json_request(
            "POST",
            "/api/coordinator/documents",
            Some(f.admin.id),
            json!({"title": "Handout", "session_id": f.session.id.to_string()}),
        ),
    )
    .await;
    let document_id = document["id"].as_str().unwrap().to_owned();

    // scheduled release stays pending and invisible
    let (status, release) = send(
        &f.app,
        json_request(
            "POST",
            "/api/coordinator/document-releases",
            Some(f.admin.id),
            json!({
                "document_id": document_id,
                "group_id": f.group_a.id.to_string(),
                "scheduled_at": "2026-09-01T09:00:00Z"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(release["status"], json!("pending"));
    let release_id = release["id"].as_str().unwrap().to_owned();

    let (_, docs) = send(
        &f.app,
        get(
            &format!("/api/groups/{}/documents", f.group_a.id),
            Some(f.student_a.id),
        ),
    )
    .await;
    assert_eq!(docs.as_array().unwrap().len(), 0);

    // perform the release; the document appears for the group
    let (performed, released) = send(
        &f.app,
        json_request(
            "POST",
            &format!("/api/coordinator/document-releases/{}/release", release_id),
            Some(f.admin.id),
            Value::Null,
        ),
    )
    .await;
    assert_eq!(performed, StatusCode::OK);
    assert_eq!(released["status"], json!("released"));

    let (_, docs_after) = send(
        &f.app,
        get(
            &format!("/api/groups/{}/documents", f.group_a.id),
            Some(f.student_a.id),
        ),
    )
    .await;
    assert_eq!(docs_after.as_array().unwrap().len(), 1);

    // a released release cannot be cancelled
    let (cancel, _) = send(
        &f.app,
        json_request(
            "POST",
            &format!("/api/coordinator/document-releases/{}/cancel", release_id),
            Some(f.admin.id),
            Value::Null,
        ),
    )
    .await;
    assert_eq!(cancel, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_record_id_is_rejected() {
    let f = fixture();
    let (status, _) = send(
        &f.app,
        get("/api/patients/not-a-real-id", Some(f.instructor.id)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sessions_are_listed_with_envelope() {
    let f = fixture();
    let (status, sessions) = send(&f.app, get("/api/sessions", Some(f.instructor.id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sessions["count"], json!(1));
    assert_eq!(sessions["results"][0]["name"], json!("Acute week"));
    assert!(f.store.get_group(f.group_b.id).unwrap().is_some());
}
