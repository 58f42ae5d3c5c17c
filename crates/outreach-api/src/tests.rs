//! Router tests driven with `tower::ServiceExt::oneshot` against an
//! in-memory store and a temporary upload directory.

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use outreach_core::{
  events::EncounterEvent, normalize::Normalizer, service::EncounterService,
};
use outreach_store_sqlite::{DiskBlobStore, SqliteStore};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt as _;
use uuid::Uuid;

use super::*;

const BASE: &str = "http://localhost:3000/api/v1";
const BOUNDARY: &str = "outreach-test-boundary";

type State = AppState<SqliteStore, DiskBlobStore>;

async fn make_state() -> (State, TempDir) {
  let dir = tempfile::tempdir().unwrap();
  let store = SqliteStore::open_in_memory().await.unwrap();
  let blobs = DiskBlobStore::open(dir.path()).await.unwrap();
  let service = EncounterService::new(store, blobs, Normalizer::new(BASE));
  (AppState::new(service), dir)
}

async fn send(
  state: &State,
  method: &str,
  uri: &str,
  content_type: Option<&str>,
  body: Vec<u8>,
) -> Response {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(ct) = content_type {
    builder = builder.header(header::CONTENT_TYPE, ct);
  }
  let req = builder.body(Body::from(body)).unwrap();
  router(state.clone()).oneshot(req).await.unwrap()
}

async fn send_json(state: &State, method: &str, uri: &str, body: Value) -> Response {
  send(
    state,
    method,
    uri,
    Some("application/json"),
    body.to_string().into_bytes(),
  )
  .await
}

async fn get(state: &State, uri: &str) -> Response {
  send(state, "GET", uri, None, Vec::new()).await
}

async fn body_bytes(resp: Response) -> Vec<u8> {
  axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap()
    .to_vec()
}

async fn body_json(resp: Response) -> Value {
  serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

fn metro() -> Value {
  json!({
    "description":    "Homme âgé assis près du métro",
    "latitude":       48.8566,
    "longitude":      2.3522,
    "gender":         "homme",
    "age_category":   "adulte",
    "date_encounter": "2025-01-10",
  })
}

fn with(mut base: Value, extra: Value) -> Value {
  if let (Value::Object(b), Value::Object(e)) = (&mut base, extra) {
    b.extend(e);
  }
  base
}

async fn create(state: &State, person: Value) -> Value {
  let resp = send_json(state, "POST", "/persons", json!({ "person": person })).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  body_json(resp).await
}

enum Part<'a> {
  Text(&'a str, &'a str),
  File(&'a str, &'a str, &'a str, &'a [u8]),
}

fn multipart(parts: &[Part<'_>]) -> Vec<u8> {
  let mut body = Vec::new();
  for part in parts {
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    match part {
      Part::Text(name, value) => {
        body.extend_from_slice(
          format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
            .as_bytes(),
        );
      }
      Part::File(name, filename, content_type, data) => {
        body.extend_from_slice(
          format!(
            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
          )
          .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
      }
    }
  }
  body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
  body
}

async fn send_multipart(state: &State, method: &str, uri: &str, parts: &[Part<'_>]) -> Response {
  send(
    state,
    method,
    uri,
    Some(&format!("multipart/form-data; boundary={BOUNDARY}")),
    multipart(parts),
  )
  .await
}

// ── Create ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_without_names_falls_back_to_person_number() {
  let (state, _dir) = make_state().await;
  let record = create(&state, metro()).await;

  let id = record["id"].as_str().unwrap();
  assert_eq!(record["full_name"], format!("Person #{id}"));
  assert_eq!(record["gender"], "homme");
  assert_eq!(record["age_category"], "adulte");
  assert_eq!(record["date_encounter"], "2025-01-10");
  assert_eq!(record["location_visited"], false);
  assert_eq!(record["photo_url"], Value::Null);
}

#[tokio::test]
async fn consent_without_names_is_422() {
  let (state, _dir) = make_state().await;
  let person = with(metro(), json!({ "consent_given": true }));
  let resp = send_json(&state, "POST", "/persons", json!({ "person": person })).await;

  assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  let body = body_json(resp).await;
  assert_eq!(body["errors"]["first_name"], json!(["blank"]));
  assert_eq!(body["errors"]["last_name"], json!(["blank"]));
}

#[tokio::test]
async fn latitude_out_of_range_is_422() {
  let (state, _dir) = make_state().await;
  let person = with(metro(), json!({ "latitude": 95.0 }));
  let resp = send_json(&state, "POST", "/persons", json!({ "person": person })).await;

  assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  let body = body_json(resp).await;
  assert_eq!(body["errors"]["latitude"], json!(["out_of_range"]));

  let listed = body_json(get(&state, "/persons").await).await;
  assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn compound_field_values_are_422() {
  let (state, _dir) = make_state().await;

  for latitude in [json!([48.8]), json!({ "deg": 48.8 })] {
    let person = with(metro(), json!({ "latitude": latitude }));
    let resp = send_json(&state, "POST", "/persons", json!({ "person": person })).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(resp).await;
    assert_eq!(body["errors"]["latitude"], json!(["not_a_number"]));
  }

  let person = with(metro(), json!({ "gender": ["homme"] }));
  let resp = send_json(&state, "POST", "/persons", json!({ "person": person })).await;
  assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body_json(resp).await["errors"]["gender"], json!(["inclusion"]));

  let listed = body_json(get(&state, "/persons").await).await;
  assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn flat_json_body_is_accepted() {
  let (state, _dir) = make_state().await;
  let resp = send_json(&state, "POST", "/persons", metro()).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn malformed_body_is_400() {
  let (state, _dir) = make_state().await;
  let resp = send(
    &state,
    "POST",
    "/persons",
    Some("application/json"),
    b"{\"person\": ".to_vec(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert!(body_json(resp).await["error"].is_string());
}

// ── Multipart and attachments ────────────────────────────────────────────────

#[tokio::test]
async fn multipart_create_with_photo() {
  let (state, _dir) = make_state().await;
  let jpeg: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

  let resp = send_multipart(&state, "POST", "/persons", &[
    Part::Text("person[description]", "Femme avec une poussette, gare de Lyon"),
    Part::Text("person[latitude]", "48.8443"),
    Part::Text("person[longitude]", "2.3744"),
    Part::Text("person[gender]", "femme"),
    Part::Text("person[consent_given]", "1"),
    Part::Text("person[first_name]", "Amina"),
    Part::Text("person[last_name]", "Diallo"),
    Part::File("person[photo]", "portrait.jpg", "image/jpeg", jpeg),
    Part::File("person[document]", "", "application/octet-stream", b""),
  ])
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);

  let record = body_json(resp).await;
  let id = record["id"].as_str().unwrap();
  assert_eq!(record["full_name"], "Amina Diallo");
  assert_eq!(record["latitude"], 48.8443);
  assert_eq!(record["consent_given"], true);
  assert_eq!(record["photo_url"], format!("{BASE}/persons/{id}/photo"));
  assert_eq!(record["document_url"], Value::Null);

  let resp = get(&state, &format!("/persons/{id}/photo")).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/jpeg");
  assert_eq!(body_bytes(resp).await, jpeg);

  let resp = get(&state, &format!("/persons/{id}/document")).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn attachment_without_consent_is_422() {
  let (state, dir) = make_state().await;

  let resp = send_multipart(&state, "POST", "/persons", &[
    Part::Text("person[description]", "Homme seul sous l'abribus"),
    Part::Text("person[latitude]", "48.85"),
    Part::Text("person[longitude]", "2.35"),
    Part::File("person[document]", "scan.pdf", "application/pdf", b"%PDF-1.7"),
  ])
  .await;
  assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  let body = body_json(resp).await;
  assert_eq!(body["errors"]["consent_given"], json!(["must_be_accepted"]));

  // Nothing written: no record, no payload.
  assert_eq!(body_json(get(&state, "/persons").await).await, json!([]));
  assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn delete_removes_payloads() {
  let (state, dir) = make_state().await;

  let resp = send_multipart(&state, "POST", "/persons", &[
    Part::Text("person[description]", "Homme avec un sac de couchage"),
    Part::Text("person[latitude]", "48.87"),
    Part::Text("person[longitude]", "2.36"),
    Part::Text("person[consent_given]", "true"),
    Part::Text("person[first_name]", "Karim"),
    Part::Text("person[last_name]", "Benali"),
    Part::File("person[document]", "piece.pdf", "application/pdf", b"%PDF-1.7"),
  ])
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let id = body_json(resp).await["id"].as_str().unwrap().to_owned();
  assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

  let resp = send(&state, "DELETE", &format!("/persons/{id}"), None, Vec::new()).await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);
  assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

// ── Update ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn partial_update_marks_visited() {
  let (state, _dir) = make_state().await;
  let created = create(&state, metro()).await;
  let id = created["id"].as_str().unwrap();

  let resp = send_json(
    &state,
    "PATCH",
    &format!("/persons/{id}"),
    json!({ "person": { "location_visited": true } }),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let updated = body_json(resp).await;

  assert_eq!(updated["location_visited"], true);
  for field in [
    "description",
    "latitude",
    "longitude",
    "gender",
    "age_category",
    "date_encounter",
    "full_name",
    "created_at",
  ] {
    assert_eq!(updated[field], created[field], "{field} changed");
  }
}

#[tokio::test]
async fn put_revalidates_merged_record() {
  let (state, _dir) = make_state().await;
  let created = create(&state, metro()).await;
  let id = created["id"].as_str().unwrap();

  let resp = send_json(
    &state,
    "PUT",
    &format!("/persons/{id}"),
    json!({ "person": { "description": "court" } }),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(
    body_json(resp).await["errors"]["description"],
    json!(["too_short"])
  );

  let unchanged = body_json(get(&state, &format!("/persons/{id}")).await).await;
  assert_eq!(unchanged["description"], created["description"]);
}

#[tokio::test]
async fn update_unknown_id_is_404() {
  let (state, _dir) = make_state().await;
  let resp = send_json(
    &state,
    "PATCH",
    &format!("/persons/{}", Uuid::new_v4()),
    json!({ "location_visited": true }),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ── Get / delete ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_unknown_id_is_404_twice() {
  let (state, _dir) = make_state().await;
  let uri = format!("/persons/{}", Uuid::new_v4());

  for _ in 0..2 {
    let resp = send(&state, "DELETE", &uri, None, Vec::new()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
      body_json(resp).await,
      json!({ "error": "Personne non trouvée" })
    );
  }
}

#[tokio::test]
async fn deleted_record_is_gone() {
  let (state, _dir) = make_state().await;
  let created = create(&state, metro()).await;
  let uri = format!("/persons/{}", created["id"].as_str().unwrap());

  let resp = send(&state, "DELETE", &uri, None, Vec::new()).await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);
  assert_eq!(get(&state, &uri).await.status(), StatusCode::NOT_FOUND);
  let resp = send(&state, "DELETE", &uri, None, Vec::new()).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_unknown_id_is_404() {
  let (state, _dir) = make_state().await;
  let resp = get(&state, &format!("/persons/{}", Uuid::new_v4())).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  assert_eq!(body_json(resp).await["error"], "Personne non trouvée");
}

#[tokio::test]
async fn missing_attachment_is_404() {
  let (state, _dir) = make_state().await;
  let record = create(&state, metro()).await;
  let id = record["id"].as_str().unwrap();

  for kind in ["photo", "document"] {
    let resp = get(&state, &format!("/persons/{id}/{kind}")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await, json!({ "error": "Fichier non trouvé" }));
  }
}

#[tokio::test]
async fn non_uuid_id_is_404() {
  let (state, _dir) = make_state().await;
  create(&state, metro()).await;

  for uri in ["/persons/42", "/persons/not-a-uuid"] {
    for method in ["GET", "DELETE"] {
      let resp = send(&state, method, uri, None, Vec::new()).await;
      assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{method} {uri}");
      assert_eq!(
        body_json(resp).await,
        json!({ "error": "Personne non trouvée" })
      );
    }
  }

  let resp = send_json(
    &state,
    "PATCH",
    "/persons/42",
    json!({ "location_visited": true }),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let resp = get(&state, "/persons/42/photo").await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  assert_eq!(body_json(resp).await["error"], "Personne non trouvée");

  let listed = body_json(get(&state, "/persons").await).await;
  assert_eq!(listed.as_array().unwrap().len(), 1);
}

// ── List ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_is_most_recent_first_and_filterable() {
  let (state, _dir) = make_state().await;
  let older = create(&state, with(metro(), json!({ "date_encounter": "2025-01-02" }))).await;
  let child = create(
    &state,
    with(metro(), json!({ "age_category": "enfant", "date_encounter": "2025-02-01" })),
  )
  .await;
  let newest = create(&state, with(metro(), json!({ "date_encounter": "2025-03-01" }))).await;

  let listed = body_json(get(&state, "/persons").await).await;
  let ids: Vec<&Value> = listed.as_array().unwrap().iter().map(|r| &r["id"]).collect();
  assert_eq!(ids, [&newest["id"], &child["id"], &older["id"]]);

  let children = body_json(get(&state, "/persons?age_category=enfant").await).await;
  assert_eq!(children.as_array().unwrap().len(), 1);
  assert_eq!(children[0]["id"], child["id"]);

  let ranged =
    body_json(get(&state, "/persons?date_from=2025-01-15&date_to=2025-03-01").await).await;
  assert_eq!(ranged.as_array().unwrap().len(), 2);
}

// ── Dashboard ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn dashboard_counts() {
  let (state, _dir) = make_state().await;
  create(&state, with(metro(), json!({ "location_visited": true }))).await;
  create(&state, with(metro(), json!({ "location_visited": "1" }))).await;
  create(
    &state,
    with(metro(), json!({ "age_category": "enfant", "location_visited": false })),
  )
  .await;

  let resp = get(&state, "/dashboard/stats").await;
  assert_eq!(resp.status(), StatusCode::OK);
  let stats = body_json(resp).await;
  assert_eq!(stats["total_persons"], 3);
  assert_eq!(stats["adults_count"], 2);
  assert_eq!(stats["children_count"], 1);
  assert_eq!(stats["visited_locations"], 2);
  assert_eq!(stats["unvisited_locations"], 1);
  assert_eq!(stats["recent_encounters"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn dashboard_on_empty_store() {
  let (state, _dir) = make_state().await;
  let stats = body_json(get(&state, "/dashboard/stats").await).await;
  assert_eq!(stats["total_persons"], 0);
  assert_eq!(stats["recent_encounters"], json!([]));
}

// ── Events ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn mutations_reach_event_subscribers() {
  let (state, _dir) = make_state().await;
  let mut rx = state.events.subscribe();

  let created = create(&state, metro()).await;
  let id: Uuid = created["id"].as_str().unwrap().parse().unwrap();
  send_json(
    &state,
    "PATCH",
    &format!("/persons/{id}"),
    json!({ "location_visited": true }),
  )
  .await;
  send(&state, "DELETE", &format!("/persons/{id}"), None, Vec::new()).await;

  assert_eq!(rx.recv().await.unwrap(), EncounterEvent::Created(id));
  assert_eq!(rx.recv().await.unwrap(), EncounterEvent::Updated(id));
  assert_eq!(rx.recv().await.unwrap(), EncounterEvent::Deleted(id));
}

#[tokio::test]
async fn failed_mutations_emit_nothing() {
  let (state, _dir) = make_state().await;
  let mut rx = state.events.subscribe();

  let person = with(metro(), json!({ "latitude": 95.0 }));
  send_json(&state, "POST", "/persons", json!({ "person": person })).await;
  send(&state, "DELETE", &format!("/persons/{}", Uuid::new_v4()), None, Vec::new()).await;

  assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn events_endpoint_streams_sse() {
  let (state, _dir) = make_state().await;
  let resp = get(&state, "/persons/events").await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/event-stream");
}
