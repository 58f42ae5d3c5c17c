//! Async HTTP client wrapping the outreach JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{Days, Utc};
use outreach_core::{
  encounter::{AgeCategory, Gender, PersonEncounter},
  normalize::Normalizer,
  wire::{DashboardStats, PersonParams, PersonRecord},
};
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::warn;
use uuid::Uuid;

/// Connection settings for the outreach API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
}

/// Query string for `GET /persons`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListQuery {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub gender:           Option<Gender>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub age_category:     Option<AgeCategory>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location_visited: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub date_from:        Option<chrono::NaiveDate>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub date_to:          Option<chrono::NaiveDate>,
}

/// Result of [`ApiClient::list_persons`].
#[derive(Debug)]
pub struct Listing {
  pub records:     Vec<PersonRecord>,
  /// The server could not be reached and `records` is sample data.
  pub placeholder: bool,
}

/// Async HTTP client for the outreach JSON REST API.
///
/// Clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", api_root(&self.config.base_url), path)
  }

  // ── Persons ───────────────────────────────────────────────────────────────

  /// `GET /api/v1/persons`. Falls back to [`placeholder_persons`] when the
  /// server cannot be reached at all; HTTP errors are still reported.
  pub async fn list_persons(&self, query: &ListQuery) -> Result<Listing> {
    let sent = self.client.get(self.url("/persons")).query(query).send().await;

    let resp = match sent {
      Ok(resp) => resp,
      Err(e) if e.is_connect() || e.is_timeout() => {
        warn!(error = %e, "API unreachable, showing placeholder data");
        return Ok(Listing {
          records:     placeholder_persons(&self.config.base_url),
          placeholder: true,
        });
      }
      Err(e) => return Err(e).context("GET /persons failed"),
    };

    let resp = check(resp, "GET /persons").await?;
    let records = resp.json().await.context("deserialising persons")?;
    Ok(Listing { records, placeholder: false })
  }

  /// `GET /api/v1/persons/{id}`
  pub async fn get_person(&self, id: Uuid) -> Result<PersonRecord> {
    let resp = self
      .client
      .get(self.url(&format!("/persons/{id}")))
      .send()
      .await
      .context("GET /persons/{id} failed")?;
    let resp = check(resp, "GET /persons/{id}").await?;
    resp.json().await.context("deserialising person")
  }

  /// `POST /api/v1/persons` with a JSON body.
  pub async fn create_person(&self, params: &PersonParams) -> Result<PersonRecord> {
    let resp = self
      .client
      .post(self.url("/persons"))
      .json(&json!({ "person": params }))
      .send()
      .await
      .context("POST /persons failed")?;
    let resp = check(resp, "POST /persons").await?;
    resp.json().await.context("deserialising created person")
  }

  /// `PATCH /api/v1/persons/{id}` setting only `location_visited`.
  pub async fn set_visited(&self, id: Uuid, visited: bool) -> Result<PersonRecord> {
    let resp = self
      .client
      .patch(self.url(&format!("/persons/{id}")))
      .json(&json!({ "person": { "location_visited": visited } }))
      .send()
      .await
      .context("PATCH /persons/{id} failed")?;
    let resp = check(resp, "PATCH /persons/{id}").await?;
    resp.json().await.context("deserialising updated person")
  }

  /// `DELETE /api/v1/persons/{id}`
  pub async fn delete_person(&self, id: Uuid) -> Result<()> {
    let resp = self
      .client
      .delete(self.url(&format!("/persons/{id}")))
      .send()
      .await
      .context("DELETE /persons/{id} failed")?;
    check(resp, "DELETE /persons/{id}").await?;
    Ok(())
  }

  // ── Dashboard ─────────────────────────────────────────────────────────────

  /// `GET /api/v1/dashboard/stats`
  pub async fn stats(&self) -> Result<DashboardStats> {
    let resp = self
      .client
      .get(self.url("/dashboard/stats"))
      .send()
      .await
      .context("GET /dashboard/stats failed")?;
    let resp = check(resp, "GET /dashboard/stats").await?;
    resp.json().await.context("deserialising stats")
  }
}

fn api_root(base_url: &str) -> String {
  format!("{}/api/v1", base_url.trim_end_matches('/'))
}

/// Pass successful responses through; turn the rest into an error carrying
/// the server's message.
async fn check(resp: Response, what: &str) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let body: Value = resp.json().await.unwrap_or(Value::Null);
  Err(anyhow!("{what} → {status}: {}", describe_error(&body)))
}

/// One line from an error body: `{"error": "..."}` or
/// `{"errors": {"field": ["violation", ...]}}`.
pub fn describe_error(body: &Value) -> String {
  if let Some(message) = body.get("error").and_then(Value::as_str) {
    return message.to_owned();
  }
  if let Some(errors) = body.get("errors").and_then(Value::as_object) {
    return errors
      .iter()
      .map(|(field, violations)| {
        let list = violations
          .as_array()
          .map(|vs| {
            vs.iter()
              .filter_map(Value::as_str)
              .collect::<Vec<_>>()
              .join(", ")
          })
          .unwrap_or_default();
        format!("{field}: {list}")
      })
      .collect::<Vec<_>>()
      .join("; ");
  }
  "no details".to_owned()
}

/// Two fixed sample records shown when the server is unreachable: one
/// encounter today, one yesterday whose location was already visited.
pub fn placeholder_persons(base_url: &str) -> Vec<PersonRecord> {
  let now = Utc::now();
  let today = now.date_naive();
  let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);
  let normalizer = Normalizer::new(api_root(base_url));

  let sample = |n: u128, description: &str, gender, date, visited, lat, lng| {
    PersonEncounter {
      id: Uuid::from_u128(n),
      description: description.to_owned(),
      latitude: lat,
      longitude: lng,
      gender,
      age_category: AgeCategory::Adulte,
      date_encounter: date,
      location_visited: visited,
      first_name: None,
      last_name: None,
      consent_given: false,
      signature: None,
      photo: None,
      document: None,
      created_at: now,
      updated_at: now,
    }
  };

  [
    sample(
      1,
      "Personne de test - homme âgé",
      Gender::Homme,
      today,
      false,
      48.8566,
      2.3522,
    ),
    sample(
      2,
      "Personne de test - femme avec enfant",
      Gender::Femme,
      yesterday,
      true,
      48.8606,
      2.3376,
    ),
  ]
  .iter()
  .map(|e| normalizer.outbound(e))
  .collect()
}
