//! The people-search service: trait seam plus the HTTP implementation.

use std::{future::Future, time::Duration};

use reqwest::{Client, Request};
use roster_core::employee::{
  ContactInfo, Education, EmployeeRecord, EmployerInfo, EnrichmentData, JobHistoryEntry,
  Location,
};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};

use crate::{
  Error, Result,
  executor::RetryExecutor,
  pace::{Sleeper, TokioSleeper},
};

pub const DEFAULT_BASE_URL: &str = "https://api.rocketreach.co/v2/api";

// ─── Requests ────────────────────────────────────────────────────────────────

/// Parameters of a person lookup. Empty fields are never sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LookupQuery {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name:             Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub current_employer: Option<String>,
  #[serde(rename = "linkedin_url", skip_serializing_if = "Option::is_none")]
  pub profile_url:      Option<String>,
}

impl LookupQuery {
  pub fn for_record(record: &EmployeeRecord) -> Self {
    let non_empty = |s: &str| {
      let s = s.trim();
      (!s.is_empty()).then(|| s.to_owned())
    };
    Self {
      name:             non_empty(&record.name),
      current_employer: record.employer_name().map(str::to_owned),
      profile_url:      non_empty(&record.profile_url),
    }
  }
}

/// One page of an employer search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployerSearch {
  pub company:   String,
  pub location:  Option<String>,
  pub start:     u32,
  pub page_size: u32,
}

impl EmployerSearch {
  pub fn new(company: impl Into<String>) -> Self {
    Self { company: company.into(), location: None, start: 1, page_size: 10 }
  }

  fn body(&self) -> serde_json::Value {
    let mut query = serde_json::json!({
      "current_employer": [format!("\"{}\"", self.company.trim())],
    });
    if let Some(location) = &self.location {
      query["location"] = serde_json::json!([location]);
    }
    serde_json::json!({ "query": query, "start": self.start, "page_size": self.page_size })
  }
}

// ─── Responses ───────────────────────────────────────────────────────────────

/// Where a lookup stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupStatus {
  Complete,
  Failed(String),
  /// Anything else, including a missing status.
  InProgress(Option<String>),
}

/// A contact value that arrives either as a bare string or as an object with
/// a `type` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactPoint {
  pub value: String,
  pub kind:  Option<String>,
}

impl<'de> Deserialize<'de> for ContactPoint {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
      Bare(String),
      Tagged {
        #[serde(alias = "number")]
        email: String,
        #[serde(rename = "type", default)]
        kind:  Option<String>,
      },
    }

    Ok(match Wire::deserialize(deserializer)? {
      Wire::Bare(value) => Self { value, kind: None },
      Wire::Tagged { email, kind } => Self { value: email, kind },
    })
  }
}

/// Numbers that some endpoints send as strings.
fn lenient_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
  D: Deserializer<'de>,
  T: std::str::FromStr + Deserialize<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Wire<T> {
    Num(T),
    Text(String),
  }

  Ok(Option::<Wire<T>>::deserialize(deserializer)?.and_then(|w| match w {
    Wire::Num(n) => Some(n),
    Wire::Text(s) => s.trim().parse().ok(),
  }))
}

/// A list that may be `null` as a whole or hold `null` entries; both are
/// dropped.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Ok(
    Option::<Vec<Option<T>>>::deserialize(deserializer)?
      .unwrap_or_default()
      .into_iter()
      .flatten()
      .collect(),
  )
}

/// A person profile as reported by the service. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Profile {
  #[serde(deserialize_with = "lenient_number")]
  pub id:                            Option<i64>,
  pub status:                        Option<String>,
  pub name:                          Option<String>,
  pub current_title:                 Option<String>,
  pub current_employer:              Option<String>,
  #[serde(deserialize_with = "lenient_number")]
  pub current_employer_id:           Option<i64>,
  pub current_employer_website:      Option<String>,
  pub current_employer_domain:       Option<String>,
  pub current_employer_linkedin_url: Option<String>,
  pub linkedin_url:                  Option<String>,
  pub location:                      Option<String>,
  pub city:                          Option<String>,
  pub region:                        Option<String>,
  pub country:                       Option<String>,
  pub country_code:                  Option<String>,
  #[serde(deserialize_with = "lenient_number")]
  pub region_latitude:               Option<f64>,
  #[serde(deserialize_with = "lenient_number")]
  pub region_longitude:              Option<f64>,
  #[serde(deserialize_with = "lenient_number")]
  pub birth_year:                    Option<i32>,
  pub profile_pic:                   Option<String>,
  pub suppressed:                    Option<bool>,
  #[serde(deserialize_with = "null_as_empty")]
  pub emails:                        Vec<ContactPoint>,
  #[serde(deserialize_with = "null_as_empty")]
  pub phones:                        Vec<ContactPoint>,
  #[serde(deserialize_with = "null_as_empty")]
  pub education:                     Vec<Education>,
  #[serde(deserialize_with = "null_as_empty")]
  pub job_history:                   Vec<JobHistoryEntry>,
  #[serde(deserialize_with = "null_as_empty")]
  pub skills:                        Vec<String>,
}

impl Profile {
  pub fn lookup_status(&self) -> LookupStatus {
    let status = self.status.as_deref().map(str::trim).filter(|s| !s.is_empty());
    match status {
      Some(s) if s.eq_ignore_ascii_case("complete") => LookupStatus::Complete,
      Some(s) if s.eq_ignore_ascii_case("failed") => LookupStatus::Failed(s.to_owned()),
      other => LookupStatus::InProgress(other.map(str::to_owned)),
    }
  }

  /// Whether the profile's current employer is `company`, case-insensitively.
  pub fn works_at(&self, company: &str) -> bool {
    self
      .current_employer
      .as_deref()
      .is_some_and(|e| e.trim().eq_ignore_ascii_case(company.trim()))
  }

  /// Map the profile into internal fields. `name` and `profile_url` come from
  /// the profile; `current_company` is left for the caller to set.
  pub fn into_record(self) -> EmployeeRecord {
    let of_kind = |points: &[ContactPoint], kind: &str| -> Vec<String> {
      points
        .iter()
        .filter(|p| p.kind.as_deref().is_some_and(|k| k.eq_ignore_ascii_case(kind)))
        .map(|p| p.value.clone())
        .collect()
    };

    EmployeeRecord {
      profile_url: self.linkedin_url.unwrap_or_default(),
      name: self.name.unwrap_or_default(),
      title: self.current_title,
      company_id: None,
      current_company: None,
      employer: EmployerInfo {
        name:        self.current_employer,
        website:     self.current_employer_website,
        domain:      self.current_employer_domain,
        external_id: self.current_employer_id,
        profile_url: self.current_employer_linkedin_url,
      },
      location: Location {
        location:     self.location,
        city:         self.city,
        region:       self.region,
        country:      self.country,
        country_code: self.country_code,
        latitude:     self.region_latitude,
        longitude:    self.region_longitude,
      },
      contact: ContactInfo {
        phone_numbers:       self.phones.iter().map(|p| p.value.clone()).collect(),
        personal_emails:     of_kind(&self.emails, "personal"),
        professional_emails: of_kind(&self.emails, "professional"),
        emails:              self.emails.into_iter().map(|p| p.value).collect(),
      },
      birth_year: self.birth_year,
      profile_picture_url: self.profile_pic,
      status: self.status,
      suppressed: self.suppressed.unwrap_or(false),
      category: None,
      enrichment: EnrichmentData {
        education:   self.education,
        job_history: self.job_history,
        skills:      self.skills,
      },
      is_enriched: false,
    }
  }
}

/// The status endpoint answers with one profile or a list of them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StatusResponse {
  Many(Vec<Profile>),
  One(Box<Profile>),
}

impl StatusResponse {
  /// The entry for `id`. A lone object is taken as-is, with or without an
  /// identifier.
  pub fn find(self, id: i64) -> Option<Profile> {
    match self {
      Self::Many(profiles) => profiles.into_iter().find(|p| p.id == Some(id)),
      Self::One(profile) => Some(*profile),
    }
  }
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
  #[serde(default, deserialize_with = "null_as_empty")]
  profiles: Vec<Profile>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// The operations the pipeline needs from the people-search service.
pub trait PeopleSearch: Send + Sync {
  /// Start (or fetch the cached result of) a person lookup.
  fn lookup<'a>(
    &'a self,
    query: &'a LookupQuery,
  ) -> impl Future<Output = Result<Profile>> + Send + 'a;

  fn check_status<'a>(
    &'a self,
    ids: &'a [i64],
  ) -> impl Future<Output = Result<StatusResponse>> + Send + 'a;

  fn search_employer<'a>(
    &'a self,
    search: &'a EmployerSearch,
  ) -> impl Future<Output = Result<Vec<Profile>>> + Send + 'a;
}

// ─── HTTP implementation ─────────────────────────────────────────────────────

/// Connection settings for the people-search service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
  pub base_url: String,
  pub api_key:  String,
  pub timeout:  Duration,
}

impl Default for ServiceConfig {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_BASE_URL.to_owned(),
      api_key:  String::new(),
      timeout:  Duration::from_secs(30),
    }
  }
}

/// [`PeopleSearch`] over HTTP. Every call goes through the retry executor.
pub struct HttpPeopleSearch<S = TokioSleeper> {
  client:   Client,
  config:   ServiceConfig,
  executor: RetryExecutor<S>,
}

impl<S: Sleeper> HttpPeopleSearch<S> {
  pub fn new(config: ServiceConfig, executor: RetryExecutor<S>) -> Result<Self> {
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { client, config, executor })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    req.header("Api-Key", &self.config.api_key)
  }

  async fn send<T: DeserializeOwned>(&self, request: Request) -> Result<T> {
    let endpoint = request.url().path().to_owned();
    let response = self.executor.execute(&self.client, request).await?;
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|source| Error::Decode { endpoint, source })
  }
}

impl<S: Sleeper> PeopleSearch for HttpPeopleSearch<S> {
  async fn lookup(&self, query: &LookupQuery) -> Result<Profile> {
    let request = self
      .authed(self.client.get(self.url("/person/lookup")))
      .query(query)
      .build()?;
    self.send(request).await
  }

  async fn check_status(&self, ids: &[i64]) -> Result<StatusResponse> {
    let params: Vec<_> = ids.iter().map(|id| ("ids", id.to_string())).collect();
    let request = self
      .authed(self.client.get(self.url("/person/checkStatus")))
      .query(&params)
      .build()?;
    self.send(request).await
  }

  async fn search_employer(&self, search: &EmployerSearch) -> Result<Vec<Profile>> {
    let request = self
      .authed(self.client.post(self.url("/search")))
      .json(&search.body())
      .build()?;
    let response: SearchResponse = self.send(request).await?;
    Ok(response.profiles)
  }
}

#[cfg(test)]
mod tests {
  use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path, query_param},
  };

  use super::*;
  use crate::{executor::RetryPolicy, test_support::RecordingSleeper};

  fn client(server: &MockServer) -> HttpPeopleSearch<RecordingSleeper> {
    let config = ServiceConfig {
      base_url: server.uri(),
      api_key:  "secret".into(),
      timeout:  Duration::from_secs(5),
    };
    let executor = RetryExecutor::new(RetryPolicy::default(), RecordingSleeper::default());
    HttpPeopleSearch::new(config, executor).unwrap()
  }

  #[test]
  fn lookup_query_drops_empty_fields() {
    let mut rec = EmployeeRecord::new("", "Jane Doe");
    rec.current_company = Some("  ".into());
    rec.employer.name = Some("Acme".into());
    let query = LookupQuery::for_record(&rec);

    assert_eq!(query.current_employer.as_deref(), Some("Acme"));
    assert_eq!(query.profile_url, None);
    let json = serde_json::to_value(&query).unwrap();
    assert_eq!(json, serde_json::json!({ "name": "Jane Doe", "current_employer": "Acme" }));
  }

  #[test]
  fn profile_decodes_loose_payload() {
    let profile: Profile = serde_json::from_str(
      r#"{
        "id": "42", "status": "Complete", "birth_year": null,
        "region_latitude": "42.36", "skills": null,
        "emails": [
          {"email": "jane@home.test", "type": "personal"},
          {"email": "jane@acme.test", "type": "professional"},
          "bare@example.test"
        ],
        "phones": [{"number": "555-0100", "type": "mobile"}],
        "job_history": [{"company_name": "Acme", "start_date": 2020, "is_current": true}]
      }"#,
    )
    .unwrap();

    assert_eq!(profile.id, Some(42));
    assert_eq!(profile.lookup_status(), LookupStatus::Complete);
    assert_eq!(profile.region_latitude, Some(42.36));
    assert!(profile.skills.is_empty());

    let rec = profile.into_record();
    assert_eq!(rec.contact.emails.len(), 3);
    assert_eq!(rec.contact.personal_emails, vec!["jane@home.test"]);
    assert_eq!(rec.contact.professional_emails, vec!["jane@acme.test"]);
    assert_eq!(rec.contact.phone_numbers, vec!["555-0100"]);
    assert_eq!(rec.enrichment.job_history[0].start_date.as_deref(), Some("2020"));
  }

  #[test]
  fn status_response_picks_matching_entry() {
    let many: StatusResponse =
      serde_json::from_str(r#"[{"id": 1, "status": "searching"}, {"id": 2, "status": "complete"}]"#)
        .unwrap();
    assert_eq!(many.find(2).unwrap().lookup_status(), LookupStatus::Complete);

    let empty: StatusResponse = serde_json::from_str("[]").unwrap();
    assert!(empty.find(2).is_none());

    let lone: StatusResponse = serde_json::from_str(r#"{"status": "failed"}"#).unwrap();
    assert!(matches!(lone.find(2).unwrap().lookup_status(), LookupStatus::Failed(_)));
  }

  #[test]
  fn completed_status_tolerates_nulls_inside_lists() {
    let status: StatusResponse = serde_json::from_str(
      r#"[{
        "id": 7, "status": "complete",
        "skills": ["Rust", null, "SQL"],
        "education": [null, {"school": "MIT"}],
        "job_history": [{"company_name": "Acme", "is_current": null}]
      }]"#,
    )
    .unwrap();

    let profile = status.find(7).unwrap();
    assert_eq!(profile.lookup_status(), LookupStatus::Complete);
    assert_eq!(profile.skills, vec!["Rust", "SQL"]);
    assert_eq!(profile.education.len(), 1);
    assert_eq!(profile.job_history[0].company_name.as_deref(), Some("Acme"));
    assert!(!profile.job_history[0].is_current);
  }

  #[tokio::test]
  async fn lookup_sends_key_and_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/person/lookup"))
      .and(header("Api-Key", "secret"))
      .and(query_param("name", "Jane Doe"))
      .and(query_param("current_employer", "Acme"))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 7, "status": "searching"})),
      )
      .expect(1)
      .mount(&server)
      .await;

    let query = LookupQuery {
      name:             Some("Jane Doe".into()),
      current_employer: Some("Acme".into()),
      profile_url:      None,
    };
    let profile = client(&server).lookup(&query).await.unwrap();
    assert_eq!(profile.id, Some(7));
    assert_eq!(profile.lookup_status(), LookupStatus::InProgress(Some("searching".into())));
  }

  #[tokio::test]
  async fn check_status_passes_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/person/checkStatus"))
      .and(query_param("ids", "7"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(serde_json::json!([{"id": 7, "status": "complete"}])),
      )
      .mount(&server)
      .await;

    let status = client(&server).check_status(&[7]).await.unwrap();
    assert!(status.find(7).is_some());
  }

  #[tokio::test]
  async fn search_employer_posts_quoted_company() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/search"))
      .and(body_partial_json(serde_json::json!({
        "query": { "current_employer": ["\"Acme Inc\""], "location": ["United States"] },
        "page_size": 10
      })))
      .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "profiles": [
          {"name": "Jane", "current_employer": "ACME INC", "linkedin_url": "https://linkedin.com/in/j"},
          {"name": "Bob", "current_employer": "Other"}
        ]
      })))
      .mount(&server)
      .await;

    let search = EmployerSearch {
      location: Some("United States".into()),
      ..EmployerSearch::new("Acme Inc")
    };
    let profiles = client(&server).search_employer(&search).await.unwrap();
    assert_eq!(profiles.len(), 2);
    assert!(profiles[0].works_at("acme inc"));
    assert!(!profiles[1].works_at("acme inc"));
  }

  #[tokio::test]
  async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
      .mount(&server)
      .await;

    let err = client(&server).lookup(&LookupQuery::default()).await.unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
  }
}
