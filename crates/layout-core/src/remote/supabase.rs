//! Supabase (PostgREST) backend over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use crate::config::RemoteSettings;
use crate::error::{Error, Result};
use crate::models::{Construction, HistoryEntry, Machine, MachineChange};
use crate::util::{compact_text, iso_now};

use super::{construction_upsert, machine_upsert, HistoryRow, RemoteBackend};

const REST_PATH: &str = "rest/v1";
const HTTP_TIMEOUT_SECS: u64 = 10;
const UPSERT_PREFERENCE: &str = "resolution=merge-duplicates,return=minimal";

#[derive(Clone)]
pub struct SupabaseBackend {
    rest_url: String,
    anon_key: String,
    client: Client,
}

impl std::fmt::Debug for SupabaseBackend {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SupabaseBackend")
            .field("rest_url", &self.rest_url)
            .field("anon_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl SupabaseBackend {
    pub fn new(settings: &RemoteSettings) -> Result<Self> {
        let anon_key = settings.anon_key.trim().to_string();
        if anon_key.is_empty() {
            return Err(Error::Config(
                "Supabase anon key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            rest_url: normalize_rest_url(&settings.url)?,
            anon_key,
            client: Client::builder()
                .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
                .build()?,
        })
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{table}", self.rest_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .header("Accept", "application/json")
    }

    fn upsert<T: serde::Serialize + ?Sized>(&self, table: &str, row: &T) -> RequestBuilder {
        self.request(Method::POST, table)
            .query(&[("on_conflict", "id")])
            .header("Prefer", UPSERT_PREFERENCE)
            .json(row)
    }

    async fn send(request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Remote(parse_api_error(status, &body)));
        }
        Ok(response)
    }
}

#[async_trait]
impl RemoteBackend for SupabaseBackend {
    async fn load_machines(&self) -> Result<Vec<Machine>> {
        let request = self
            .request(Method::GET, "machines")
            .query(&[("select", "*"), ("order", "id.asc")]);
        let machines = Self::send(request).await?.json::<Vec<Machine>>().await?;
        tracing::debug!("Loaded {} machines from Supabase", machines.len());
        Ok(machines)
    }

    async fn save_machine(&self, change: &MachineChange) -> Result<()> {
        let timestamp = iso_now();

        Self::send(self.upsert("machines", &machine_upsert(change, &timestamp))).await?;

        let row = HistoryRow::for_change(change, &timestamp);
        Self::send(
            self.request(Method::POST, "history")
                .header("Prefer", "return=minimal")
                .json(&[row]),
        )
        .await?;

        tracing::debug!("Saved machine {} to Supabase", change.machine_id);
        Ok(())
    }

    async fn load_constructions(&self) -> Result<Vec<Construction>> {
        let request = self
            .request(Method::GET, "constructions")
            .query(&[("select", "*")]);
        let constructions = Self::send(request)
            .await?
            .json::<Vec<Construction>>()
            .await?;
        tracing::debug!("Loaded {} constructions from Supabase", constructions.len());
        Ok(constructions)
    }

    async fn save_construction(
        &self,
        construction: &Construction,
        user_id: Option<&str>,
        is_new: bool,
    ) -> Result<()> {
        let row = construction_upsert(construction, user_id, is_new, &iso_now());
        Self::send(self.upsert("constructions", &row)).await?;
        tracing::debug!("Saved construction {} to Supabase", row.id);
        Ok(())
    }

    async fn delete_construction(&self, id: &str) -> Result<()> {
        let filter = format!("eq.{id}");
        Self::send(
            self.request(Method::DELETE, "constructions")
                .query(&[("id", filter.as_str())]),
        )
        .await?;
        tracing::debug!("Deleted construction {} from Supabase", id);
        Ok(())
    }

    async fn load_history(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let limit = limit.to_string();
        let request = self.request(Method::GET, "history").query(&[
            ("select", "*"),
            ("order", "timestamp.desc"),
            ("limit", limit.as_str()),
        ]);
        let rows = Self::send(request).await?.json::<Vec<HistoryRow>>().await?;
        tracing::debug!("Loaded {} history rows from Supabase", rows.len());
        Ok(rows.into_iter().filter_map(HistoryRow::into_entry).collect())
    }

    fn name(&self) -> &'static str {
        "supabase"
    }
}

/// `https://<project>.supabase.co` → `https://<project>.supabase.co/rest/v1`
pub fn normalize_rest_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::Config("Supabase URL must not be empty".to_string()));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::Config(
            "Supabase URL must include http:// or https://".to_string(),
        ));
    }
    if trimmed.ends_with(REST_PATH) {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/{REST_PATH}"))
    }
}

#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    message: Option<String>,
    error: Option<String>,
    hint: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<PostgrestErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return match payload.hint {
                Some(hint) if !hint.trim().is_empty() => {
                    format!("{} ({}; hint: {})", message.trim(), status.as_u16(), hint.trim())
                }
                _ => format!("{} ({})", message.trim(), status.as_u16()),
            };
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_url_appends_path_once() {
        assert_eq!(
            normalize_rest_url("https://p.supabase.co/").unwrap(),
            "https://p.supabase.co/rest/v1"
        );
        assert_eq!(
            normalize_rest_url("https://p.supabase.co/rest/v1").unwrap(),
            "https://p.supabase.co/rest/v1"
        );
        assert!(normalize_rest_url("p.supabase.co").is_err());
        assert!(normalize_rest_url("  ").is_err());
    }

    #[test]
    fn api_error_prefers_message_and_hint() {
        let body = r#"{"code": "42P01", "message": "relation \"history\" does not exist", "hint": "create it"}"#;
        assert_eq!(
            parse_api_error(StatusCode::NOT_FOUND, body),
            "relation \"history\" does not exist (404; hint: create it)"
        );
        assert_eq!(parse_api_error(StatusCode::BAD_GATEWAY, ""), "HTTP 502");
        assert_eq!(
            parse_api_error(StatusCode::UNAUTHORIZED, "denied"),
            "denied (401)"
        );
    }

    #[test]
    fn debug_redacts_key() {
        let backend = SupabaseBackend::new(&RemoteSettings {
            url: "https://p.supabase.co".to_string(),
            anon_key: "secret-anon".to_string(),
        })
        .unwrap();
        let rendered = format!("{backend:?}");
        assert!(!rendered.contains("secret-anon"));
        assert!(rendered.contains("rest/v1"));
    }
}
