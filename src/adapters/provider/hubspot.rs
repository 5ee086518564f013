//! HubSpot adapter
//!
//! Imports HubSpot CRM deals. Every deal becomes one multi-entity record with
//! three writes: a revenue indicator, a value for that indicator at the close
//! date, and an initiative tracking the deal itself.

use super::{
    ConfigValidation, FetchParams, FetchResult, IntegrationAdapter, OutboundRecord, PushResult,
};
use crate::config::{secret_string, HubSpotConfig, SecretString};
use crate::domain::{
    Credentials, Dependency, EntityType, EntityWrite, FieldMap, MultiEntityRecord, Record, Result,
    SyncError,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::instrument;

/// Registry key of the HubSpot adapter
pub const HUBSPOT_PROVIDER_KEY: &str = "hubspot";

const DEAL_PROPERTIES: &str =
    "dealname,amount,closedate,dealstage,hubspot_owner_id,hs_lastmodifieddate";

#[derive(Debug, Deserialize)]
struct DealsPage {
    #[serde(default)]
    results: Vec<Deal>,
    #[serde(default)]
    paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
struct Paging {
    #[serde(default)]
    next: Option<NextPage>,
}

#[derive(Debug, Deserialize)]
struct NextPage {
    after: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Deal {
    id: String,
    #[serde(default)]
    properties: DealProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DealProperties {
    #[serde(default)]
    dealname: Option<String>,
    #[serde(default)]
    amount: Option<String>,
    #[serde(default)]
    closedate: Option<String>,
    #[serde(default)]
    dealstage: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
}

/// Initiative status derived from a deal stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitiativeStatus {
    OnTime,
    Overdue,
    Finished,
}

impl InitiativeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InitiativeStatus::OnTime => "ON_TIME",
            InitiativeStatus::Overdue => "OVERDUE",
            InitiativeStatus::Finished => "FINISHED",
        }
    }
}

/// Initiative priority tier inferred from a deal amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Lowest,
    Low,
    Medium,
    High,
    Highest,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Lowest => "lowest",
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Highest => "highest",
        }
    }
}

/// Map a HubSpot deal stage to an initiative status
///
/// Stages are matched case-insensitively; anything unknown is `ON_TIME`.
pub fn map_deal_stage(stage: &str) -> InitiativeStatus {
    match stage.to_lowercase().as_str() {
        "closedwon" | "closedlost" => InitiativeStatus::Finished,
        "appointmentscheduled"
        | "qualifiedtobuy"
        | "presentationscheduled"
        | "decisionmakerboughtin"
        | "contractsent" => InitiativeStatus::OnTime,
        _ => InitiativeStatus::OnTime,
    }
}

/// Infer an initiative priority from a deal amount
pub fn infer_priority(amount: f64) -> Priority {
    if amount >= 100_000.0 {
        Priority::Highest
    } else if amount >= 50_000.0 {
        Priority::High
    } else if amount >= 10_000.0 {
        Priority::Medium
    } else if amount >= 1_000.0 {
        Priority::Low
    } else {
        Priority::Lowest
    }
}

/// Parse a HubSpot amount string, falling back to 0
pub fn parse_amount(amount: Option<&str>) -> f64 {
    amount
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Parse a HubSpot date into epoch milliseconds
///
/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates (taken as UTC midnight).
fn parse_date_millis(date: Option<&str>) -> Option<i64> {
    let raw = date?.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc).timestamp_millis());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

fn object(value: Value) -> FieldMap {
    match value {
        Value::Object(map) => map,
        _ => FieldMap::new(),
    }
}

/// Transform one deal into its indicator, value and initiative writes
fn deal_to_record(deal: &Deal) -> Record {
    let props = &deal.properties;
    let name = props.dealname.clone().unwrap_or_default();
    let amount = parse_amount(props.amount.as_deref());
    let date = parse_date_millis(props.closedate.as_deref());
    let status = map_deal_stage(props.dealstage.as_deref().unwrap_or_default());
    let priority = infer_priority(amount);

    let indicator = EntityWrite::new(
        EntityType::Indicators,
        object(json!({
            "description": format!("Revenue: {name}"),
            "symbol": "€",
            "periodicity": "monthly",
            "_externalSource": HUBSPOT_PROVIDER_KEY,
            "_externalId": deal.id,
            "_externalType": "deal",
        })),
    )
    .with_external_id(format!("hubspot_deal_indicator_{}", deal.id));

    let value = EntityWrite::new(
        EntityType::Values,
        object(json!({
            "value": amount,
            "date": date,
        })),
    )
    .with_external_id(format!("hubspot_deal_value_{}", deal.id))
    .depends_on(Dependency::new(EntityType::Indicators, 0).with_inject_field("indicatorId"));

    let initiative = EntityWrite::new(
        EntityType::Initiatives,
        object(json!({
            "description": name,
            "status": status.as_str(),
            "priority": priority.as_str(),
            "checkInDays": 7,
            "notes": format!(
                "Deal HubSpot: https://app.hubspot.com/contacts/{id}/deal/{id}",
                id = deal.id
            ),
            "_externalSource": HUBSPOT_PROVIDER_KEY,
            "_externalId": deal.id,
            "_externalType": "deal",
        })),
    )
    .with_external_id(format!("hubspot_deal_initiative_{}", deal.id));

    MultiEntityRecord::new(vec![indicator, value, initiative]).into()
}

/// HubSpot CRM adapter
pub struct HubSpotAdapter {
    client: Client,
    base_url: String,
    client_id: Option<String>,
    client_secret: Option<SecretString>,
}

impl HubSpotAdapter {
    /// Create a new HubSpot adapter
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: HubSpotConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SyncError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id,
            client_secret: config.client_secret,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn access_token(credentials: &Credentials) -> Option<&str> {
        credentials
            .access_token
            .as_ref()
            .map(|token| token.expose_secret().as_ref())
            .filter(|token| !token.trim().is_empty())
    }
}

#[async_trait]
impl IntegrationAdapter for HubSpotAdapter {
    fn provider_key(&self) -> &str {
        HUBSPOT_PROVIDER_KEY
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<bool> {
        let Some(token) = Self::access_token(credentials) else {
            return Ok(false);
        };

        let url = format!("{}/oauth/v1/access-tokens/{}", self.base_url, token);
        match self.client.get(&url).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(e) => {
                tracing::warn!(error = %e, "HubSpot token check failed");
                Ok(false)
            }
        }
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<Credentials> {
        let (Some(client_id), Some(client_secret)) = (&self.client_id, &self.client_secret) else {
            return Err(SyncError::Configuration(
                "HubSpot client_id and client_secret are required to refresh tokens".to_string(),
            ));
        };

        let url = format!("{}/oauth/v1/token", self.base_url);
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.expose_secret().as_ref()),
            ("refresh_token", refresh_token),
        ];

        let resp = self.client.post(&url).form(&form).send().await?;
        if !resp.status().is_success() {
            return Err(SyncError::Authentication(format!(
                "Failed to refresh HubSpot token: {}",
                resp.status().as_u16()
            )));
        }

        let token: TokenResponse = resp.json().await?;
        let expires_at = Utc::now().timestamp_millis() + token.expires_in * 1000;

        tracing::info!(expires_at = expires_at, "Refreshed HubSpot access token");

        Ok(Credentials {
            access_token: Some(secret_string(token.access_token)),
            refresh_token: token.refresh_token.map(secret_string),
            api_key: None,
            expires_at: Some(expires_at),
        })
    }

    #[instrument(skip(self, params), fields(batch_size = params.batch_size, cursor = ?params.cursor))]
    async fn fetch_records(&self, params: FetchParams) -> Result<FetchResult> {
        let token = Self::access_token(&params.credentials)
            .ok_or_else(|| SyncError::Authentication("HubSpot access token required".to_string()))?;

        let url = format!("{}/crm/v3/objects/deals", self.base_url);
        let mut query: Vec<(&str, String)> = vec![("limit", params.batch_size.to_string())];

        if let Some(cursor) = params.cursor.as_deref().filter(|c| !c.trim().is_empty()) {
            query.push(("after", cursor.to_string()));
        }

        if let Some(pipeline) = params.config.get("pipelineId").and_then(Value::as_str) {
            let filters = json!([{
                "propertyName": "pipeline",
                "operator": "EQ",
                "value": pipeline,
            }]);
            query.push(("properties", "pipeline".to_string()));
            query.push(("filters", filters.to_string()));
        }

        query.push(("properties", DEAL_PROPERTIES.to_string()));

        let resp = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&query)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            tracing::error!(status = status, "HubSpot deals request failed");
            return Err(SyncError::Api {
                provider: "HubSpot".to_string(),
                status,
            });
        }

        let page: DealsPage = resp
            .json()
            .await
            .map_err(|e| SyncError::InvalidResponse(format!("HubSpot deals response: {e}")))?;

        let records: Vec<Record> = page.results.iter().map(deal_to_record).collect();
        let next_cursor = page
            .paging
            .and_then(|p| p.next)
            .map(|n| n.after)
            .filter(|after| !after.trim().is_empty());

        tracing::debug!(deals = records.len(), next_cursor = ?next_cursor, "Fetched HubSpot deals");

        Ok(FetchResult {
            records,
            has_more: next_cursor.is_some(),
            next_cursor,
        })
    }

    async fn push_records(&self, records: Vec<OutboundRecord>) -> Result<PushResult> {
        tracing::warn!(records = records.len(), "HubSpot export requested");
        Err(SyncError::NotImplemented("HubSpot export".to_string()))
    }

    fn validate_config(&self, config: &Value) -> ConfigValidation {
        let map = match config {
            Value::Null => return ConfigValidation::valid(),
            Value::Object(map) => map,
            _ => return ConfigValidation::invalid("HubSpot config must be an object"),
        };

        for key in ["portalId", "pipelineId"] {
            match map.get(key) {
                None | Some(Value::Null) | Some(Value::String(_)) => {}
                Some(_) => return ConfigValidation::invalid(format!("{key} must be a string")),
            }
        }

        ConfigValidation::valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn adapter() -> HubSpotAdapter {
        HubSpotAdapter::new(HubSpotConfig::default()).unwrap()
    }

    fn deal(id: &str, amount: Option<&str>, stage: Option<&str>) -> Deal {
        Deal {
            id: id.to_string(),
            properties: DealProperties {
                dealname: Some("ACME renewal".to_string()),
                amount: amount.map(str::to_string),
                closedate: Some("2024-03-15T00:00:00.000Z".to_string()),
                dealstage: stage.map(str::to_string),
            },
        }
    }

    #[test_case(99_999.0, Priority::High ; "just below highest")]
    #[test_case(100_000.0, Priority::Highest ; "highest boundary")]
    #[test_case(50_000.0, Priority::High ; "high boundary")]
    #[test_case(49_999.0, Priority::Medium ; "just below high")]
    #[test_case(10_000.0, Priority::Medium ; "medium boundary")]
    #[test_case(9_999.0, Priority::Low ; "just below medium")]
    #[test_case(1_000.0, Priority::Low ; "low boundary")]
    #[test_case(999.0, Priority::Lowest ; "just below low")]
    #[test_case(0.0, Priority::Lowest ; "zero")]
    fn test_infer_priority(amount: f64, expected: Priority) {
        assert_eq!(infer_priority(amount), expected);
    }

    #[test_case("closedwon", InitiativeStatus::Finished)]
    #[test_case("ClosedLost", InitiativeStatus::Finished)]
    #[test_case("CONTRACTSENT", InitiativeStatus::OnTime)]
    #[test_case("qualifiedtobuy", InitiativeStatus::OnTime)]
    #[test_case("some_custom_stage", InitiativeStatus::OnTime)]
    #[test_case("", InitiativeStatus::OnTime)]
    fn test_map_deal_stage(stage: &str, expected: InitiativeStatus) {
        assert_eq!(map_deal_stage(stage), expected);
    }

    #[test]
    fn test_parse_amount_falls_back_to_zero() {
        assert_eq!(parse_amount(Some("1500.50")), 1500.5);
        assert_eq!(parse_amount(Some("not a number")), 0.0);
        assert_eq!(parse_amount(Some("NaN")), 0.0);
        assert_eq!(parse_amount(None), 0.0);
    }

    #[test]
    fn test_parse_date_millis() {
        assert_eq!(
            parse_date_millis(Some("2024-03-15T00:00:00.000Z")),
            Some(1_710_460_800_000)
        );
        assert_eq!(parse_date_millis(Some("2024-03-15")), Some(1_710_460_800_000));
        assert_eq!(parse_date_millis(Some("garbage")), None);
    }

    #[test]
    fn test_deal_to_record_shape() {
        let record = deal_to_record(&deal("42", Some("75000"), Some("closedwon")));
        let Record::Multi(multi) = record else {
            panic!("expected multi-entity record");
        };

        assert_eq!(multi.entities.len(), 3);
        assert!(multi.validate_dependencies().is_empty());

        let indicator = &multi.entities[0];
        assert_eq!(indicator.entity_type, EntityType::Indicators);
        assert_eq!(
            indicator.external_id.as_deref(),
            Some("hubspot_deal_indicator_42")
        );
        assert_eq!(indicator.fields["description"], "Revenue: ACME renewal");
        assert_eq!(indicator.fields["symbol"], "€");
        assert_eq!(indicator.fields["_externalId"], "42");

        let value = &multi.entities[1];
        assert_eq!(value.entity_type, EntityType::Values);
        assert_eq!(value.fields["value"], 75000.0);
        assert_eq!(value.fields["date"], 1_710_460_800_000i64);
        let dep = value.depends_on.as_ref().unwrap();
        assert_eq!(dep.key(), (EntityType::Indicators, 0));
        assert_eq!(dep.field_name(), "indicatorId");

        let initiative = &multi.entities[2];
        assert_eq!(initiative.entity_type, EntityType::Initiatives);
        assert_eq!(initiative.fields["status"], "FINISHED");
        assert_eq!(initiative.fields["priority"], "high");
        assert_eq!(initiative.fields["checkInDays"], 7);
        assert_eq!(
            initiative.fields["notes"],
            "Deal HubSpot: https://app.hubspot.com/contacts/42/deal/42"
        );
    }

    #[test]
    fn test_deal_with_missing_properties() {
        let record = deal_to_record(&Deal {
            id: "7".to_string(),
            properties: DealProperties::default(),
        });
        let Record::Multi(multi) = record else {
            panic!("expected multi-entity record");
        };
        assert_eq!(multi.entities[1].fields["value"], 0.0);
        assert_eq!(multi.entities[1].fields["date"], Value::Null);
        assert_eq!(multi.entities[2].fields["status"], "ON_TIME");
        assert_eq!(multi.entities[2].fields["priority"], "lowest");
    }

    #[test]
    fn test_validate_config() {
        let adapter = adapter();
        assert!(adapter.validate_config(&Value::Null).valid);
        assert!(
            adapter
                .validate_config(&json!({"portalId": "123", "pipelineId": "default"}))
                .valid
        );

        let result = adapter.validate_config(&json!({"portalId": 123}));
        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some("portalId must be a string"));

        let result = adapter.validate_config(&json!({"pipelineId": ["a"]}));
        assert_eq!(result.error.as_deref(), Some("pipelineId must be a string"));

        assert!(!adapter.validate_config(&json!("nope")).valid);
    }

    #[tokio::test]
    async fn test_authenticate_without_token_is_false() {
        let adapter = adapter();
        assert!(!adapter.authenticate(&Credentials::default()).await.unwrap());
    }

    #[tokio::test]
    async fn test_fetch_without_token_is_authentication_error() {
        let adapter = adapter();
        let err = adapter
            .fetch_records(FetchParams::new(Credentials::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_push_is_not_implemented() {
        let err = adapter().push_records(vec![]).await.unwrap_err();
        assert!(matches!(err, SyncError::NotImplemented(_)));
    }

    #[tokio::test]
    async fn test_refresh_without_client_settings_is_configuration_error() {
        let err = adapter().refresh_token("rt").await.unwrap_err();
        assert!(matches!(err, SyncError::Configuration(_)));
    }
}
