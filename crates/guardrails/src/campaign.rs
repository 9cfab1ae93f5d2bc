use crate::error::GuardrailError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Columns a campaign insert must carry.
pub const CAMPAIGN_REQUIRED_COLUMNS: &[&str] = &["client_id"];

/// The only columns a campaign insert may carry.
pub const CAMPAIGN_INSERT_COLUMNS: &[&str] = &[
    "client_id",
    "filename",
    "start_time",
    "end_time",
    "leave_messages",
    "operator_phone",
    "callback_phone",
    "caller_id",
    "voice_id",
    "b_active",
    "skill_id",
    "dialing_strategy_id",
    "am_option",
    "campaign_type_id",
    "contact_source",
    "email_from",
    "campaign_subtype",
];

/// Answering-machine behaviour of a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AmOption {
    DontLeaveMessages,
    LeaveMessages,
    NoAm,
}

impl AmOption {
    pub const ALL: [AmOption; 3] = [AmOption::DontLeaveMessages, AmOption::LeaveMessages, AmOption::NoAm];

    pub fn as_str(&self) -> &'static str {
        match self {
            AmOption::DontLeaveMessages => "DONT_LEAVE_MESSAGES",
            AmOption::LeaveMessages => "LEAVE_MESSAGES",
            AmOption::NoAm => "NO_AM",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.as_str() == value)
    }
}

/// Where a campaign takes its contact data from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactSource {
    Campaign,
    Contact,
}

impl ContactSource {
    pub const ALL: [ContactSource; 2] = [ContactSource::Campaign, ContactSource::Contact];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactSource::Campaign => "CAMPAIGN",
            ContactSource::Contact => "CONTACT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.as_str() == value)
    }
}

/// A campaign insert that passed every guardrail.
///
/// Columns are lowercase and kept in the caller's order.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignRecord {
    client_id: i64,
    fields: Vec<(String, JsonValue)>,
}

impl CampaignRecord {
    pub fn client_id(&self) -> i64 {
        self.client_id
    }

    pub fn fields(&self) -> &[(String, JsonValue)] {
        &self.fields
    }

    pub fn get(&self, column: &str) -> Option<&JsonValue> {
        self.fields.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }
}

/// Validates raw campaign data against the insert policy.
pub fn validate_campaign_insert(data: &Map<String, JsonValue>) -> Result<CampaignRecord, GuardrailError> {
    if data.is_empty() {
        return Err(GuardrailError::EmptyCampaignData);
    }

    let mut fields: Vec<(String, JsonValue)> = Vec::with_capacity(data.len());
    for (key, value) in data {
        let column = key.trim().to_lowercase();
        match fields.iter_mut().find(|(c, _)| *c == column) {
            Some(existing) => existing.1 = value.clone(),
            None => fields.push((column, value.clone())),
        }
    }

    let mut missing: Vec<String> = CAMPAIGN_REQUIRED_COLUMNS
        .iter()
        .filter(|required| !fields.iter().any(|(c, _)| c == *required))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        missing.sort();
        return Err(GuardrailError::MissingColumns(missing));
    }

    let mut disallowed: Vec<String> = fields
        .iter()
        .map(|(c, _)| c)
        .filter(|c| !CAMPAIGN_INSERT_COLUMNS.contains(&c.as_str()))
        .cloned()
        .collect();
    if !disallowed.is_empty() {
        disallowed.sort();
        return Err(GuardrailError::DisallowedColumns(disallowed));
    }

    let client_id = fields
        .iter()
        .find(|(c, _)| c == "client_id")
        .and_then(|(_, v)| v.as_i64())
        .filter(|id| *id >= 1)
        .ok_or(GuardrailError::InvalidClientId)?;

    for (column, value) in &fields {
        match (column.as_str(), value) {
            (_, JsonValue::Null) => {}
            ("am_option", v) => {
                if v.as_str().and_then(AmOption::parse).is_none() {
                    return Err(GuardrailError::InvalidEnumValue {
                        field: "am_option",
                        allowed: AmOption::ALL.iter().map(AmOption::as_str).collect(),
                    });
                }
            }
            ("contact_source", v) => {
                if v.as_str().and_then(ContactSource::parse).is_none() {
                    return Err(GuardrailError::InvalidEnumValue {
                        field: "contact_source",
                        allowed: ContactSource::ALL.iter().map(ContactSource::as_str).collect(),
                    });
                }
            }
            (_, JsonValue::Array(_) | JsonValue::Object(_)) => {
                return Err(GuardrailError::InvalidCampaignValue {
                    column: column.clone(),
                    reason: "expected a scalar value".to_string(),
                });
            }
            _ => {}
        }
    }

    Ok(CampaignRecord { client_id, fields })
}
