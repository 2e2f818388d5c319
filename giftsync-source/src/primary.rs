//! Primary source: the structured JSON gift document.
//!
//! ```json
//! { "name": "...", "description": "...", "image": "...", "lottie": "...",
//!   "attributes": [{ "trait_type": "Model", "value": "..." }],
//!   "original_details": { "sender_name": "...", "sender_telegram_id": 1,
//!                         "recipient_name": "...", "recipient_telegram_id": 2,
//!                         "date": 1730000000 } }
//! ```
//!
//! Every field is optional upstream. Absent or null fields become `""`;
//! numeric fields are stringified.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use giftsync_core::Attribute;

/// Parsed primary payload for one gift.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimaryData {
    pub name: String,
    pub description: String,
    pub image: String,
    pub lottie: String,
    /// Base attributes in upstream order, each with `percent = 0.0`.
    pub attributes: Vec<Attribute>,
    pub sender_name: String,
    pub sender_telegram_id: String,
    pub recipient_name: String,
    pub recipient_telegram_id: String,
    pub date: String,
}

#[derive(Debug, Deserialize)]
struct RawGift {
    #[serde(default, deserialize_with = "lenient_string")]
    name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    image: String,
    #[serde(default, deserialize_with = "lenient_string")]
    lottie: String,
    #[serde(default)]
    attributes: Option<Vec<RawAttribute>>,
    #[serde(default)]
    original_details: Option<RawDetails>,
}

#[derive(Debug, Deserialize)]
struct RawAttribute {
    #[serde(default, deserialize_with = "lenient_string")]
    trait_type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    value: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawDetails {
    #[serde(default, deserialize_with = "lenient_string")]
    sender_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    sender_telegram_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    recipient_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    recipient_telegram_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    date: String,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

/// Parse a primary JSON body.
///
/// Attributes with an empty `trait_type` or `value` are dropped.
pub fn parse_primary(body: &str) -> Result<PrimaryData, serde_json::Error> {
    let raw: RawGift = serde_json::from_str(body)?;
    let details = raw.original_details.unwrap_or_default();

    let attributes = raw
        .attributes
        .unwrap_or_default()
        .into_iter()
        .filter(|a| !a.trait_type.is_empty() && !a.value.is_empty())
        .map(|a| Attribute::new(a.trait_type, a.value, 0.0))
        .collect();

    Ok(PrimaryData {
        name: raw.name,
        description: raw.description,
        image: raw.image,
        lottie: raw.lottie,
        attributes,
        sender_name: details.sender_name,
        sender_telegram_id: details.sender_telegram_id,
        recipient_name: details.recipient_name,
        recipient_telegram_id: details.recipient_telegram_id,
        date: details.date,
    })
}
