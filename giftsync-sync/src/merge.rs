//! Merge of primary and secondary source data into one [`GiftRecord`].

use giftsync_core::{GiftRecord, DEFAULT_OWNER, DEFAULT_OWNER_AVATAR};
use giftsync_source::{PrimaryData, SecondaryData};

/// Build the canonical record for `collection`/`id`.
///
/// Secondary attributes overwrite the percent of an exact
/// `(trait_type, value)` match in place and are appended otherwise, so
/// primary order is preserved. Owner falls back to the primary recipient,
/// then to [`DEFAULT_OWNER`]. `artifact_path` is left empty; the publish
/// layout fills it.
pub fn merge(collection: &str, id: u64, primary: PrimaryData, secondary: SecondaryData) -> GiftRecord {
    let mut attributes = primary.attributes;
    for incoming in secondary.attributes {
        match attributes.iter_mut().find(|a| a.matches(&incoming)) {
            Some(existing) => existing.percent = incoming.percent,
            None => attributes.push(incoming),
        }
    }

    let owner = match secondary.owner {
        Some(owner) => owner,
        None if !primary.recipient_name.is_empty() => primary.recipient_name.clone(),
        None => DEFAULT_OWNER.to_string(),
    };
    let owner_avatar = secondary
        .owner_avatar
        .unwrap_or_else(|| DEFAULT_OWNER_AVATAR.to_string());

    GiftRecord {
        collection: collection.to_string(),
        id,
        name: primary.name,
        description: primary.description,
        image: primary.image,
        lottie: primary.lottie,
        sender_name: primary.sender_name,
        sender_telegram_id: primary.sender_telegram_id,
        recipient_name: primary.recipient_name,
        recipient_telegram_id: primary.recipient_telegram_id,
        date: primary.date,
        owner,
        owner_avatar,
        attributes,
        artifact_path: String::new(),
    }
}
