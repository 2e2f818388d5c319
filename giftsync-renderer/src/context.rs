//! Template contexts: serializable rendering payloads built from [`GiftRecord`]s.

use serde::{Deserialize, Serialize};

use giftsync_core::GiftRecord;

/// Payload for the per-gift page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiftPageContext {
    pub collection: String,
    pub key: String,
    pub name: String,
    pub description: String,
    pub image: String,
    pub lottie: String,
    pub owner: String,
    pub owner_avatar: String,
    pub attributes: Vec<AttributeCtx>,
}

/// One attribute box. `percent` is omitted when it is zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeCtx {
    pub trait_type: String,
    pub value: String,
    pub percent: Option<f64>,
}

/// Payload for the per-collection index page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexContext {
    pub collection: String,
    pub gifts: Vec<GiftCard>,
}

/// One card on the collection index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftCard {
    pub key: String,
    pub name: String,
    pub image: String,
    /// Link to the gift page, relative to the index.
    pub page: String,
    pub average_rarity: f64,
    /// Position in id order; the page's "default" sort restores it.
    pub order: usize,
}

impl GiftPageContext {
    pub fn from_record(record: &GiftRecord) -> Self {
        let attributes = record
            .attributes
            .iter()
            .map(|a| AttributeCtx {
                trait_type: a.trait_type.clone(),
                value: a.value.clone(),
                percent: (a.percent != 0.0).then_some(a.percent),
            })
            .collect();

        Self {
            collection: record.collection.clone(),
            key: record.key().0,
            name: record.name.clone(),
            description: record.description.clone(),
            image: record.image.clone(),
            lottie: record.lottie.clone(),
            owner: record.owner.clone(),
            owner_avatar: record.owner_avatar.clone(),
            attributes,
        }
    }
}

impl IndexContext {
    /// Build the index from the full entity set of one collection.
    ///
    /// Cards are ordered by numeric id regardless of input order.
    pub fn from_records<'a, I>(collection: &str, records: I) -> Self
    where
        I: IntoIterator<Item = &'a GiftRecord>,
    {
        let mut sorted: Vec<&GiftRecord> = records.into_iter().collect();
        sorted.sort_by_key(|r| r.id);

        let gifts = sorted
            .into_iter()
            .enumerate()
            .map(|(order, record)| GiftCard {
                key: record.key().0,
                name: record.name.clone(),
                image: record.image.clone(),
                page: if record.artifact_path.is_empty() {
                    "#".to_string()
                } else {
                    record.artifact_path.clone()
                },
                average_rarity: record.average_rarity(),
                order,
            })
            .collect();

        Self {
            collection: collection.to_string(),
            gifts,
        }
    }
}
