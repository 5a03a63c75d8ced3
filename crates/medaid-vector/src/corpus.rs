//! Built-in first-aid guides used to ground the chat assistant.

use serde_json::json;
use tracing::info;

use medaid_core::types::{Metadata, NewDocument};

use crate::error::VectorError;
use crate::store::{CollectionStore, IngestReport};

/// (id, type, severity, title, text)
const GUIDES: &[(&str, &str, &str, &str, &str)] = &[
    (
        "burn-minor",
        "burn",
        "minor",
        "Minor burns",
        "Cool the burn under cool running water for at least 10 minutes. Remove rings or \
         tight items before the area swells. Cover loosely with a sterile, non-fluffy \
         dressing or cling film. Do not apply ice, butter or creams, and do not pop blisters.",
    ),
    (
        "burn-severe",
        "burn",
        "severe",
        "Severe burns",
        "Call emergency services for burns larger than the palm, deep burns, or burns to \
         the face, hands, feet or genitals. Cool with running water while waiting, keep the \
         person warm, and do not remove clothing stuck to the skin.",
    ),
    (
        "cut-bleeding",
        "cut",
        "minor",
        "Cuts and scrapes",
        "Apply firm pressure with a clean cloth until the bleeding stops. Rinse the wound \
         with clean water, remove visible dirt, and cover with a sterile bandage. Seek care \
         if the cut is deep, gaping, or caused by a rusty or dirty object.",
    ),
    (
        "nosebleed",
        "nosebleed",
        "minor",
        "Nosebleeds",
        "Sit upright and lean forward. Pinch the soft part of the nose for 10 to 15 minutes \
         while breathing through the mouth. Do not tilt the head back. Get help if bleeding \
         lasts more than 20 minutes or follows a head injury.",
    ),
    (
        "sprain",
        "sprain",
        "minor",
        "Sprains and strains",
        "Rest the injured joint, apply ice wrapped in a cloth for 20 minutes at a time, \
         compress with an elastic bandage, and elevate above heart level. See a doctor if \
         you cannot bear weight or the joint looks deformed.",
    ),
    (
        "choking-adult",
        "choking",
        "severe",
        "Choking adult",
        "Encourage coughing. If the person cannot cough, speak or breathe, give up to five \
         firm back blows between the shoulder blades, then up to five abdominal thrusts. \
         Alternate and call emergency services if the blockage does not clear.",
    ),
    (
        "bee-sting",
        "sting",
        "minor",
        "Bee and insect stings",
        "Scrape the stinger out sideways with a fingernail or card. Wash the area, apply a \
         cold compress, and take an antihistamine for itching. Call emergency services for \
         swelling of the face or throat, wheezing, or dizziness.",
    ),
    (
        "heat-exhaustion",
        "heat",
        "moderate",
        "Heat exhaustion",
        "Move the person to a cool place, loosen tight clothing, and give water or a sports \
         drink in small sips. Cool the skin with wet cloths or a fan. Confusion, fainting or \
         a temperature above 40C suggests heatstroke and needs emergency care.",
    ),
    (
        "hypothermia",
        "cold",
        "severe",
        "Hypothermia",
        "Move the person out of the cold and remove wet clothing. Warm the body core first \
         with blankets and skin-to-skin contact. Give warm sweet drinks if they are alert. \
         Do not rub the limbs or use direct heat such as hot water.",
    ),
    (
        "fever",
        "fever",
        "minor",
        "Fever",
        "Rest and drink plenty of fluids. Paracetamol or ibuprofen can reduce discomfort. \
         Seek medical advice for a fever above 39C lasting more than three days, a stiff \
         neck, a rash that does not fade under pressure, or a fever in an infant.",
    ),
    (
        "headache",
        "headache",
        "minor",
        "Headaches",
        "Drink water, rest in a quiet dark room, and consider a simple painkiller. Get \
         urgent help for a sudden severe headache, a headache after a head injury, or one \
         with weakness, confusion or difficulty speaking.",
    ),
];

/// The built-in first-aid guides as ingestible documents.
pub fn first_aid_guides() -> Vec<NewDocument> {
    GUIDES
        .iter()
        .map(|(id, kind, severity, title, text)| {
            let metadata: Metadata = json!({
                "type": kind,
                "severity": severity,
                "title": title,
                "source": "built-in",
            })
            .as_object()
            .cloned()
            .unwrap_or_default();
            NewDocument::new(*id, *text).with_metadata(metadata)
        })
        .collect()
}

/// Load the first-aid guides into `collection`, creating it if needed.
///
/// Re-seeding replaces the guides in place since their ids are fixed.
pub async fn seed_first_aid(
    store: &CollectionStore,
    collection: &str,
) -> Result<IngestReport, VectorError> {
    if store.get_collection(collection).is_none() {
        let metadata = json!({ "description": "First-aid guides", "source": "built-in" })
            .as_object()
            .cloned()
            .unwrap_or_default();
        store.create_collection(collection, metadata)?;
    }

    let report = store.add_documents(collection, first_aid_guides()).await?;
    info!(collection, guides = report.added, "First-aid guides seeded");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbedding;
    use std::collections::HashSet;

    #[test]
    fn test_guide_ids_unique() {
        let guides = first_aid_guides();
        let ids: HashSet<&str> = guides.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids.len(), guides.len());
    }

    #[test]
    fn test_guides_have_type_metadata() {
        for guide in first_aid_guides() {
            let meta = guide.metadata.expect("guide metadata");
            assert!(meta.get("type").and_then(|v| v.as_str()).is_some());
            assert!(meta.get("title").and_then(|v| v.as_str()).is_some());
        }
    }

    #[tokio::test]
    async fn test_seed_creates_collection() {
        let store = CollectionStore::new(HashEmbedding::new(32));
        let report = seed_first_aid(&store, "first_aid").await.unwrap();

        assert_eq!(report.added, GUIDES.len());
        assert_eq!(report.replaced, 0);
        let info = store.get_collection("first_aid").unwrap();
        assert_eq!(info.document_count, GUIDES.len());
        assert_eq!(info.metadata["source"], "built-in");
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = CollectionStore::new(HashEmbedding::new(32));
        seed_first_aid(&store, "first_aid").await.unwrap();
        let report = seed_first_aid(&store, "first_aid").await.unwrap();

        assert_eq!(report.replaced, GUIDES.len());
        assert_eq!(store.document_count("first_aid"), Some(GUIDES.len()));
    }
}
