//! Creature records
//!
//! A `Creature` is immutable once built. Aliases are sorted and de-duplicated
//! at construction so lookups can binary-search them without re-sorting.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blob::BlobRef;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreatureError {
    #[error("creature name cannot be empty")]
    EmptyName,
}

/// Provenance of a creature's source image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_url: String,
    #[serde(default)]
    pub original_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CreatureRecord")]
pub struct Creature {
    name: String,
    aliases: Vec<String>,
    is_public: bool,
    #[serde(flatten)]
    provenance: Provenance,
    blob_ref: Option<BlobRef>,
}

/// Raw serialized form; goes through `Creature::new` so stored files can't
/// smuggle in unsorted aliases or an empty name.
#[derive(Deserialize)]
struct CreatureRecord {
    name: String,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    is_public: bool,
    #[serde(flatten)]
    provenance: Provenance,
    #[serde(default)]
    blob_ref: Option<BlobRef>,
}

impl TryFrom<CreatureRecord> for Creature {
    type Error = CreatureError;

    fn try_from(record: CreatureRecord) -> Result<Self, Self::Error> {
        let creature = Creature::new(record.name, record.aliases, record.is_public)?
            .with_provenance(record.provenance);
        Ok(match record.blob_ref {
            Some(blob_ref) => creature.with_blob_ref(blob_ref),
            None => creature,
        })
    }
}

impl Creature {
    pub fn new(
        name: impl Into<String>,
        aliases: impl IntoIterator<Item = String>,
        is_public: bool,
    ) -> Result<Self, CreatureError> {
        let name = name.into();
        if name.is_empty() {
            return Err(CreatureError::EmptyName);
        }

        let mut aliases: Vec<String> = aliases.into_iter().collect();
        aliases.sort();
        aliases.dedup();

        Ok(Self {
            name,
            aliases,
            is_public,
            provenance: Provenance::default(),
            blob_ref: None,
        })
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    /// Attach the stored image. Consumes the creature, so a built record
    /// can never have its blob swapped out.
    pub fn with_blob_ref(mut self, blob_ref: BlobRef) -> Self {
        if self.blob_ref.is_none() {
            self.blob_ref = Some(blob_ref);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Aliases in sorted order
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn is_public(&self) -> bool {
        self.is_public
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn blob_ref(&self) -> Option<&BlobRef> {
        self.blob_ref.as_ref()
    }

    /// True if `identifier` is this creature's name or one of its aliases
    pub fn answers_to(&self, identifier: &str) -> bool {
        self.name == identifier
            || self
                .aliases
                .binary_search_by(|alias| alias.as_str().cmp(identifier))
                .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aliases(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_aliases_sorted_and_deduplicated_on_construction() {
        let creature =
            Creature::new("cat", aliases(&["tabby", "kitty", "puss", "kitty"]), true).unwrap();
        assert_eq!(creature.aliases(), &["kitty", "puss", "tabby"]);
    }

    #[test]
    fn test_empty_name_rejected() {
        assert_eq!(
            Creature::new("", Vec::new(), true).unwrap_err(),
            CreatureError::EmptyName
        );
    }

    #[test]
    fn test_answers_to_name_and_aliases() {
        let creature = Creature::new("cat", aliases(&["zebra-cat", "kitty"]), true).unwrap();
        assert!(creature.answers_to("cat"));
        assert!(creature.answers_to("kitty"));
        assert!(creature.answers_to("zebra-cat"));
        assert!(!creature.answers_to("dog"));
        assert!(!creature.answers_to("Cat"));
    }

    #[test]
    fn test_blob_ref_is_set_once() {
        let creature = Creature::new("cat", Vec::new(), true)
            .unwrap()
            .with_blob_ref(BlobRef::new("first"))
            .with_blob_ref(BlobRef::new("second"));
        assert_eq!(creature.blob_ref().map(BlobRef::as_str), Some("first"));
    }

    #[test]
    fn test_deserialize_sorts_aliases() {
        let json = r#"{
            "name": "owl",
            "aliases": ["strix", "hooter"],
            "is_public": true,
            "source": "https://example.com/owl.jpg",
            "license": "CC-BY",
            "blob_ref": "creatures/abc"
        }"#;
        let creature: Creature = serde_json::from_str(json).unwrap();
        assert_eq!(creature.aliases(), &["hooter", "strix"]);
        assert_eq!(creature.provenance().license, "CC-BY");
        assert_eq!(creature.blob_ref().unwrap().as_str(), "creatures/abc");
    }

    #[test]
    fn test_deserialize_rejects_empty_name() {
        let json = r#"{"name": ""}"#;
        assert!(serde_json::from_str::<Creature>(json).is_err());
    }
}
