use std::{collections::BTreeMap, fmt};

use serde::Serialize;

/// Document fields that a copied tag must not shadow.
pub const RESERVED_FIELDS: &[&str] = &[
    "id",
    "type",
    "pos",
    "node_refs",
    "created",
    "address",
    "phone_number",
    "cuisine",
];

/// Position for nodes, ordered node references for ways. Serialized next to a `type` field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Geometry {
    /// `[lat, lon]`, kept as the source strings.
    Node { pos: [String; 2] },
    Way { node_refs: Vec<String> },
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Created {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changeset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// A house number or postcode: the raw text, or the numbers of an expanded range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AddressNumber {
    Text(String),
    Range(Vec<u32>),
}

impl fmt::Display for AddressNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Range(range) => write!(f, "{range:?}"),
        }
    }
}

impl From<&str> for AddressNumber {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub housenumber: Option<AddressNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postcode: Option<AddressNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        self.housenumber.is_none()
            && self.postcode.is_none()
            && self.street.is_none()
            && self.city.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Cuisine {
    One(String),
    Many(Vec<String>),
}

impl fmt::Display for Cuisine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One(value) => f.write_str(value),
            Self::Many(values) => write!(f, "{values:?}"),
        }
    }
}

/// One shaped node or way, ready to be loaded into a document store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: String,
    #[serde(flatten)]
    pub geometry: Geometry,
    pub created: Created,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<Cuisine>,
    /// Remaining tags, copied verbatim.
    #[serde(flatten)]
    pub tags: BTreeMap<String, String>,
}

impl Document {
    pub fn new(id: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            id: id.into(),
            geometry,
            created: Created::default(),
            address: None,
            phone_number: None,
            cuisine: None,
            tags: BTreeMap::new(),
        }
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn address_mut(&mut self) -> &mut Address {
        self.address.get_or_insert_with(Address::default)
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn serializes_node() {
        let mut doc = Document::new(
            "2406124091",
            Geometry::Node {
                pos: ["41.9757030".into(), "-87.6921867".into()],
            },
        );
        doc.created.version = Some("2".into());
        doc.created.user = Some("linuxUser16".into());
        doc.address_mut().postcode = Some("60625".into());
        doc.address_mut().street = Some("North Lincoln Avenue".into());
        doc.phone_number = Some("773-271-5176".into());
        doc.cuisine = Some(Cuisine::Many(vec!["mexican".into(), "american".into()]));
        doc.tags.insert("amenity".into(), "restaurant".into());

        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({
                "id": "2406124091",
                "type": "node",
                "pos": ["41.9757030", "-87.6921867"],
                "created": {"version": "2", "user": "linuxUser16"},
                "address": {"postcode": "60625", "street": "North Lincoln Avenue"},
                "phone_number": "773-271-5176",
                "cuisine": ["mexican", "american"],
                "amenity": "restaurant",
            })
        );
    }

    #[test]
    fn serializes_way_with_ranges() {
        let mut doc = Document::new(
            "10",
            Geometry::Way {
                node_refs: vec!["1".into(), "2".into()],
            },
        );
        doc.address_mut().postcode = Some(AddressNumber::Range(vec![92101, 92102]));

        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({
                "id": "10",
                "type": "way",
                "node_refs": ["1", "2"],
                "created": {},
                "address": {"postcode": [92101, 92102]},
            })
        );
    }
}
