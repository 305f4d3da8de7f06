use log::debug;

use crate::{
    classify::{Bucket, KeyBuckets},
    document::{Cuisine, Document, Geometry, RESERVED_FIELDS},
    osm::{ElementKind, RawElement},
};

/// Keys with this prefix only live in the address block. Other bucketed keys are kept at the
/// top level as well.
const ADDRESS_PREFIX: &str = "addr";

/// Turns raw elements into documents, routing tags by the buckets it was built with.
pub struct Shaper<'a> {
    buckets: &'a KeyBuckets,
}

impl<'a> Shaper<'a> {
    pub fn new(buckets: &'a KeyBuckets) -> Self {
        Self { buckets }
    }

    /// Shape one element. Relations are not part of the document model and yield `None`.
    pub fn shape(&self, element: RawElement) -> Option<Document> {
        let RawElement {
            kind,
            mut attrs,
            tags,
            node_refs,
        } = element;

        let geometry = match kind {
            ElementKind::Node => Geometry::Node {
                pos: [
                    attrs.remove("lat").unwrap_or_default(),
                    attrs.remove("lon").unwrap_or_default(),
                ],
            },
            ElementKind::Way => Geometry::Way { node_refs },
            ElementKind::Relation => return None,
        };

        let mut doc = Document::new(attrs.remove("id").unwrap_or_default(), geometry);
        doc.created.version = attrs.remove("version");
        doc.created.changeset = attrs.remove("changeset");
        doc.created.user = attrs.remove("user");
        doc.created.uid = attrs.remove("uid");
        doc.created.timestamp = attrs.remove("timestamp");

        for (key, value) in tags {
            self.route(&mut doc, key, value);
        }

        if doc.address.as_ref().map_or(false, |address| address.is_empty()) {
            doc.address = None;
        }

        Some(doc)
    }

    fn route(&self, doc: &mut Document, key: String, value: String) {
        let in_bucket = |bucket| self.buckets.contains(bucket, &key);

        if in_bucket(Bucket::City) {
            doc.address_mut().city = Some(value.clone());
        }
        if in_bucket(Bucket::HouseNumber) {
            doc.address_mut().housenumber = Some(value.as_str().into());
        }
        if in_bucket(Bucket::Postcode) {
            doc.address_mut().postcode = Some(value.as_str().into());
        }
        if in_bucket(Bucket::Street) {
            doc.address_mut().street = Some(value.clone());
        }

        if in_bucket(Bucket::Phone) {
            doc.phone_number = Some(value);
        } else if key.starts_with(ADDRESS_PREFIX) {
            // routed above, or address data no bucket claims
        } else if key == "cuisine" {
            doc.cuisine = Some(Cuisine::One(value));
        } else if RESERVED_FIELDS.contains(&key.as_str()) {
            debug!("{}: dropping tag {key}={value} shadowing a document field", doc.id);
        } else {
            doc.tags.insert(key, value);
        }
    }
}
