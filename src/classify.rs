use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::osm::{ElementKind, RawElement};

/// Semantic categories a tag key can be sorted into.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    HouseNumber,
    Postcode,
    Street,
    City,
    Phone,
    Amenity,
    Cuisine,
}

impl Bucket {
    pub const ALL: [Bucket; 7] = [
        Bucket::HouseNumber,
        Bucket::Postcode,
        Bucket::Street,
        Bucket::City,
        Bucket::Phone,
        Bucket::Amenity,
        Bucket::Cuisine,
    ];

    /// Substrings that put a key into this bucket.
    fn needles(&self) -> &'static [&'static str] {
        match self {
            Bucket::HouseNumber => &["housenumber"],
            Bucket::Postcode => &["postcode", "zip"],
            Bucket::Street => &["street"],
            Bucket::City => &["city"],
            Bucket::Phone => &["phone"],
            Bucket::Amenity => &["amenity"],
            Bucket::Cuisine => &["cuisine"],
        }
    }

    /// Keys that contain a needle by coincidence and must stay out.
    fn excluded(&self) -> &'static [&'static str] {
        match self {
            Bucket::City => &["capacity"],
            _ => &[],
        }
    }

    pub fn matches(&self, key: &str) -> bool {
        self.needles().iter().any(|needle| key.contains(needle)) && !self.excluded().contains(&key)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::HouseNumber => "housenumber",
            Bucket::Postcode => "postcode",
            Bucket::Street => "street",
            Bucket::City => "city",
            Bucket::Phone => "phone",
            Bucket::Amenity => "amenity",
            Bucket::Cuisine => "cuisine",
        }
    }
}

/// Bucket to key-set mapping discovered over a corpus. Read-only once built.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBuckets(BTreeMap<Bucket, BTreeSet<String>>);

impl KeyBuckets {
    pub fn contains(&self, bucket: Bucket, key: &str) -> bool {
        self.0.get(&bucket).map_or(false, |keys| keys.contains(key))
    }

    pub fn keys(&self, bucket: Bucket) -> impl Iterator<Item = &str> {
        self.0.get(&bucket).into_iter().flatten().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.values().map(BTreeSet::len).sum()
    }
}

impl FromIterator<(Bucket, String)> for KeyBuckets {
    fn from_iter<T: IntoIterator<Item = (Bucket, String)>>(iter: T) -> Self {
        let mut buckets = BTreeMap::<Bucket, BTreeSet<String>>::new();
        for (bucket, key) in iter {
            buckets.entry(bucket).or_default().insert(key);
        }
        Self(buckets)
    }
}

/// What a classification pass saw besides the bucket keys.
#[derive(Debug, Default)]
pub struct Audit {
    /// Distinct values per bucket.
    pub values: BTreeMap<Bucket, BTreeSet<String>>,
    /// How often each tag key occurs on nodes and ways.
    pub tag_frequencies: HashMap<String, usize>,
}

#[derive(Debug, Default)]
pub struct Classifier {
    keys: BTreeMap<Bucket, BTreeSet<String>>,
    audit: Audit,
}

impl Classifier {
    pub fn observe(&mut self, key: &str, value: &str) {
        for bucket in Bucket::ALL.iter().filter(|bucket| bucket.matches(key)) {
            self.keys.entry(*bucket).or_default().insert(key.to_string());
            self.audit
                .values
                .entry(*bucket)
                .or_default()
                .insert(value.to_string());
        }
    }

    pub fn observe_element(&mut self, element: &RawElement) {
        let counted = matches!(element.kind, ElementKind::Node | ElementKind::Way);

        for (key, value) in &element.tags {
            self.observe(key, value);
            if counted {
                *self
                    .audit
                    .tag_frequencies
                    .entry(key.clone())
                    .or_default() += 1;
            }
        }
    }

    pub fn finish(self) -> (KeyBuckets, Audit) {
        (KeyBuckets(self.keys), self.audit)
    }
}

/// Classify every tag of every element in `elements`.
pub fn classify<I>(elements: I) -> anyhow::Result<(KeyBuckets, Audit)>
where
    I: IntoIterator<Item = anyhow::Result<RawElement>>,
{
    let mut classifier = Classifier::default();
    for element in elements {
        classifier.observe_element(&element?);
    }
    Ok(classifier.finish())
}
