use std::{
    collections::{BTreeSet, HashMap},
    io,
    vec::IntoIter,
};

use anyhow::Result;
use itertools::Itertools;
use serde_json::Value;

use crate::classify::{Audit, Bucket, KeyBuckets};

fn sort_count<K: Ord>(map: HashMap<K, usize>) -> IntoIter<(K, usize)> {
    map.into_iter()
        .sorted_by(|a, b| Ord::cmp(&b.1, &a.1).then_with(|| Ord::cmp(&a.0, &b.0)))
        .collect::<Vec<_>>()
        .into_iter()
}

/// Print the tag frequencies and bucket contents found by a classification pass.
pub fn to_audit(
    buckets: &KeyBuckets,
    audit: &Audit,
    show_values: bool,
    mut out: impl io::Write,
) -> Result<()> {
    writeln!(out, "Audit\n{}", "-".repeat(20))?;
    writeln!(out, "unique tags: {}", audit.tag_frequencies.len())?;

    writeln!(out, "\nTags (count):\n")?;

    let frequencies = audit
        .tag_frequencies
        .iter()
        .map(|(tag, count)| (tag.as_str(), *count))
        .collect();
    for (tag, count) in sort_count(frequencies) {
        writeln!(out, "{tag} {count}")?;
    }

    for bucket in Bucket::ALL {
        writeln!(out, "\nKeys for {}:\n", bucket.as_str())?;
        for key in buckets.keys(bucket) {
            writeln!(out, "{key}")?;
        }

        if show_values {
            writeln!(out, "\nValues for {}:\n", bucket.as_str())?;
            for value in audit.values.get(&bucket).into_iter().flatten() {
                writeln!(out, "{value}")?;
            }
        }
    }

    Ok(())
}

/// Follow a dotted path such as `created.user` into a document.
fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |value, key| value.get(key))
}

/// Equality on a field; arrays match if any element does.
fn field_matches(doc: &Value, path: &str, expected: &str) -> bool {
    match lookup(doc, path) {
        Some(Value::String(value)) => value == expected,
        Some(Value::Array(values)) => values.iter().any(|value| value.as_str() == Some(expected)),
        _ => false,
    }
}

fn label(value: &Value) -> String {
    match value {
        Value::String(value) => value.clone(),
        other => other.to_string(),
    }
}

/// Group the documents that have `path` and pass every `(path, value)` filter by the value
/// at `path`, most frequent first. Array values are counted once per element.
pub fn field_counts(
    docs: &[Value],
    path: &str,
    filters: &[(&str, &str)],
    limit: Option<usize>,
) -> Vec<(String, usize)> {
    let mut counts = HashMap::<String, usize>::new();

    for doc in docs.iter().filter(|doc| {
        filters
            .iter()
            .all(|(field, expected)| field_matches(doc, field, expected))
    }) {
        match lookup(doc, path) {
            None | Some(Value::Null) => {}
            Some(Value::Array(values)) => {
                for value in values {
                    *counts.entry(label(value)).or_default() += 1;
                }
            }
            Some(value) => *counts.entry(label(value)).or_default() += 1,
        }
    }

    sort_count(counts)
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

fn write_counts(out: &mut impl io::Write, title: &str, counts: &[(String, usize)]) -> Result<()> {
    writeln!(out, "\n{title} (count):\n")?;

    for (value, count) in counts {
        writeln!(out, "{value} {count}")?;
    }

    Ok(())
}

/// Node and way counts of the top contributors and their share of all entries.
fn write_contributors(
    out: &mut impl io::Write,
    docs: &[Value],
    top: &[(String, usize)],
) -> Result<()> {
    let by_type = |kind: &str| -> HashMap<String, usize> {
        field_counts(docs, "created.user", &[("type", kind)], None)
            .into_iter()
            .collect()
    };
    let nodes = by_type("node");
    let ways = by_type("way");

    writeln!(out, "\nTop contributors by type (entries, nodes, ways, share):\n")?;

    let mut covered = 0;
    for (user, count) in top {
        covered += count;
        writeln!(
            out,
            "{user} {count} {} {} {:.2}%",
            nodes.get(user).unwrap_or(&0),
            ways.get(user).unwrap_or(&0),
            share(*count, docs.len())
        )?;
    }
    writeln!(out, "together {:.2}%", share(covered, docs.len()))?;

    Ok(())
}

fn share(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}

/// Print summary counts over cleaned documents.
pub fn to_stats(
    docs: &[Value],
    limit: usize,
    cuisines: &[String],
    mut out: impl io::Write,
) -> Result<()> {
    let of_type = |kind: &str| docs.iter().filter(|doc| field_matches(doc, "type", kind)).count();
    let contributors: BTreeSet<_> = docs
        .iter()
        .filter_map(|doc| lookup(doc, "created.user"))
        .map(label)
        .collect();

    writeln!(out, "Stats\n{}", "-".repeat(20))?;
    writeln!(out, "total entries: {}", docs.len())?;
    writeln!(out, "nodes: {}", of_type("node"))?;
    writeln!(out, "ways: {}", of_type("way"))?;
    writeln!(out, "distinct contributors: {}", contributors.len())?;

    let top_contributors = field_counts(docs, "created.user", &[], Some(limit));
    write_counts(&mut out, "Top contributors", &top_contributors)?;
    write_contributors(&mut out, docs, &top_contributors)?;

    write_counts(
        &mut out,
        "Top fast food names",
        &field_counts(docs, "name", &[("amenity", "fast_food")], Some(limit)),
    )?;

    write_counts(
        &mut out,
        "Top fast food cuisines",
        &field_counts(docs, "cuisine", &[("amenity", "fast_food")], Some(limit)),
    )?;

    for cuisine in cuisines {
        write_counts(
            &mut out,
            &format!("Fast food serving {cuisine}"),
            &field_counts(
                docs,
                "name",
                &[("amenity", "fast_food"), ("cuisine", cuisine.as_str())],
                None,
            ),
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::{
        classify::classify,
        osm::{test::OSM_SAMPLE, ElementReader},
    };

    fn docs() -> Vec<Value> {
        vec![
            json!({"id": "1", "type": "node", "created": {"user": "alice"},
                   "amenity": "fast_food", "name": "Jack in the Box", "cuisine": "burgers"}),
            json!({"id": "2", "type": "node", "created": {"user": "alice"},
                   "amenity": "fast_food", "name": "In-N-Out Burger", "cuisine": ["burgers", "american"]}),
            json!({"id": "3", "type": "node", "created": {"user": "bob"},
                   "amenity": "fast_food", "name": "Jack in the Box", "cuisine": "burgers"}),
            json!({"id": "4", "type": "way", "created": {"user": "carol"}, "node_refs": ["1", "2"]}),
            json!({"id": "5", "type": "node", "created": {},
                   "amenity": "restaurant", "name": "Jack in the Box"}),
        ]
    }

    #[test]
    fn groups_and_sorts_by_count() {
        assert_eq!(
            field_counts(&docs(), "created.user", &[], None),
            vec![
                ("alice".to_string(), 2),
                ("bob".to_string(), 1),
                ("carol".to_string(), 1)
            ]
        );
    }

    #[test]
    fn filters_and_limits() {
        assert_eq!(
            field_counts(&docs(), "name", &[("amenity", "fast_food")], Some(1)),
            vec![("Jack in the Box".to_string(), 2)]
        );
    }

    #[test]
    fn unwinds_arrays() {
        assert_eq!(
            field_counts(&docs(), "cuisine", &[("amenity", "fast_food")], None),
            vec![("burgers".to_string(), 3), ("american".to_string(), 1)]
        );
        // equality on an array field matches its elements
        assert_eq!(
            field_counts(&docs(), "name", &[("cuisine", "american")], None),
            vec![("In-N-Out Burger".to_string(), 1)]
        );
    }

    #[test]
    fn writes_stats() {
        let mut out = Vec::new();
        to_stats(&docs(), 10, &["burgers".to_string()], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("total entries: 5"));
        assert!(text.contains("nodes: 4"));
        assert!(text.contains("ways: 1"));
        assert!(text.contains("distinct contributors: 3"));
        assert!(text.contains("alice 2 2 0 40.00%\nbob 1 1 0 20.00%\ncarol 1 0 1 20.00%\n"));
        assert!(text.contains("together 80.00%"));
        assert!(text.contains("Fast food serving burgers (count):\n\nJack in the Box 2\nIn-N-Out Burger 1"));
    }

    #[test]
    fn writes_audit() {
        let (buckets, audit) = classify(ElementReader::new(OSM_SAMPLE.as_bytes())).unwrap();
        let mut out = Vec::new();
        to_audit(&buckets, &audit, true, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Keys for city:\n\naddr:city\n"));
        assert!(text.contains("Values for postcode:\n\n92101-1234\n92101:92105\n"));
        assert!(!text.contains("Keys for city:\n\ncapacity"));
    }
}
