use std::{collections::BTreeMap, io::BufRead};

use anyhow::{bail, Context, Result};
use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};

/// The three kinds of top-level OSM records.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    pub fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"node" => Some(Self::Node),
            b"way" => Some(Self::Way),
            b"relation" => Some(Self::Relation),
            _ => None,
        }
    }
}

/// One top-level element with its attributes, `tag` children in document order and, for
/// ways, the ordered `nd` references.
#[derive(Debug, Clone, PartialEq)]
pub struct RawElement {
    pub kind: ElementKind,
    pub attrs: BTreeMap<String, String>,
    pub tags: Vec<(String, String)>,
    pub node_refs: Vec<String>,
}

impl RawElement {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            attrs: BTreeMap::new(),
            tags: Vec::new(),
            node_refs: Vec::new(),
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }
}

fn get_attr_value(event: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in event.attributes().with_checks(false) {
        let attr = attr?;
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.to_string()));
        }
    }
    Ok(None)
}

fn to_element(event: &BytesStart<'_>) -> Result<Option<RawElement>> {
    let Some(kind) = ElementKind::from_name(event.name().as_ref()) else {
        return Ok(None);
    };

    let mut element = RawElement::new(kind);
    for attr in event.attributes().with_checks(false) {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        element.attrs.insert(key, attr.unescape_value()?.into_owned());
    }

    Ok(Some(element))
}

fn add_child(element: &mut RawElement, event: &BytesStart<'_>) -> Result<()> {
    match event.name().as_ref() {
        b"tag" => {
            let key = get_attr_value(event, b"k")?;
            let value = get_attr_value(event, b"v")?;
            if let (Some(key), Some(value)) = (key, value) {
                element.tags.push((key, value));
            }
        }
        b"nd" if element.kind == ElementKind::Way => {
            if let Some(reference) = get_attr_value(event, b"ref")? {
                element.node_refs.push(reference);
            }
        }
        _ => {}
    }

    Ok(())
}

/// Streams the top-level `node`/`way`/`relation` elements of an OSM XML document, one at a
/// time. Nothing but the element under construction is held in memory.
pub struct ElementReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    depth: usize,
}

impl<R: BufRead> ElementReader<R> {
    pub fn new(inner: R) -> Self {
        let mut reader = Reader::from_reader(inner);
        reader.trim_text(true);

        Self {
            reader,
            buf: Vec::new(),
            depth: 0,
        }
    }

    fn next_element(&mut self) -> Result<Option<RawElement>> {
        let mut current: Option<RawElement> = None;

        loop {
            self.buf.clear();
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .with_context(|| {
                    format!("malformed XML at byte {}", self.reader.buffer_position())
                })?;

            match event {
                Event::Eof => {
                    if self.depth != 0 {
                        bail!("unexpected end of file inside an open element");
                    }
                    return Ok(None);
                }
                Event::Start(e) => {
                    self.depth += 1;
                    // depth 1 is the document root, 2 a top-level element, 3 its children
                    match self.depth {
                        2 => current = to_element(&e)?,
                        3 => {
                            if let Some(element) = current.as_mut() {
                                add_child(element, &e)?;
                            }
                        }
                        _ => {}
                    }
                }
                Event::Empty(e) => match self.depth {
                    1 => {
                        if let Some(element) = to_element(&e)? {
                            return Ok(Some(element));
                        }
                    }
                    2 => {
                        if let Some(element) = current.as_mut() {
                            add_child(element, &e)?;
                        }
                    }
                    _ => {}
                },
                Event::End(_) => {
                    self.depth = self
                        .depth
                        .checked_sub(1)
                        .context("closing tag without an opening tag")?;
                    if self.depth == 1 {
                        if let Some(element) = current.take() {
                            return Ok(Some(element));
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for ElementReader<R> {
    type Item = Result<RawElement>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_element().transpose()
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    pub(crate) const OSM_SAMPLE: &str = r#"<?xml version='1.0' encoding='UTF-8'?>
<osm version="0.6" generator="test">
  <bounds minlat="32.5" minlon="-117.3" maxlat="33.1" maxlon="-116.9"/>
  <node id="1" lat="32.7157" lon="-117.1611" version="2" changeset="17206049" timestamp="2013-08-03T16:43:42Z" user="linuxUser16" uid="1219059">
    <tag k="amenity" v="fast_food"/>
    <tag k="name" v="Jack in the box #3021"/>
    <tag k="cuisine" v="Burger"/>
    <tag k="addr:housenumber" v="123.5"/>
    <tag k="addr:postcode" v="92101-1234"/>
    <tag k="addr:street" v="Market St"/>
    <tag k="addr:city" v="San Diego"/>
    <tag k="phone" v="1 (773)-271-5176"/>
    <tag k="capacity" v="40"/>
  </node>
  <node id="2" lat="32.7" lon="-117.2" version="1" user="someone" uid="7"/>
  <way id="10" version="3" changeset="99" user="someone" uid="7" timestamp="2015-01-01T00:00:00Z">
    <nd ref="1"/>
    <nd ref="2"/>
    <tag k="highway" v="residential"/>
    <tag k="tiger:zip_left" v="92101:92105"/>
    <tag k="addr:interpolation" v="odd"/>
  </way>
  <relation id="100" version="1">
    <member type="way" ref="10" role="outer"/>
    <tag k="type" v="multipolygon"/>
  </relation>
  <node id="3" lat="32.8" lon="-117.3"/>
</osm>
"#;

    fn read_all(xml: &str) -> Result<Vec<RawElement>> {
        ElementReader::new(xml.as_bytes()).collect()
    }

    #[test]
    fn reads_top_level_elements_in_order() {
        let elements = read_all(OSM_SAMPLE).unwrap();
        let kinds: Vec<_> = elements.iter().map(|el| el.kind).collect();

        assert_eq!(
            kinds,
            vec![
                ElementKind::Node,
                ElementKind::Node,
                ElementKind::Way,
                ElementKind::Relation,
                ElementKind::Node
            ]
        );
    }

    #[test]
    fn collects_attributes_tags_and_refs() {
        let elements = read_all(OSM_SAMPLE).unwrap();

        let node = &elements[0];
        assert_eq!(node.attr("id"), Some("1"));
        assert_eq!(node.attr("lat"), Some("32.7157"));
        assert_eq!(node.attr("user"), Some("linuxUser16"));
        assert_eq!(node.tags.len(), 9);
        assert_eq!(node.tags[0], ("amenity".to_string(), "fast_food".to_string()));
        assert!(node.node_refs.is_empty());

        let empty_node = &elements[1];
        assert!(empty_node.tags.is_empty());
        assert_eq!(empty_node.attr("changeset"), None);

        let way = &elements[2];
        assert_eq!(way.node_refs, vec!["1", "2"]);
        assert_eq!(way.tags.len(), 3);

        let relation = &elements[3];
        assert!(relation.node_refs.is_empty());
        assert_eq!(relation.tags, vec![("type".into(), "multipolygon".into())]);
    }

    #[test]
    fn unescapes_attribute_values() {
        let xml = r#"<osm><node id="5"><tag k="name" v="Carl&apos;s Jr. &amp; Co"/></node></osm>"#;
        let elements = read_all(xml).unwrap();

        assert_eq!(elements[0].tags[0].1, "Carl's Jr. & Co");
    }

    #[test]
    fn malformed_input_is_an_error() {
        let mismatched = r#"<osm><node id="1"><tag k="a" v="b"/></way></osm>"#;
        assert!(read_all(mismatched).is_err());

        let truncated = r#"<osm><node id="1"><tag k="a" v="b"/>"#;
        assert!(read_all(truncated).is_err());
    }
}
