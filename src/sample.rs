use std::{
    io::{self, BufRead, Write},
    num::NonZeroUsize,
};

use anyhow::{bail, Context, Result};
use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, Event},
    Reader, Writer,
};

use crate::osm::ElementKind;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SampleSummary {
    /// Top-level nodes, ways and relations read from the source.
    pub seen: usize,
    /// Elements written to the sample.
    pub kept: usize,
}

/// Copy every `k`-th top-level node, way or relation (0-indexed) with its full subtree from
/// `input` to `out`, wrapped in a fresh `<osm>` root.
///
/// Events are forwarded or dropped as they are read, so memory does not grow with the
/// size of the source.
pub fn sample(input: impl BufRead, out: impl io::Write, k: NonZeroUsize) -> Result<SampleSummary> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);

    let mut writer = Writer::new_with_indent(out, b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("osm")))?;

    let mut summary = SampleSummary::default();
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut keep = false;

    let take = |summary: &mut SampleSummary| {
        let selected = summary.seen % k.get() == 0;
        summary.seen += 1;
        if selected {
            summary.kept += 1;
        }
        selected
    };

    loop {
        buf.clear();
        let event = reader
            .read_event_into(&mut buf)
            .with_context(|| format!("malformed XML at byte {}", reader.buffer_position()))?;

        match event {
            Event::Eof => break,
            Event::Start(e) => {
                if depth == 1 {
                    keep = ElementKind::from_name(e.name().as_ref()).is_some() && take(&mut summary);
                }
                if depth >= 1 && keep {
                    writer.write_event(Event::Start(e))?;
                }
                depth += 1;
            }
            Event::Empty(e) => {
                let selected = match depth {
                    1 => ElementKind::from_name(e.name().as_ref()).is_some() && take(&mut summary),
                    0 => false,
                    _ => keep,
                };
                if selected {
                    writer.write_event(Event::Empty(e))?;
                }
            }
            Event::End(e) => {
                depth = depth
                    .checked_sub(1)
                    .context("closing tag without an opening tag")?;
                if depth >= 1 && keep {
                    writer.write_event(Event::End(e))?;
                }
                if depth == 1 {
                    keep = false;
                }
            }
            Event::Text(e) if depth > 1 && keep => writer.write_event(Event::Text(e))?,
            Event::CData(e) if depth > 1 && keep => writer.write_event(Event::CData(e))?,
            _ => {}
        }
    }

    if depth != 0 {
        bail!("unexpected end of file inside an open element");
    }

    writer.write_event(Event::End(BytesEnd::new("osm")))?;
    writer.get_mut().write_all(b"\n")?;

    Ok(summary)
}

#[cfg(test)]
mod test {
    use std::io::BufReader;

    use super::*;
    use crate::osm::{test::OSM_SAMPLE, ElementReader, RawElement};

    fn run(xml: &str, k: usize) -> (SampleSummary, String) {
        let mut out = Vec::new();
        let summary = sample(xml.as_bytes(), &mut out, NonZeroUsize::new(k).unwrap()).unwrap();
        (summary, String::from_utf8(out).unwrap())
    }

    fn elements(xml: &str) -> Vec<RawElement> {
        ElementReader::new(BufReader::new(xml.as_bytes()))
            .collect::<Result<_>>()
            .unwrap()
    }

    fn numbered_nodes(n: usize) -> String {
        let mut xml = String::from("<osm>\n");
        for i in 0..n {
            xml.push_str(&format!(
                "<node id=\"{i}\" lat=\"1\" lon=\"2\"><tag k=\"n\" v=\"{i}\"/></node>\n"
            ));
        }
        xml.push_str("</osm>\n");
        xml
    }

    #[test]
    fn keeps_every_kth_element() {
        for total in [0, 1, 9, 10, 11, 25] {
            for k in [1, 2, 3, 10] {
                let source = numbered_nodes(total);
                let (summary, out) = run(&source, k);

                assert_eq!(summary.seen, total);
                assert_eq!(summary.kept, (total + k - 1) / k);

                let input = elements(&source);
                let output = elements(&out);
                assert_eq!(output.len(), summary.kept);
                for (i, element) in output.iter().enumerate() {
                    assert_eq!(element, &input[i * k]);
                }
            }
        }
    }

    #[test]
    fn output_is_wrapped_and_declared() {
        let (summary, out) = run(OSM_SAMPLE, 2);

        // bounds is skipped; node 1, way 10 and node 3 are kept
        assert_eq!(summary, SampleSummary { seen: 5, kept: 3 });
        assert!(out.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(out.trim_end().ends_with("</osm>"));
        assert!(!out.contains("bounds"));

        let kept: Vec<_> = elements(&out)
            .into_iter()
            .map(|el| (el.kind, el.attr("id").map(str::to_string)))
            .collect();
        assert_eq!(
            kept,
            vec![
                (ElementKind::Node, Some("1".to_string())),
                (ElementKind::Way, Some("10".to_string())),
                (ElementKind::Node, Some("3".to_string())),
            ]
        );
    }

    #[test]
    fn preserves_subtrees() {
        let (_, out) = run(OSM_SAMPLE, 1);

        assert_eq!(elements(&out), elements(OSM_SAMPLE));
    }

    #[test]
    fn malformed_source_fails() {
        let mut out = Vec::new();
        let k = NonZeroUsize::new(1).unwrap();

        assert!(sample("<osm><node id=\"1\"></way></osm>".as_bytes(), &mut out, k).is_err());
        assert!(sample("<osm><node id=\"1\">".as_bytes(), &mut out, k).is_err());
    }
}
