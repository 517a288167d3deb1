use lexiflux_core::Page;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::BufRead;
use thiserror::Error;

/// Errors surfaced by [`stream_pages`].
#[derive(Debug, Error)]
pub enum StreamError {
    /// The continuation predicate turned false at a page boundary.
    ///
    /// This is a cooperative stop, not a failure; drivers must not
    /// report it as an error.
    #[error("Page streaming cancelled")]
    Cancelled,

    /// Malformed XML in the underlying stream.
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),
}

const PAGE: &[u8] = b"page";
const TITLE: &[u8] = b"title";
const TEXT: &[u8] = b"text";

/// Which page field, if any, character data currently accumulates into.
enum Capture {
    None,
    Title,
    Text,
}

/// Stream a wiki XML dump and invoke `on_page` once per fully-formed
/// page, in document order.
///
/// A page is emitted only when both a non-empty `<title>` and a
/// non-empty `<text>` were observed as direct children of its `<page>`
/// element; incomplete pages are dropped silently. Every other element
/// (the `<mediawiki>` envelope, namespaces, per-wiki metadata) is
/// ignored.
///
/// `should_continue` is consulted once per closed page, keeping the
/// per-character hot path free of checks while still bounding the
/// latency of a cancel request to one page's worth of parsing. When it
/// returns false the parse stops immediately with
/// [`StreamError::Cancelled`].
///
/// Character accumulation is additive: the substrate may deliver one
/// logical text as several chunks (entities, CDATA sections), and all
/// chunks between the matching start and end tags are concatenated.
pub fn stream_pages<R, P, C>(
    source: R,
    mut on_page: P,
    should_continue: C,
) -> Result<(), StreamError>
where
    R: BufRead,
    P: FnMut(Page),
    C: Fn() -> bool,
{
    let mut reader = Reader::from_reader(source);
    let mut buf = Vec::new();

    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut capture = Capture::None;
    let mut title_buf = String::new();
    let mut text_buf = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(start) => {
                let name = start.local_name().as_ref().to_vec();

                if name == PAGE {
                    title_buf.clear();
                    text_buf.clear();
                } else if path.last().is_some_and(|parent| parent == PAGE) {
                    if name == TITLE {
                        capture = Capture::Title;
                    } else if name == TEXT {
                        capture = Capture::Text;
                    }
                }

                path.push(name);
            }

            Event::Text(text) => {
                let chunk = text.unescape().map_err(quick_xml::Error::from)?;
                match capture {
                    Capture::Title => title_buf.push_str(&chunk),
                    Capture::Text => text_buf.push_str(&chunk),
                    Capture::None => {}
                }
            }

            Event::CData(data) => {
                let chunk = String::from_utf8_lossy(&data);
                match capture {
                    Capture::Title => title_buf.push_str(&chunk),
                    Capture::Text => text_buf.push_str(&chunk),
                    Capture::None => {}
                }
            }

            Event::End(end) => {
                let name = end.local_name();
                let name = name.as_ref();
                path.pop();

                match capture {
                    Capture::Title if name == TITLE => capture = Capture::None,
                    Capture::Text if name == TEXT => capture = Capture::None,
                    _ => {}
                }

                if name == PAGE {
                    if !title_buf.is_empty() && !text_buf.is_empty() {
                        on_page(Page::new(
                            std::mem::take(&mut title_buf),
                            std::mem::take(&mut text_buf),
                        ));
                    } else {
                        title_buf.clear();
                        text_buf.clear();
                    }

                    if !should_continue() {
                        return Err(StreamError::Cancelled);
                    }
                }
            }

            Event::Eof => break,

            _ => {}
        }

        buf.clear();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::io::Cursor;

    fn collect_pages(xml: &str) -> Result<Vec<Page>, StreamError> {
        let mut pages = Vec::new();
        stream_pages(Cursor::new(xml), |page| pages.push(page), || true)?;
        Ok(pages)
    }

    #[test]
    fn stream_with_other_tags_yields_nothing() {
        let pages = collect_pages("<hello>world</hello>").unwrap();
        assert!(pages.is_empty());
    }

    #[test]
    fn empty_stream_yields_nothing() {
        let pages = collect_pages("").unwrap();
        assert!(pages.is_empty());
    }

    #[test]
    fn single_page_with_extra_elements() {
        let pages = collect_pages(
            r#"
            <wiki>
                <sometag>Hola!</sometag>

                <page>
                    <title>Alpha</title>
                    <someprop>A</someprop>
                    <text>This is the text!</text>
                </page>

                <someclosingtag>Z</someclosingtag>
            </wiki>
            "#,
        )
        .unwrap();

        assert_eq!(pages, vec![Page::new("Alpha", "This is the text!")]);
    }

    #[test]
    fn multiple_pages_in_document_order() {
        let pages = collect_pages(
            r#"
            <wiki>
                <page>
                    <title>Alpha</title>
                    <someprop>A</someprop>
                    <text>First text</text>
                </page>

                <page>
                    <title>Beta</title>
                    <text>Second text</text>
                </page>

                <page>
                    <title>Gamma</title>
                    <text>Third text</text>
                    <yetanotherprop>C</yetanotherprop>
                </page>
            </wiki>
            "#,
        )
        .unwrap();

        assert_eq!(
            pages,
            vec![
                Page::new("Alpha", "First text"),
                Page::new("Beta", "Second text"),
                Page::new("Gamma", "Third text"),
            ]
        );
    }

    #[test]
    fn page_without_title_is_dropped() {
        let pages = collect_pages(
            r#"
            <wiki>
                <page>
                    <title>Alpha</title>
                    <text>First text</text>
                </page>

                <page>
                    <someprop>B</someprop>
                    <text>THIS PAGE HAS NO TITLE!</text>
                </page>

                <page>
                    <title>Gamma</title>
                    <text>Third text</text>
                </page>
            </wiki>
            "#,
        )
        .unwrap();

        assert_eq!(
            pages,
            vec![
                Page::new("Alpha", "First text"),
                Page::new("Gamma", "Third text"),
            ]
        );
    }

    #[test]
    fn page_without_text_is_dropped() {
        let pages = collect_pages(
            r#"
            <wiki>
                <page>
                    <title>Alpha</title>
                    <text>First text</text>
                </page>

                <page>
                    <title>Beta</title>
                    <someprop>THIS PAGE HAS NO TEXT!</someprop>
                </page>

                <page>
                    <title>Gamma</title>
                    <text>Third text</text>
                </page>
            </wiki>
            "#,
        )
        .unwrap();

        assert_eq!(
            pages,
            vec![
                Page::new("Alpha", "First text"),
                Page::new("Gamma", "Third text"),
            ]
        );
    }

    #[test]
    fn title_outside_page_is_ignored() {
        let pages = collect_pages(
            r#"
            <wiki>
                <title>Not a page title</title>
                <page>
                    <title>Alpha</title>
                    <text>Body</text>
                </page>
            </wiki>
            "#,
        )
        .unwrap();

        assert_eq!(pages, vec![Page::new("Alpha", "Body")]);
    }

    #[test]
    fn character_chunks_accumulate() {
        let pages = collect_pages(
            r#"
            <wiki>
                <page>
                    <title>Ops</title>
                    <text>A &amp; B <![CDATA[& more]]> done</text>
                </page>
            </wiki>
            "#,
        )
        .unwrap();

        assert_eq!(pages, vec![Page::new("Ops", "A & B & more done")]);
    }

    #[test]
    fn cancellation_stops_after_the_current_page() {
        let xml = r#"
            <wiki>
                <page>
                    <title>Alpha</title>
                    <text>First text</text>
                </page>

                <page>
                    <title>Beta</title>
                    <text>Second text</text>
                </page>
            </wiki>
            "#;

        let pages = RefCell::new(Vec::new());
        let result = stream_pages(
            Cursor::new(xml),
            |page| pages.borrow_mut().push(page),
            || pages.borrow().is_empty(),
        );

        assert!(matches!(result, Err(StreamError::Cancelled)));
        assert_eq!(
            pages.into_inner(),
            vec![Page::new("Alpha", "First text")]
        );
    }

    #[test]
    fn stray_text_between_pages_is_not_an_error() {
        let pages = collect_pages(
            r#"<wiki>
                <page><title>Alpha</title><text>First</text></page>
                __ERROR__
                <page><title>Beta</title><text>Second</text></page>
            </wiki>"#,
        )
        .unwrap();

        assert_eq!(
            pages,
            vec![Page::new("Alpha", "First"), Page::new("Beta", "Second")]
        );
    }

    #[test]
    fn malformed_markup_surfaces_as_parse_error() {
        let pages = RefCell::new(Vec::new());
        let result = stream_pages(
            Cursor::new("<wiki><page></title></wiki>"),
            |page| pages.borrow_mut().push(page),
            || true,
        );

        assert!(matches!(result, Err(StreamError::Xml(_))));
        assert!(pages.into_inner().is_empty());
    }
}
