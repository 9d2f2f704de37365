//! Document-tree mutations behind the link tooltip.
//!
//! Three structural cases, selected by inspecting where the submitted
//! selection sits: strip an existing link (empty input), retarget an
//! existing link, or wrap a plain-text span in a fresh follow link. Every
//! follow link keeps exactly one artist marker as its next sibling; the
//! marker is created, retargeted, and removed here and nowhere else.
//!
//! Edits are structured node operations (`splitText`, element insertion) on
//! the live tree. The serialized markup is never spliced as a string.

use crate::editor::anchor::{
    is_marker_element, ARTIST_DELIMITER, FOLLOW_LINK_CLASS, MARKER_CLASSES, MARKER_ID_ATTR,
};
use crate::editor::selection::{ancestor_link, EditorSelection};
use wasm_bindgen::{JsCast, JsValue};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MutationOutcome {
    /// Link wrapper and marker stripped, plain text left behind.
    Removed,
    /// Existing link retargeted in place; marker upserted.
    Updated,
    /// New link plus marker spliced around the selected text.
    Created,
    /// Selection spans more than one text node; the tree is untouched.
    RejectedSpan,
    /// Nothing to do (no link, empty span).
    Noop,
}

/// Strips the query string and surrounding whitespace from a submitted URL.
pub(crate) fn sanitize_href(raw: &str) -> String {
    raw.split('?').next().unwrap_or_default().trim().to_string()
}

/// Artist identifier from a profile URL: the part after the first
/// `/artist/`. Absent delimiter means no identifier; an empty trailing
/// segment is kept as-is (the URL is malformed for this domain either way).
pub(crate) fn artist_slug(href: &str) -> Option<String> {
    href.split(ARTIST_DELIMITER).nth(1).map(|s| s.to_string())
}

/// Applies a sanitized href to the document at `range`.
///
/// `current` is the link the tooltip was opened on, when it was opened on
/// one; otherwise the case is picked by inspecting the range itself. The
/// two inspection shapes are a caret inside a link's text and a widened
/// range selecting the link node.
///
/// On success the native selection spans the affected link so the caller
/// can collapse the caret after it.
pub(crate) fn apply_href(
    doc: &web_sys::Document,
    range: &web_sys::Range,
    current: Option<&web_sys::Element>,
    new_href: &str,
) -> Result<MutationOutcome, JsValue> {
    let link = current
        .cloned()
        .or_else(|| enclosing_link_of_range(range));

    if new_href.is_empty() {
        return remove_link(doc, link);
    }

    match link {
        Some(link) => update_link(doc, &link, new_href).map(|_| MutationOutcome::Updated),
        None => create_link(doc, range, new_href),
    }
}

/// Case 1: empty input. The marker goes first, then the host's unlink
/// strips the wrapper from the widened selection.
fn remove_link(
    doc: &web_sys::Document,
    link: Option<web_sys::Element>,
) -> Result<MutationOutcome, JsValue> {
    let Some(link) = link else {
        // No wrapper to strip.
        return Ok(MutationOutcome::Noop);
    };

    if let Some(sibling) = link.next_element_sibling() {
        if is_marker_element(&sibling) {
            sibling.remove();
        }
    }

    if let Some(mut sel) = EditorSelection::capture() {
        sel.select_node(&link);
    }
    // `execCommand` lives on the HTML document interface; web-sys splits it
    // off `Document`, but a browser document always is one.
    doc.unchecked_ref::<web_sys::HtmlDocument>()
        .exec_command("unlink")?;

    Ok(MutationOutcome::Removed)
}

/// Case 2: retarget an existing link and upsert its marker.
fn update_link(
    doc: &web_sys::Document,
    link: &web_sys::Element,
    new_href: &str,
) -> Result<(), JsValue> {
    let slug = artist_slug(new_href);

    // Build the marker before touching the link, so a failure here leaves
    // the tree unchanged.
    let fresh_marker = match link.next_element_sibling().filter(is_marker_element) {
        Some(existing) => {
            match &slug {
                Some(id) => existing.set_attribute(MARKER_ID_ATTR, id)?,
                None => existing.remove_attribute(MARKER_ID_ATTR)?,
            }
            None
        }
        None => Some(create_marker(doc, slug.as_deref())?),
    };

    link.set_attribute("href", new_href)?;
    link.class_list().add_1(FOLLOW_LINK_CLASS)?;

    if let Some(marker) = fresh_marker {
        link.insert_adjacent_element("afterend", &marker)?;
    }

    if let Some(mut sel) = EditorSelection::capture() {
        sel.select_node(link);
    }

    Ok(())
}

/// Case 3: wrap the selected span of one text node in a new follow link.
fn create_link(
    doc: &web_sys::Document,
    range: &web_sys::Range,
    new_href: &str,
) -> Result<MutationOutcome, JsValue> {
    let start = range.start_container()?;
    let end = range.end_container()?;
    if !start.is_same_node(Some(&end)) {
        // Spans crossing node boundaries have no defined splice; refuse
        // rather than guess.
        return Ok(MutationOutcome::RejectedSpan);
    }

    let Some(text) = start.dyn_ref::<web_sys::Text>() else {
        return Ok(MutationOutcome::RejectedSpan);
    };

    let start_offset = range.start_offset()?;
    let end_offset = range.end_offset()?;
    if start_offset == end_offset {
        // Empty span: nothing to wrap.
        return Ok(MutationOutcome::Noop);
    }

    let link = doc.create_element("a")?;
    link.set_attribute("href", new_href)?;
    link.set_class_name(FOLLOW_LINK_CLASS);
    let marker = create_marker(doc, artist_slug(new_href).as_deref())?;

    // Isolate [start, end) in its own text node, then wrap it.
    // Offsets are UTF-16 units straight from the range; splitText speaks
    // the same units, so no re-measuring happens on the Rust side.
    let selected = text.split_text(start_offset)?;
    let _tail = selected.split_text(end_offset - start_offset)?;

    let parent = selected
        .parent_node()
        .ok_or_else(|| JsValue::from_str("selected text node is detached"))?;
    parent.insert_before(&link, Some(selected.as_ref()))?;
    link.append_child(selected.as_ref())?;
    link.insert_adjacent_element("afterend", &marker)?;

    if let Some(mut sel) = EditorSelection::capture() {
        sel.select_node(&link);
    }

    Ok(MutationOutcome::Created)
}

fn create_marker(
    doc: &web_sys::Document,
    slug: Option<&str>,
) -> Result<web_sys::Element, JsValue> {
    let marker = doc.create_element("a")?;
    marker.set_class_name(MARKER_CLASSES);
    if let Some(slug) = slug {
        marker.set_attribute(MARKER_ID_ATTR, slug)?;
    }
    Ok(marker)
}

/// The link a range is anchored in, if any: either the start container
/// sits inside the link, or the range was widened to select the link node
/// itself (start container is the parent, offset indexes the link).
pub(crate) fn enclosing_link_of_range(range: &web_sys::Range) -> Option<web_sys::Element> {
    let start = range.start_container().ok()?;

    if let Some(link) = ancestor_link(&start) {
        return Some(link);
    }

    let offset = range.start_offset().ok()?;
    let child = start.child_nodes().item(offset)?;
    let el: web_sys::Element = child.dyn_into().ok()?;
    crate::editor::anchor::is_link_element(&el).then_some(el)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_query_string() {
        assert_eq!(
            sanitize_href("https://x.test/artist/123?ref=abc"),
            "https://x.test/artist/123"
        );
    }

    #[test]
    fn test_sanitize_trims_whitespace() {
        assert_eq!(sanitize_href("  https://x.test  "), "https://x.test");
        assert_eq!(sanitize_href("https://x.test ?utm=1"), "https://x.test");
    }

    #[test]
    fn test_sanitize_empty_input_stays_empty() {
        assert_eq!(sanitize_href("   "), "");
        assert_eq!(sanitize_href("?only-query"), "");
    }

    #[test]
    fn test_slug_is_the_segment_after_the_delimiter() {
        assert_eq!(
            artist_slug("https://x.test/artist/123"),
            Some("123".to_string())
        );
        assert_eq!(
            artist_slug("https://x.test/artist/klimt/works"),
            Some("klimt/works".to_string())
        );
    }

    #[test]
    fn test_slug_absent_without_delimiter() {
        assert_eq!(artist_slug("https://x.test/about"), None);
        assert_eq!(artist_slug(""), None);
    }

    #[test]
    fn test_slug_splits_on_the_first_delimiter() {
        assert_eq!(
            artist_slug("https://x.test/artist/a/artist/b"),
            Some("a".to_string())
        );
    }

    #[test]
    fn test_slug_of_trailing_delimiter_is_empty() {
        // Malformed for this domain, but the engine passes it through.
        assert_eq!(artist_slug("https://x.test/artist/"), Some(String::new()));
    }
}
