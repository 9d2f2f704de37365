//! Link classification for the article editor.
//!
//! Body links come in three flavors:
//! - jump links (`is-jump-link`): plain navigation, never managed here;
//! - follow links (`is-follow-link`): carry an artist marker sibling and
//!   get the view tooltip on focus;
//! - bare links: candidates, only reachable through the explicit command.

/// Tag of every node the tooltip manages.
pub(crate) const LINK_TAG: &str = "A";

/// Opt-out marker: links that navigate within the app.
pub(crate) const JUMP_LINK_CLASS: &str = "is-jump-link";

/// Managed marker: links paired with an artist-follow sibling.
pub(crate) const FOLLOW_LINK_CLASS: &str = "is-follow-link";

/// Classes of the zero-width marker element inserted after a follow link.
pub(crate) const MARKER_CLASSES: &str = "entity-follow artist-follow";

/// The marker class used when looking a marker up again.
pub(crate) const MARKER_QUERY_CLASS: &str = "artist-follow";

/// Attribute on the marker holding the artist identifier.
pub(crate) const MARKER_ID_ATTR: &str = "data-id";

/// Path delimiter an artist profile URL carries.
pub(crate) const ARTIST_DELIMITER: &str = "/artist/";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct LinkClass {
    /// False for jump links; the tooltip must pass through entirely.
    pub managed: bool,
    /// True when the link already carries the follow marker class.
    pub annotated: bool,
}

/// Classify by class-attribute tokens.
///
/// Token match, not substring match: `is-jump-link-ish` must not count.
/// A jump link is never managed, whatever else it carries.
pub(crate) fn classify_tokens(class_attr: &str) -> LinkClass {
    let mut jump = false;
    let mut follow = false;

    for token in class_attr.split_whitespace() {
        if token == JUMP_LINK_CLASS {
            jump = true;
        } else if token == FOLLOW_LINK_CLASS {
            follow = true;
        }
    }

    LinkClass {
        managed: !jump,
        annotated: !jump && follow,
    }
}

pub(crate) fn classify(el: &web_sys::Element) -> LinkClass {
    classify_tokens(&el.class_name())
}

pub(crate) fn is_link_element(el: &web_sys::Element) -> bool {
    el.tag_name().eq_ignore_ascii_case(LINK_TAG)
}

pub(crate) fn is_marker_element(el: &web_sys::Element) -> bool {
    el.class_list().contains(MARKER_QUERY_CLASS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_link_is_managed_but_not_annotated() {
        let c = classify_tokens("");
        assert!(c.managed);
        assert!(!c.annotated);
    }

    #[test]
    fn test_follow_link_is_annotated() {
        let c = classify_tokens("is-follow-link");
        assert!(c.managed);
        assert!(c.annotated);
    }

    #[test]
    fn test_jump_link_is_never_managed() {
        assert!(!classify_tokens("is-jump-link").managed);
        // Even a contradictory node stays excluded.
        let both = classify_tokens("is-follow-link is-jump-link");
        assert!(!both.managed);
        assert!(!both.annotated);
    }

    #[test]
    fn test_classification_matches_whole_tokens_only() {
        let c = classify_tokens("is-jump-link-ish nav is-follow-linked");
        assert!(c.managed);
        assert!(!c.annotated);
    }

    #[test]
    fn test_classification_survives_other_classes() {
        let c = classify_tokens("prose text-blue-500 is-follow-link underline");
        assert!(c.annotated);
    }
}
