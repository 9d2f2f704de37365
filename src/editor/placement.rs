//! Tooltip placement from selection geometry.
//!
//! The pure kernel works on plain rect values so the arithmetic is testable
//! off-browser; gathering rects from the live `Range` is kept separate.

use wasm_bindgen::JsCast;

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub(crate) struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub bottom: f64,
}

impl From<web_sys::DomRect> for Rect {
    fn from(r: web_sys::DomRect) -> Self {
        Self {
            left: r.left(),
            top: r.top(),
            width: r.width(),
            bottom: r.bottom(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub(crate) struct Placement {
    pub top: f64,
    pub left: f64,
}

/// Centers the tooltip under the widest visual line of the selection and
/// drops it just below the selection's last line.
///
/// Width ties pick the later rect in document order. With no rects at all
/// the tooltip parks at the container origin; a rough position must never
/// keep it from showing.
pub(crate) fn compute_position(rects: &[Rect], container: Rect, tooltip_width: f64) -> Placement {
    let widest = rects.iter().fold(None::<Rect>, |best, r| match best {
        Some(b) if r.width < b.width => Some(b),
        _ => Some(*r),
    });

    let (Some(widest), Some(last)) = (widest, rects.last()) else {
        return Placement::default();
    };

    Placement {
        top: last.bottom - container.top,
        left: widest.left - container.left - tooltip_width / 2.0,
    }
}

/// Client rects for a range, falling back to the start container's element
/// rects when the range itself reports none (collapsed caret).
pub(crate) fn gather_range_rects(range: &web_sys::Range) -> Vec<Rect> {
    let mut rects = range
        .get_client_rects()
        .map(dom_rect_list_to_vec)
        .unwrap_or_default();

    if rects.is_empty() {
        if let Ok(start) = range.start_container() {
            let el = start
                .clone()
                .dyn_into::<web_sys::Element>()
                .ok()
                .or_else(|| start.parent_element());
            if let Some(el) = el {
                rects = dom_rect_list_to_vec(el.get_client_rects());
            }
        }
    }

    rects
}

fn dom_rect_list_to_vec(list: web_sys::DomRectList) -> Vec<Rect> {
    (0..list.length())
        .filter_map(|i| list.item(i))
        .map(Rect::from)
        .collect()
}
