use std::sync::atomic::{AtomicU32, Ordering};

pub(crate) fn now_ms() -> i64 {
    js_sys::Date::now().round() as i64
}

/// Client-side draft ids. The sequence keeps ids unique even when two
/// drafts are created within the same millisecond.
pub(crate) fn make_draft_id(now_ms: i64, seq: u32) -> String {
    format!("draft-{now_ms}-{seq}")
}

static DRAFT_SEQ: AtomicU32 = AtomicU32::new(1);

pub(crate) fn mint_draft_id() -> String {
    make_draft_id(now_ms(), DRAFT_SEQ.fetch_add(1, Ordering::SeqCst))
}

/// Compact "updated ..." label for the draft list.
pub(crate) fn fmt_updated(now_ms: i64, updated_ms: i64) -> String {
    let delta_s = (now_ms - updated_ms).max(0) / 1000;
    if delta_s < 60 {
        return "updated just now".to_string();
    }
    let mins = delta_s / 60;
    if mins < 60 {
        return format!("updated {}m ago", mins);
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("updated {}h ago", hours);
    }
    format!("updated {}d ago", hours / 24)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_ids_embed_time_and_sequence() {
        assert_eq!(make_draft_id(1700000000000, 7), "draft-1700000000000-7");
    }

    #[test]
    fn test_updated_label_buckets() {
        let now = 10_000_000_000;
        assert_eq!(fmt_updated(now, now - 30_000), "updated just now");
        assert_eq!(fmt_updated(now, now - 5 * 60_000), "updated 5m ago");
        assert_eq!(fmt_updated(now, now - 3 * 3_600_000), "updated 3h ago");
        assert_eq!(fmt_updated(now, now - 50 * 3_600_000), "updated 2d ago");
    }

    #[test]
    fn test_updated_label_tolerates_clock_skew() {
        // A draft saved "in the future" (clock skew) still renders sanely.
        assert_eq!(fmt_updated(1_000, 2_000), "updated just now");
    }
}
