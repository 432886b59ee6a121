//! Page-control planning for paginated listings.

use serde::Serialize;

use crate::normalize::MAX_TOTAL_PAGES;

/// Window policy around the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaginationWindow {
    /// `current ± 2`, used by the per-kind browse pages. Totals are
    /// capped at [`MAX_TOTAL_PAGES`].
    #[default]
    Wide,
    /// `current ± 1`, used by the search page. Totals are not capped.
    Narrow,
}

impl PaginationWindow {
    const fn delta(self) -> i64 {
        match self {
            Self::Wide => 2,
            Self::Narrow => 1,
        }
    }
}

/// One entry of the page control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PageControl {
    /// A page link.
    Page {
        /// Page number (1-based).
        number: u32,
        /// Whether this is the current page.
        active: bool,
    },
    /// Marker for one or more skipped pages.
    Ellipsis,
}

/// Plans the page controls for `current` of `total` pages.
///
/// Page 1 and `total` are always shown, plus every page within the
/// window around `current`. An ellipsis stands in for the skipped run
/// after page 1 and before `total`. Returns nothing when `total <= 1`.
/// The wide window caps `total` at 100; `current` is never clamped.
#[must_use]
pub fn plan_pagination(current: u32, total: u32, window: PaginationWindow) -> Vec<PageControl> {
    if total <= 1 {
        return Vec::new();
    }

    let cur = i64::from(current);
    let last = i64::from(match window {
        PaginationWindow::Wide => total.min(MAX_TOTAL_PAGES),
        PaginationWindow::Narrow => total,
    });
    let delta = window.delta();
    let lo = cur.saturating_sub(delta);
    let hi = cur.saturating_add(delta);
    let (left_gap, right_gap) = match window {
        PaginationWindow::Wide => (lo > 2, hi < last.saturating_sub(1)),
        PaginationWindow::Narrow => (cur > 3, cur < last.saturating_sub(2)),
    };

    // Only these indices can produce an entry; the rest of 1..=last is skipped.
    let mut candidates: Vec<i64> = vec![1, 2, last.saturating_sub(1), last];
    candidates.extend(lo..=hi);
    candidates.retain(|i| (1..=last).contains(i));
    candidates.sort_unstable();
    candidates.dedup();

    let mut controls = Vec::with_capacity(candidates.len());
    for i in candidates {
        if i == 1 || i == last || (lo..=hi).contains(&i) {
            if let Ok(number) = u32::try_from(i) {
                controls.push(PageControl::Page {
                    number,
                    active: i == cur,
                });
            }
        } else if (i == 2 && left_gap) || (i == last.saturating_sub(1) && right_gap) {
            controls.push(PageControl::Ellipsis);
        }
    }
    controls
}
