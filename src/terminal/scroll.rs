// src/terminal/scroll.rs

/// Cursor position and page size for a typeahead list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollOptions {
    /// Selected row; `-1` means nothing is selected.
    pub offset: isize,
    /// Rows per page.
    pub max: usize,
}

/// Visible slice `[start, end)` of a list and the highlighted row inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollWindow {
    pub start: usize,
    pub end: usize,
    /// Index relative to `start`; `-1` when nothing is highlighted.
    pub index: isize,
}

/// Keep the selection visible, scrolling once it passes half a page.
///
/// Half a page is `max / 2` rounded down.
pub fn scroll(size: usize, options: ScrollOptions) -> ScrollWindow {
    let ScrollOptions { offset, max } = options;
    let size_i = size as isize;
    let max_i = max as isize;
    let half = max_i / 2;

    let mut start: isize = 0;
    let mut index = offset.min(size_i);

    if index > half {
        if size_i >= max_i {
            start = (index - half - 1).min(size_i - max_i).max(0);
        }
        index = (index - start).min(size_i);
    }

    let start = start as usize;
    ScrollWindow {
        start,
        end: size.min(start + max),
        index,
    }
}
