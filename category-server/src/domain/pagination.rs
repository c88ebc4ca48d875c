pub(crate) const DEFAULT_PAGE: i64 = 1;
pub(crate) const DEFAULT_PAGE_SIZE: i64 = 5;

/// Page window over the category listing.
///
/// `offset` is always derived from `page`/`page_size`, and `page_count` only
/// becomes meaningful after [`Pagination::with_total`] was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Pagination {
    pub(crate) page: i64,
    pub(crate) page_size: i64,
    pub(crate) offset: i64,
    pub(crate) total_count: i64,
    pub(crate) page_count: i64,
}

impl Pagination {
    pub(crate) fn new(page: i64, page_size: i64) -> Self {
        let page = clamp_page(page);
        let page_size = clamp_page_size(page_size);

        Self {
            page,
            page_size,
            offset: compute_offset(page, page_size),
            total_count: 0,
            page_count: 0,
        }
    }

    /// Rebuilds the window from `page`/`page_size` only, ignoring any offset set by the caller.
    pub(crate) fn recomputed(self) -> Self {
        Self::new(self.page, self.page_size)
    }

    pub(crate) fn with_total(self, total_count: i64) -> Self {
        let total_count = total_count.max(0);
        Self {
            total_count,
            page_count: compute_page_count(total_count, self.page_size),
            ..self
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_PAGE_SIZE)
    }
}

pub(crate) fn compute_offset(page: i64, page_size: i64) -> i64 {
    let page = clamp_page(page);
    let page_size = clamp_page_size(page_size);
    (page - 1).saturating_mul(page_size)
}

pub(crate) fn compute_page_count(total_count: i64, page_size: i64) -> i64 {
    let page_size = clamp_page_size(page_size);
    if total_count <= 0 {
        return 0;
    }

    let full_pages = total_count / page_size;
    if total_count % page_size == 0 {
        full_pages
    } else {
        full_pages + 1
    }
}

fn clamp_page(page: i64) -> i64 {
    if page < 1 { DEFAULT_PAGE } else { page }
}

fn clamp_page_size(page_size: i64) -> i64 {
    if page_size < 1 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size
    }
}
