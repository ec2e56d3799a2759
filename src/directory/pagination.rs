use serde::{Deserialize, Serialize};

/// 1-based page request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub per_page: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl PageRequest {
    pub fn new(page: usize, per_page: usize) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    /// Saturates for page numbers past the addressable range, which then
    /// yield an empty page.
    pub fn offset(&self) -> usize {
        (self.page.max(1) - 1).saturating_mul(self.per_page.max(1))
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Slices `all` according to `request`. An empty set still has one page.
    pub fn from_vec(all: Vec<T>, request: PageRequest) -> Self {
        let per_page = request.per_page.max(1);
        let total = all.len();
        let total_pages = if total == 0 {
            1
        } else {
            total.div_ceil(per_page)
        };
        let items = all
            .into_iter()
            .skip(request.offset())
            .take(per_page)
            .collect();
        Self {
            items,
            page: request.page.max(1),
            per_page,
            total,
            total_pages,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}
