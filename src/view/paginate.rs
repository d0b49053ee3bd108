//! Fixed-size local pagination of the filtered view.

use crate::types::PAGE_SIZE;

/// Number of pages needed for `len` items. Never less than one.
pub fn total_pages(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1)).max(1)
}

/// Clamp a 1-based page index into `[1, total_pages]`.
pub fn clamp_page(page: usize, len: usize, page_size: usize) -> usize {
    page.clamp(1, total_pages(len, page_size))
}

/// Slice page `page_index` (1-based, clamped) out of `items`.
pub fn paginate<T>(items: &[T], page_size: usize, page_index: usize) -> &[T] {
    let page_size = page_size.max(1);
    let page = clamp_page(page_index, items.len(), page_size);
    let start = (page - 1) * page_size;
    let end = (start + page_size).min(items.len());
    items.get(start..end).unwrap_or(&[])
}

/// The operator's position in the paginated list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    page: usize,
    page_size: usize,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

impl PageWindow {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Move to `page`, clamped against a view of `len` items.
    pub fn set_page(&mut self, page: usize, len: usize) {
        self.page = clamp_page(page, len, self.page_size);
    }

    /// Re-clamp after the view length changed.
    pub fn reclamp(&mut self, len: usize) {
        self.set_page(self.page, len);
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    pub fn total_pages(&self, len: usize) -> usize {
        total_pages(len, self.page_size)
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        paginate(items, self.page_size, self.page)
    }
}
