use std::ops::Range;

/// Fixed-size paging over a question set of `len` items.
///
/// Navigation only ever moves a batch index; it never touches answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batcher {
    len: usize,
    page_size: usize,
}

impl Batcher {
    /// A `page_size` of zero is treated as one.
    #[must_use]
    pub fn new(len: usize, page_size: usize) -> Self {
        Self {
            len,
            page_size: page_size.max(1),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// `ceil(len / page_size)`; zero for an empty set.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.len.div_ceil(self.page_size)
    }

    /// Index range of batch `index`, clipped to the set bounds.
    #[must_use]
    pub fn batch_range(&self, index: usize) -> Range<usize> {
        let start = index.saturating_mul(self.page_size).min(self.len);
        let end = start.saturating_add(self.page_size).min(self.len);
        start..end
    }

    #[must_use]
    pub fn has_previous(&self, index: usize) -> bool {
        index > 0
    }

    #[must_use]
    pub fn has_next(&self, index: usize) -> bool {
        index.saturating_add(1).saturating_mul(self.page_size) < self.len
    }

    /// Clamps a (possibly stale) batch index into `[0, page_count - 1]`.
    #[must_use]
    pub fn clamp(&self, index: usize) -> usize {
        index.min(self.page_count().saturating_sub(1))
    }
}
