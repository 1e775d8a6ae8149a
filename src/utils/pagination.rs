/// Page/limit/offset resolved from optional query parameters.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
    pub offset: u64,
}

pub const MAX_PER_PAGE: u64 = 100;

impl Pagination {
    /// `page` starts at 1; `per_page` is clamped to 1..=100. Huge page numbers
    /// saturate instead of overflowing and simply return an empty page.
    pub fn new(page: Option<u64>, per_page: Option<u64>, default_per_page: u64) -> Self {
        let per_page = per_page.unwrap_or(default_per_page).clamp(1, MAX_PER_PAGE);
        let page = page.unwrap_or(1).max(1);
        let offset = (page - 1).saturating_mul(per_page);

        Self {
            page,
            per_page,
            offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page() {
        let p = Pagination::new(None, None, 20);
        assert_eq!(p, Pagination { page: 1, per_page: 20, offset: 0 });
    }

    #[test]
    fn clamps_page_size() {
        assert_eq!(Pagination::new(Some(2), Some(0), 10).per_page, 1);
        assert_eq!(Pagination::new(Some(2), Some(5_000), 10).per_page, MAX_PER_PAGE);
        assert_eq!(Pagination::new(Some(3), Some(10), 10).offset, 20);
        assert_eq!(Pagination::new(Some(0), Some(10), 10).page, 1);
    }

    #[test]
    fn huge_pages_saturate() {
        let p = Pagination::new(Some(u64::MAX), Some(100), 10);
        assert_eq!(p.page, u64::MAX);
        assert_eq!(p.offset, u64::MAX);
    }
}
