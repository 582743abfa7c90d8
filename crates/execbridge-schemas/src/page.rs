use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub offset: i64,
    pub limit: i64,
    pub total_elements: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl Pagination {
    pub fn new(offset: i64, limit: i64, total_elements: i64) -> Self {
        let limit = limit.max(1);
        let total_pages = (total_elements + limit - 1) / limit;
        let total_pages = total_pages.max(1);
        let current_page = offset / limit;
        Self {
            offset,
            limit,
            total_elements,
            total_pages,
            current_page,
            has_next: offset + limit < total_elements,
            has_previous: offset > 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageEnvelope<T> {
    pub content: Vec<T>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_next_and_previous() {
        let p = Pagination::new(0, 10, 25);
        assert!(p.has_next);
        assert!(!p.has_previous);
        assert_eq!(p.total_pages, 3);

        let p = Pagination::new(20, 10, 25);
        assert!(!p.has_next);
        assert!(p.has_previous);
    }

    #[test]
    fn empty_result_has_one_total_page() {
        let p = Pagination::new(0, 10, 0);
        assert_eq!(p.total_pages, 1);
    }
}
