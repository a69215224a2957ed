use serde::Serialize;

/// Requested page resolved into an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
    pub offset: i64,
}

/// LIMIT/OFFSET pair handed to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Resolve a raw `?page=` value. Anything missing, non-numeric or below 1
    /// becomes page 1.
    pub fn parse(raw: Option<&str>, per_page: i64) -> Self {
        let page = raw
            .and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1);
        Self::new(page, per_page)
    }

    pub fn new(page: i64, per_page: i64) -> Self {
        let page = page.max(1);
        Self {
            page,
            per_page,
            offset: per_page.saturating_mul(page - 1),
        }
    }

    pub fn window(&self) -> PageWindow {
        PageWindow {
            offset: self.offset,
            limit: self.per_page,
        }
    }
}

impl PageWindow {
    /// Shrink the window so it never reaches past `total` rows.
    pub fn clamp_to(self, total: i64) -> Self {
        let remaining = total.saturating_sub(self.offset).max(0);
        Self {
            offset: self.offset,
            limit: self.limit.min(remaining).max(0),
        }
    }
}
