use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, IntoParams, ToSchema)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

pub(crate) fn default_page() -> u32 {
    1
}

pub(crate) fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PaginationParams {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.page < 1 {
            return Err("page must be >= 1".to_string());
        }
        if self.per_page < 1 || self.per_page > MAX_PER_PAGE {
            return Err(format!("per_page must be between 1 and {}", MAX_PER_PAGE));
        }
        Ok(())
    }

    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1).saturating_mul(self.limit())
    }

    pub fn limit(&self) -> usize {
        self.per_page.max(1) as usize
    }
}

/// One page of a ranked view. `total` counts every entry that survived
/// filtering, not just the ones on this page.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardView<T> {
    pub data: Vec<T>,
    pub current_page: u32,
    pub per_page: u32,
    pub total: u64,
    pub last_page: u32,
}

impl<T> LeaderboardView<T> {
    pub fn new(data: Vec<T>, current_page: u32, per_page: u32, total: u64) -> Self {
        let last_page = total.div_ceil(u64::from(per_page.max(1))).max(1) as u32;
        Self {
            data,
            current_page,
            per_page,
            total,
            last_page,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
