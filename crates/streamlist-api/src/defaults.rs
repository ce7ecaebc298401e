// ── Field default policies ──
//
// The backends omit fields inconsistently. Each missing field gets one
// named policy here instead of a per-provider guess. Pagination flags err
// toward fetching more; counts err toward zero.

/// Value assumed when a query-graph response omits `hasNextPage`.
pub const MISSING_HAS_NEXT_PAGE: bool = true;

/// Value assumed when a response omits a viewer/view/follower count.
pub const MISSING_COUNT: u64 = 0;

/// Resolve an optional `hasNextPage` flag.
pub fn has_next_page(raw: Option<bool>) -> bool {
    raw.unwrap_or(MISSING_HAS_NEXT_PAGE)
}

/// Resolve an optional count. Negative values are treated as missing.
pub fn count(raw: Option<i64>) -> u64 {
    raw.and_then(|n| u64::try_from(n).ok())
        .unwrap_or(MISSING_COUNT)
}

/// Normalize a continuation token: blank strings mean "no token".
pub fn cursor(raw: Option<String>) -> Option<String> {
    raw.filter(|c| !c.trim().is_empty())
}
