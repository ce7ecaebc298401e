// ── Page cursor ──
//
// Tracks which plan entry a session is bound to and where it is in that
// provider's listing. Once bound, the session never changes provider.

use crate::provider::{Backend, PaginationStyle, ProviderPage};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CursorState {
    /// No page loaded yet; the next load walks the plan.
    #[default]
    Unstarted,
    Bound {
        entry: usize,
        backend: Backend,
        token: Option<String>,
        more_pages: bool,
        pages_loaded: u32,
    },
    /// The bound provider failed, or no provider could serve the request.
    Exhausted,
}

impl CursorState {
    /// State after the first page from plan entry `entry`.
    pub fn bind(entry: usize, backend: Backend, page: &ProviderPage) -> Self {
        Self::Bound {
            entry,
            backend,
            token: page.next_token.clone(),
            more_pages: page.more_pages,
            pages_loaded: 1,
        }
    }

    /// Record a further page from the bound provider.
    pub fn advance(&mut self, page: &ProviderPage) {
        if let Self::Bound {
            token,
            more_pages,
            pages_loaded,
            ..
        } = self
        {
            token.clone_from(&page.next_token);
            *more_pages = page.more_pages;
            *pages_loaded = pages_loaded.saturating_add(1);
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, Self::Bound { .. })
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Bound { token, .. } => token.as_deref(),
            _ => None,
        }
    }

    /// Whether another load could return data.
    pub fn has_more(&self) -> bool {
        match self {
            Self::Unstarted => true,
            Self::Bound {
                backend,
                token,
                more_pages,
                pages_loaded,
                ..
            } => has_next(
                backend.pagination(),
                token.as_deref(),
                *more_pages,
                *pages_loaded <= 1,
            ),
            Self::Exhausted => false,
        }
    }
}

/// Continuation rule per pagination style.
///
/// Trailing cursors continue exactly when the token is non-blank. Flagged
/// cursors need the flag and a non-blank token, except on the first page
/// where the flag alone decides and a blank token re-asks without one.
pub fn has_next(
    style: PaginationStyle,
    token: Option<&str>,
    more_pages: bool,
    first_page: bool,
) -> bool {
    let has_token = token.is_some_and(|t| !t.trim().is_empty());
    match style {
        PaginationStyle::TrailingCursor => has_token,
        PaginationStyle::FlaggedCursor => more_pages && (has_token || first_page),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_cursor_ignores_flag() {
        let style = PaginationStyle::TrailingCursor;
        assert!(has_next(style, Some("abc"), false, false));
        assert!(!has_next(style, Some("  "), true, true));
        assert!(!has_next(style, None, true, false));
    }

    #[test]
    fn flagged_cursor_needs_flag() {
        let style = PaginationStyle::FlaggedCursor;
        assert!(!has_next(style, Some("abc"), false, false));
        assert!(has_next(style, Some("abc"), true, false));
        assert!(!has_next(style, None, true, false));
    }

    #[test]
    fn flagged_first_page_trusts_flag_with_blank_token() {
        assert!(has_next(PaginationStyle::FlaggedCursor, None, true, true));
        assert!(!has_next(PaginationStyle::FlaggedCursor, Some("x"), false, true));
    }

    #[test]
    fn advance_only_touches_bound_state() {
        let first = ProviderPage::flagged(Vec::new(), None, true);
        let mut cursor = CursorState::bind(2, Backend::Graph, &first);
        assert!(cursor.has_more());

        cursor.advance(&ProviderPage::flagged(Vec::new(), None, true));
        assert!(!cursor.has_more());
        assert!(cursor.is_bound());

        let mut exhausted = CursorState::Exhausted;
        exhausted.advance(&first);
        assert_eq!(exhausted, CursorState::Exhausted);
    }
}
