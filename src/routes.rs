// Route resolution - maps navigation state to a resource name
//
// Pages are identified by strings like "/positions". The resource name is the
// page with its leading separator removed.

use std::sync::{Mutex, PoisonError};

/// Separator that prefixes every page identifier
pub const ROUTE_SEPARATOR: char = '/';

/// Source of the current navigation state
pub trait RouteResolver: Send + Sync {
    /// Page identifier of the current route, e.g. "/positions"
    fn current_page(&self) -> String;
}

/// Strip the leading separator from a page identifier
///
/// Only one separator is removed; anything after it is returned untouched.
pub fn resource_name(page: &str) -> &str {
    page.strip_prefix(ROUTE_SEPARATOR).unwrap_or(page)
}

/// Route holder updated by the host on navigation
#[derive(Debug, Default)]
pub struct CurrentRoute {
    page: Mutex<String>,
}

impl CurrentRoute {
    pub fn new(page: impl Into<String>) -> Self {
        Self {
            page: Mutex::new(page.into()),
        }
    }

    /// Record a navigation to another page
    pub fn navigate(&self, page: impl Into<String>) {
        let page = page.into();
        tracing::debug!(page = %page, "Route changed");
        *self.page.lock().unwrap_or_else(PoisonError::into_inner) = page;
    }
}

impl RouteResolver for CurrentRoute {
    fn current_page(&self) -> String {
        self.page
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_name_strips_one_separator() {
        assert_eq!(resource_name("/positions"), "positions");
        assert_eq!(resource_name("portfolios"), "portfolios");
        assert_eq!(resource_name("//odd"), "/odd");
        assert_eq!(resource_name(""), "");
    }

    #[test]
    fn test_navigate_updates_current_page() {
        let route = CurrentRoute::new("/positions");
        assert_eq!(route.current_page(), "/positions");

        route.navigate("/portfolios");
        assert_eq!(route.current_page(), "/portfolios");
    }
}
