//! Shared User-Agent strings for download and search HTTP clients.

/// Default User-Agent for file downloads.
#[must_use]
pub(crate) fn default_download_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("bookfetch/{version} (personal-library-sync)")
}

/// Default User-Agent for catalog search requests.
#[must_use]
pub(crate) fn default_search_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("bookfetch/{version} (catalog-search)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agents_carry_crate_version() {
        let version = env!("CARGO_PKG_VERSION");
        assert!(default_download_user_agent().starts_with(&format!("bookfetch/{version} ")));
        assert!(default_search_user_agent().starts_with(&format!("bookfetch/{version} ")));
    }
}
