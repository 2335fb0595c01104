//! Domain extraction from page addresses

use url::Url;
use warden_util::Domain;

/// Turns page addresses into trackable domains.
///
/// Never fails: unparsable addresses, untracked schemes and addresses without
/// a host all yield `None`.
#[derive(Debug, Clone)]
pub struct DomainExtractor {
    untracked_schemes: Vec<String>,
}

impl DomainExtractor {
    pub fn new(untracked_schemes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            untracked_schemes: untracked_schemes
                .into_iter()
                .map(|s| s.into().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn extract(&self, address: &str) -> Option<Domain> {
        let url = Url::parse(address.trim()).ok()?;

        if self.untracked_schemes.iter().any(|s| s == url.scheme()) {
            return None;
        }

        match url.host_str() {
            Some(host) if !host.is_empty() => Some(Domain::new(host)),
            _ => None,
        }
    }
}

impl Default for DomainExtractor {
    fn default() -> Self {
        Self::new(warden_config::DEFAULT_UNTRACKED_SCHEMES.iter().copied())
    }
}
