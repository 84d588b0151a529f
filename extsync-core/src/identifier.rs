//! Subscription identifier codec.
//!
//! Wire form: `<org>_<repo>_<path>` where every path separator in `<path>` is
//! replaced by `_`. Decoding turns the remainder's `_` back into `/`, so a
//! path segment that itself contains `_` does not survive a round trip.
//! There is no escaping scheme.

use crate::error::IdentifierError;
use crate::types::SubscriptionId;

const SEPARATOR: char = '_';

/// Encode `org`, `repo` and `path` into a subscription identifier string.
pub fn encode(org: &str, repo: &str, path: &str) -> String {
    let escaped: String = path
        .chars()
        .map(|c| if c == '/' || c == '\\' { SEPARATOR } else { c })
        .collect();
    format!("{org}{SEPARATOR}{repo}{SEPARATOR}{escaped}")
}

/// Decode a subscription identifier string.
///
/// Splits on the first two `_`; all three components must be non-empty.
pub fn decode(id: &str) -> Result<SubscriptionId, IdentifierError> {
    let invalid = || IdentifierError::InvalidIdentifier { id: id.to_string() };

    let mut parts = id.splitn(3, SEPARATOR);
    let org = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
    let repo = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
    let rest = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;

    Ok(SubscriptionId {
        organization: org.to_string(),
        repository: repo.to_string(),
        extension_path: rest.replace(SEPARATOR, "/"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_replaces_separators() {
        assert_eq!(encode("acme", "web", "src/ext/pay"), "acme_web_src_ext_pay");
        assert_eq!(encode("acme", "web", "src\\ext"), "acme_web_src_ext");
    }

    #[test]
    fn decode_restores_separators() {
        let id = decode("acme_web_src_ext_pay").unwrap();
        assert_eq!(id.organization, "acme");
        assert_eq!(id.repository, "web");
        assert_eq!(id.extension_path, "src/ext/pay");
    }

    #[test]
    fn decode_is_lossy_for_underscored_segments() {
        let id = decode(&encode("acme", "web", "my_ext")).unwrap();
        assert_eq!(id.extension_path, "my/ext");
    }

    #[test]
    fn decode_rejects_empty_components() {
        assert!(decode("acme__path").is_err());
        assert!(decode("_web_path").is_err());
        assert!(decode("acme_web_").is_err());
    }
}
