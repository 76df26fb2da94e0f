//! Splits a fully qualified domain name into host label and parent domain

/// Host label and parent domain addressed by the provider API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FqdnParts {
    /// Leftmost label, empty when the name is used as-is
    pub host: String,
    /// Domain the records live under
    pub domain: String,
}

/// Splits `fqdn` on its first dot, but only when it has more than one dot.
///
/// `api.sub.example.com` becomes (`api`, `sub.example.com`) while
/// `example.com` stays whole with an empty host. Labels are not validated.
pub fn split_fqdn(fqdn: &str) -> FqdnParts {
    if fqdn.matches('.').count() > 1 {
        if let Some((host, domain)) = fqdn.split_once('.') {
            return FqdnParts {
                host: host.to_string(),
                domain: domain.to_string(),
            };
        }
    }

    FqdnParts {
        host: String::new(),
        domain: fqdn.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_three_labels() {
        let parts = split_fqdn("home.example.com");
        assert_eq!(parts.host, "home");
        assert_eq!(parts.domain, "example.com");
    }

    #[test]
    fn test_split_only_on_first_dot() {
        let parts = split_fqdn("api.sub.example.com");
        assert_eq!(parts.host, "api");
        assert_eq!(parts.domain, "sub.example.com");
    }

    #[test]
    fn test_single_dot_is_not_split() {
        let parts = split_fqdn("example.com");
        assert_eq!(parts.host, "");
        assert_eq!(parts.domain, "example.com");
    }

    #[test]
    fn test_no_dot_is_not_split() {
        let parts = split_fqdn("localhost");
        assert_eq!(parts.host, "");
        assert_eq!(parts.domain, "localhost");
    }

    #[test]
    fn test_labels_are_not_validated() {
        let parts = split_fqdn(".example.com");
        assert_eq!(parts.host, "");
        assert_eq!(parts.domain, "example.com");

        let parts = split_fqdn("a..b");
        assert_eq!(parts.host, "a");
        assert_eq!(parts.domain, ".b");
    }
}
