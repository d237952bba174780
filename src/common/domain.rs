/// Normalize a domain: lowercase + strip trailing dot.
pub fn normalize(domain: &str) -> String {
    let d = domain.trim().to_ascii_lowercase();
    d.strip_suffix('.').unwrap_or(&d).to_string()
}

/// Compare two domains after normalization.
pub fn domains_equal(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Extract domain part from an email address (after `@`).
/// Returns None if no `@` is present.
pub fn domain_from_email(email: &str) -> Option<&str> {
    email.rsplit_once('@').map(|(_, domain)| domain)
}

/// Number of dot-separated labels in a domain.
///
/// `example.com` → 2, `mail.example.com` → 3. A domain with more than two
/// labels is treated as a subdomain for DMARC `sp=` purposes; this is a
/// label-count heuristic, not a Public Suffix List lookup.
pub fn label_count(domain: &str) -> usize {
    let d = normalize(domain);
    if d.is_empty() {
        return 0;
    }
    d.split('.').filter(|l| !l.is_empty()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercase() {
        assert_eq!(normalize("EXAMPLE.COM"), "example.com");
    }

    #[test]
    fn normalize_strips_trailing_dot() {
        assert_eq!(normalize("example.com."), "example.com");
    }

    #[test]
    fn domains_equal_case_insensitive() {
        assert!(domains_equal("Example.COM", "example.com."));
    }

    #[test]
    fn domain_from_email_basic() {
        assert_eq!(domain_from_email("dmarc@example.com"), Some("example.com"));
        assert_eq!(domain_from_email("no-at-sign"), None);
    }

    #[test]
    fn label_count_distinguishes_subdomains() {
        assert_eq!(label_count("example.com"), 2);
        assert_eq!(label_count("mail.example.com"), 3);
        assert_eq!(label_count(""), 0);
    }
}
