//! Session cookie parsing.
//!
//! CouchDB cookie authentication hands back a `Set-Cookie` header on login;
//! the `AuthSession` pair inside it is the credential attached to every
//! subsequent request. The token is immutable once issued.

/// Name of the CouchDB authentication cookie.
pub const AUTH_COOKIE: &str = "AuthSession";

/// A parsed CouchDB session cookie.
///
/// The cookie is a semicolon-delimited list of `name=value` pairs; a pair
/// without an `=` stores an empty value. Attribute order is preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    entries: Vec<(String, String)>,
}

impl SessionToken {
    /// Parse a `Set-Cookie` style header into a token.
    pub(crate) fn parse(header: &str) -> Self {
        let entries = header
            .split(';')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| match entry.split_once('=') {
                Some((name, value)) => (name.trim().to_string(), value.trim().to_string()),
                None => (entry.to_string(), String::new()),
            })
            .collect();
        Self { entries }
    }

    /// Look up a cookie attribute by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// The `AuthSession` value, if present.
    #[must_use]
    pub fn auth_session(&self) -> Option<&str> {
        self.get(AUTH_COOKIE)
    }

    /// The `Cookie` header value sent on authenticated requests.
    pub(crate) fn cookie_header(&self) -> String {
        format!(
            "{AUTH_COOKIE}={}",
            self.auth_session().unwrap_or_default()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_value_pairs() {
        let token =
            SessionToken::parse("AuthSession=abc123; Version=1; Path=/; HttpOnly");
        assert_eq!(token.auth_session(), Some("abc123"));
        assert_eq!(token.get("Version"), Some("1"));
        assert_eq!(token.get("Path"), Some("/"));
    }

    #[test]
    fn bare_attribute_stores_empty_value() {
        let token = SessionToken::parse("AuthSession=abc123; HttpOnly");
        assert_eq!(token.get("HttpOnly"), Some(""));
        assert_eq!(token.get("Secure"), None);
    }

    #[test]
    fn cookie_header_carries_auth_session() {
        let token = SessionToken::parse("AuthSession=xyz; Path=/");
        assert_eq!(token.cookie_header(), "AuthSession=xyz");
    }
}
