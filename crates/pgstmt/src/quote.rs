//! Identifier quoting.
//!
//! Quoting is catalog-aware: the reserved-keyword list comes from the loaded
//! catalog. An input that already contains a quote character is treated as
//! pre-quoted and passed through unvalidated; callers rely on that, so
//! `quote` and `unquote` are deliberately not inverses.

use crate::catalog::SchemaCatalog;

impl SchemaCatalog {
    /// Quote an identifier when needed: uppercase letters or a reserved
    /// keyword force double quotes; pre-quoted input passes through.
    pub fn quote(&self, name: &str) -> String {
        if name.contains('"') {
            return name.to_string();
        }
        if name.chars().any(|c| c.is_ascii_uppercase()) || self.is_keyword(name) {
            return format!("\"{name}\"");
        }
        name.to_string()
    }

    /// Quote a `relation` or `schema.relation` target.
    ///
    /// A single-part name lives in the default `public` schema and is
    /// emitted unqualified, as is a two-part name whose schema is `public`.
    pub fn quote_relation(&self, target: &str) -> String {
        if target.contains('"') {
            return target.to_string();
        }

        let parts: Vec<&str> = target.split('.').collect();
        if parts.len() == 1 {
            return self.quote(parts[0]);
        }
        if parts[0] == "public" {
            return self.quote(parts[1]);
        }
        format!("{}.{}", self.quote(parts[0]), self.quote(parts[1]))
    }

    /// Strip every quote character. Not an inverse of [`SchemaCatalog::quote`].
    pub fn unquote(&self, name: &str) -> String {
        if !name.contains('"') {
            return name.to_string();
        }
        name.replace('"', "")
    }
}

/// Single-quote a name for use as a `json_build_object` key literal.
pub(crate) fn single_quote(name: &str) -> String {
    format!("'{name}'")
}

#[cfg(test)]
mod tests {
    use crate::catalog::fixtures::catalog;

    #[test]
    fn quote_reserved_word() {
        assert_eq!(catalog().quote("cast"), "\"cast\"");
    }

    #[test]
    fn quote_plain_passthrough() {
        assert_eq!(catalog().quote("plain"), "plain");
    }

    #[test]
    fn quote_uppercase() {
        assert_eq!(catalog().quote("acaXac"), "\"acaXac\"");
        assert_eq!(catalog().quote("b_B"), "\"b_B\"");
    }

    #[test]
    fn quote_prequoted_unchanged() {
        assert_eq!(catalog().quote("\"already\""), "\"already\"");
        // Even a malformed pre-quoted input is passed through unvalidated.
        assert_eq!(catalog().quote("we\"ird"), "we\"ird");
    }

    #[test]
    fn quote_relation_elides_public() {
        let cat = catalog();
        assert_eq!(cat.quote_relation("test"), "test");
        assert_eq!(cat.quote_relation("Test"), "\"Test\"");
        assert_eq!(cat.quote_relation("public.Test"), "\"Test\"");
        assert_eq!(cat.quote_relation("test.Test"), "test.\"Test\"");
        assert_eq!(cat.quote_relation("Test.Test"), "\"Test\".\"Test\"");
    }

    #[test]
    fn unquote_strips_all_quotes() {
        let cat = catalog();
        assert_eq!(cat.unquote("\"b_B\""), "b_B");
        assert_eq!(cat.unquote("plain"), "plain");
    }
}
