use crate::extractor::identifier::Identifier;
use std::collections::HashSet;

const HREF_OPEN: &str = "href=\"";

/// Pulls account handles out of export markup.
///
/// A handle is taken from every attribute of the exact form
/// `href="https://www.<domain>/<segment>/"`, where `<segment>` holds no `"`,
/// `/` or `?`. The segment is then normalized by [`Identifier::parse`];
/// segments that do not normalize are dropped without error.
#[derive(Debug, Clone)]
pub struct IdentifierExtractor {
    profile_prefix: String,
}

impl IdentifierExtractor {
    pub fn new(platform_domain: &str) -> Self {
        Self {
            profile_prefix: format!("https://www.{}/", platform_domain),
        }
    }

    pub fn extract(&self, markup: &str) -> HashSet<Identifier> {
        let mut identifiers = HashSet::new();
        let mut cursor = 0;

        while let Some(offset) = markup[cursor..].find(HREF_OPEN) {
            let value_start = cursor + offset + HREF_OPEN.len();
            // Resume right after the opening token, not after the value, so an
            // unterminated attribute cannot swallow the links that follow it.
            cursor = value_start;

            if let Some(identifier) = self
                .profile_segment(&markup[value_start..])
                .and_then(Identifier::parse)
            {
                identifiers.insert(identifier);
            }
        }

        identifiers
    }

    /// Extracts and merges handles from several documents of the same role.
    pub fn extract_all<'a, I>(&self, documents: I) -> HashSet<Identifier>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut identifiers = HashSet::new();
        for document in documents {
            identifiers.extend(self.extract(document));
        }
        identifiers
    }

    fn profile_segment<'a>(&self, value: &'a str) -> Option<&'a str> {
        let rest = value.strip_prefix(self.profile_prefix.as_str())?;
        let end = rest.find(|c: char| matches!(c, '"' | '/' | '?'))?;

        if end > 0 && rest[end..].starts_with("/\"") {
            Some(&rest[..end])
        } else {
            None
        }
    }
}
