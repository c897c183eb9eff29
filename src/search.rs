use deunicode::deunicode;

use crate::model::{Contact, Library};

/// Normalize a string for collation and search.
/// Transliterates to ASCII, lowercases and collapses whitespace (e.g. "Émile  Zola" -> "emile zola").
pub fn normalize(s: &str) -> String {
    deunicode(s)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Stable sort by case- and accent-insensitive display name; ties keep parse order.
pub fn sort_contacts(contacts: &mut Vec<Contact>) {
    let mut keyed: Vec<(String, Contact)> = contacts
        .drain(..)
        .map(|contact| (normalize(&contact.display_name), contact))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    contacts.extend(keyed.into_iter().map(|(_, contact)| contact));
}

pub fn sort_libraries(libraries: &mut [Library]) {
    libraries.sort_by_cached_key(|library| normalize(&library.name));
}

/// True when every character of `query` (whitespace ignored) appears in `text`
/// in order, case-insensitively.
pub fn fuzzy_match(text: &str, query: &str) -> bool {
    let query: String = query
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    if query.is_empty() {
        return true;
    }

    let text = text.to_lowercase();
    let mut haystack = text.chars();
    query
        .chars()
        .all(|needle| haystack.by_ref().any(|c| c == needle))
}

/// Contacts whose display name or organization fuzzy-matches `query`.
pub fn filter_contacts<'a>(contacts: &'a [Contact], query: &str) -> Vec<&'a Contact> {
    let query = query.trim();
    contacts
        .iter()
        .filter(|contact| {
            query.is_empty()
                || fuzzy_match(&contact.display_name, query)
                || contact
                    .organization
                    .as_deref()
                    .is_some_and(|org| fuzzy_match(org, query))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContactBuilder, NamePolicy};

    fn contact(name: &str, org: Option<&str>) -> Contact {
        let mut builder = ContactBuilder::new();
        builder.display_name(name);
        if let Some(org) = org {
            builder.organization(org);
        }
        builder.finish(NamePolicy::Drop).unwrap()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Émile  Zola"), "emile zola");
        assert_eq!(normalize("Иван"), "ivan");
    }

    #[test]
    fn test_sort_is_case_insensitive_and_stable() {
        let mut first = contact("bob", None);
        first.title = Some("first".into());
        let mut second = contact("Bob", None);
        second.title = Some("second".into());
        let mut contacts = vec![contact("Émile", None), first, contact("alice", None), second];

        sort_contacts(&mut contacts);

        let names: Vec<&str> = contacts.iter().map(|c| c.display_name.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob", "Bob", "Émile"]);
        assert_eq!(contacts[1].title.as_deref(), Some("first"));
        assert_eq!(contacts[2].title.as_deref(), Some("second"));
    }

    #[test]
    fn test_fuzzy_match() {
        assert!(fuzzy_match("John Doe", "jd"));
        assert!(fuzzy_match("John Doe", "john doe"));
        assert!(fuzzy_match("anything", "  "));
        assert!(!fuzzy_match("John Doe", "dj"));
        assert!(!fuzzy_match("Jo", "joe"));
    }

    #[test]
    fn test_filter_contacts_checks_org() {
        let contacts = vec![contact("Ann", Some("Acme")), contact("Bob", None)];
        let hits = filter_contacts(&contacts, "acm");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].display_name, "Ann");
        assert_eq!(filter_contacts(&contacts, "").len(), 2);
    }
}
