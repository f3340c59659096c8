//! URL template resolution.
//!
//! Endpoint templates carry `{name}` placeholders anywhere in their path,
//! fragment, or query string. [`resolve`] substitutes supplied values in
//! place and turns every value whose placeholder appears nowhere into an
//! additional query parameter, so nothing a caller supplies is silently
//! dropped.

use std::collections::HashMap;

use url::form_urlencoded;
use url::Url;

/// Resolves the `{name}` placeholders of a URL template against the supplied
/// values. The input URL is never mutated.
///
/// For each entry the tag `{name}` is sought in the path, then the fragment,
/// then the raw query string; every occurrence in any of those components is
/// replaced with the value, as a literal substring (values are not escaped
/// during substitution). Entries whose tag matched nowhere are appended as
/// query parameters afterwards: the whole query is then re-encoded with its
/// pairs percent-encoded and sorted by key. Tags never supplied a value stay
/// verbatim, and `None` or an empty map returns a clone of the input
/// unchanged.
///
/// # Examples
///
/// ```
/// use restive::template::resolve;
/// use std::collections::HashMap;
/// use url::Url;
///
/// let endpoint =
///     Url::parse("http://localhost:8080/api/{user}/info?withCredentials={credentials}&withPhoto=false")
///         .unwrap();
/// let params = HashMap::from([
///     ("user".to_string(), "julien".to_string()),
///     ("credentials".to_string(), "true".to_string()),
///     ("withBio".to_string(), "true".to_string()),
/// ]);
///
/// let resolved = resolve(&endpoint, Some(&params));
/// assert_eq!(
///     resolved.as_str(),
///     "http://localhost:8080/api/julien/info?withBio=true&withCredentials=true&withPhoto=false",
/// );
/// ```
pub fn resolve(url: &Url, params: Option<&HashMap<String, String>>) -> Url {
    let mut resolved = url.clone();
    let params = match params {
        Some(params) if !params.is_empty() => params,
        _ => return resolved,
    };

    // Substitute every matchable tag first; appending query parameters
    // re-encodes the query string, which would mangle tags still waiting
    // for their value.
    let mut unmatched: Vec<(&str, &str)> = Vec::new();
    for (name, value) in params {
        if !substitute(&mut resolved, name, value) {
            unmatched.push((name.as_str(), value.as_str()));
        }
    }

    if !unmatched.is_empty() {
        append_query_pairs(&mut resolved, &unmatched);
    }

    resolved
}

/// Replaces all occurrences of `{name}` in the URL's path, fragment, and raw
/// query. Returns whether any component contained the tag.
fn substitute(url: &mut Url, name: &str, value: &str) -> bool {
    let tag = format!("{{{name}}}");
    let mut matched = false;

    // The WHATWG parser stores `{` and `}` percent-encoded in the path
    // component, so a path tag can appear in either spelling.
    let encoded_tag = format!("%7B{name}%7D");
    let path = url.path().to_owned();
    if path.contains(&tag) || path.contains(&encoded_tag) {
        let replaced = path.replace(&tag, value).replace(&encoded_tag, value);
        url.set_path(&replaced);
        matched = true;
    }

    if let Some(fragment) = url.fragment().map(str::to_owned) {
        if fragment.contains(&tag) {
            url.set_fragment(Some(&fragment.replace(&tag, value)));
            matched = true;
        }
    }

    if let Some(query) = url.query().map(str::to_owned) {
        if query.contains(&tag) {
            url.set_query(Some(&query.replace(&tag, value)));
            matched = true;
        }
    }

    matched
}

/// Merges the given pairs into the URL's query string, re-encoding the whole
/// query with its keys sorted.
fn append_query_pairs(url: &mut Url, additions: &[(&str, &str)]) {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    pairs.extend(
        additions
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string())),
    );
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    serializer.extend_pairs(&pairs);
    let encoded = serializer.finish();
    url.set_query(Some(&encoded));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn replaces_and_appends() {
        let url = Url::parse(
            "http://localhost:8080/api/{user}/info?withCredentials={credentials}&withPhoto=false",
        )
        .unwrap();
        let params = params(&[
            ("user", "julien"),
            ("credentials", "true"),
            ("withBio", "true"),
        ]);

        let resolved = resolve(&url, Some(&params));
        assert_eq!(
            resolved.as_str(),
            "http://localhost:8080/api/julien/info?withBio=true&withCredentials=true&withPhoto=false",
        );
    }

    #[test]
    fn absent_params_leave_url_untouched() {
        let url = Url::parse(
            "http://localhost:8080/api/julien/info?withBio={withBio}&withCredentials=true",
        )
        .unwrap();

        assert_eq!(resolve(&url, None).as_str(), url.as_str());
        assert_eq!(resolve(&url, Some(&HashMap::new())).as_str(), url.as_str());
    }

    #[test]
    fn unsupplied_tags_stay_verbatim() {
        let url = Url::parse("http://localhost:8080/api/{user}/files/{file}").unwrap();
        let params = params(&[("user", "julien")]);

        let resolved = resolve(&url, Some(&params));
        assert_eq!(resolved.path(), "/api/julien/files/%7Bfile%7D");
        assert!(resolved.as_str().contains("julien"));
    }

    #[test]
    fn substitutes_in_fragment() {
        let url = Url::parse("http://localhost:8080/docs#section-{chapter}").unwrap();
        let params = params(&[("chapter", "12")]);

        let resolved = resolve(&url, Some(&params));
        assert_eq!(resolved.fragment(), Some("section-12"));
    }

    #[test]
    fn path_values_are_reencoded() {
        let url = Url::parse("http://localhost:8080/api/{user}/info").unwrap();
        let params = params(&[("user", "le user")]);

        let resolved = resolve(&url, Some(&params));
        assert_eq!(resolved.path(), "/api/le%20user/info");
    }

    #[test]
    fn appended_params_are_query_encoded() {
        let url = Url::parse("http://localhost:8080/api/info?login=OAuth2").unwrap();
        let params = params(&[("name", "l'oréal & co")]);

        let resolved = resolve(&url, Some(&params));
        assert_eq!(
            resolved.query(),
            Some("login=OAuth2&name=l%27or%C3%A9al+%26+co"),
        );
    }

    #[test]
    fn resolution_composes_over_disjoint_params() {
        let url =
            Url::parse("http://localhost:8080/api/{user}/items?page={page}&limit=10").unwrap();
        let first = params(&[("user", "julien")]);
        let second = params(&[("page", "3"), ("sort", "asc")]);
        let merged = params(&[("user", "julien"), ("page", "3"), ("sort", "asc")]);

        let stepwise = resolve(&resolve(&url, Some(&first)), Some(&second));
        let at_once = resolve(&url, Some(&merged));
        assert_eq!(stepwise.as_str(), at_once.as_str());
    }

    #[test]
    fn values_are_substituted_literally() {
        // A value that itself looks like a tag is not re-substituted.
        let url = Url::parse("http://localhost:8080/api/{a}/x").unwrap();
        let params = params(&[("a", "{b}")]);

        let resolved = resolve(&url, Some(&params));
        assert_eq!(resolved.path(), "/api/%7Bb%7D/x");
    }
}
