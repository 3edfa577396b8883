//! `Link` response header parsing (RFC 8288 subset)
//!
//! Upstream paginates with headers of the form:
//!
//! ```text
//! <https://api.github.com/repositories/1/releases?page=2>; rel="next",
//! <https://api.github.com/repositories/1/releases?page=5>; rel="last"
//! ```

/// A single link-value: target URL and its relation types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkValue {
    pub url: String,
    pub rels: Vec<String>,
}

impl LinkValue {
    pub fn has_rel(&self, rel: &str) -> bool {
        self.rels.iter().any(|r| r.eq_ignore_ascii_case(rel))
    }
}

/// Parse every link-value in a `Link` header.
///
/// Malformed trailing segments are ignored rather than rejected.
pub fn parse_link_header(value: &str) -> Vec<LinkValue> {
    let mut links = Vec::new();
    let mut rest = value;

    while let Some(start) = rest.find('<') {
        let after_open = &rest[start + 1..];
        let Some(end) = after_open.find('>') else {
            break;
        };

        let url = after_open[..end].trim().to_string();
        let tail = &after_open[end + 1..];
        let params_end = tail.find('<').unwrap_or(tail.len());
        let params = tail[..params_end].trim().trim_end_matches(',');

        let rels = params
            .split(';')
            .filter_map(|param| {
                let (key, value) = param.split_once('=')?;
                if !key.trim().eq_ignore_ascii_case("rel") {
                    return None;
                }
                Some(value.trim().trim_matches('"').to_string())
            })
            .flat_map(|value| {
                value
                    .split_whitespace()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();

        links.push(LinkValue { url, rels });
        rest = &tail[params_end..];
    }

    links
}

/// The `rel="next"` target, if any
pub fn next_link(value: &str) -> Option<String> {
    parse_link_header(value)
        .into_iter()
        .find(|link| link.has_rel("next"))
        .map(|link| link.url)
}
