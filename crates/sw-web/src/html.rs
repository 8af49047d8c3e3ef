use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters left alone in query values.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub fn encode_query_value(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}

/// Build `path?k=v&...` with encoded values.
pub fn href(path: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let query: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, encode_query_value(v)))
        .collect();
    format!("{}?{}", path, query.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_query_links() {
        assert_eq!(href("/manage", &[]), "/manage");
        assert_eq!(
            href("/manage", &[("tab", "routes"), ("delete", "+49 30/1")]),
            "/manage?tab=routes&delete=%2B49%2030%2F1"
        );
        assert_eq!(href("/security", &[("ip", "10.0.0.1")]), "/security?ip=10.0.0.1");
    }
}
