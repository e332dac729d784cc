/// Query string parameters in the order they are emitted
pub type QueryParams = Vec<(String, String)>;

/// Builds request URLs for one service's endpoints
pub trait QueryUrlBuilder {
    /// Everything needed to address one request
    type Query;

    fn build_query_url(&self, query: &Self::Query) -> String;
}

/// Join a base URL, a path and URL-encoded query parameters.
///
/// Path segments are joined with single slashes and the path keeps any
/// trailing slash it was given. Without parameters no `?` is appended.
pub fn build_url(base: &str, path: &str, params: &[(String, String)]) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    let mut url = format!("{}/{}", base, path);

    if !params.is_empty() {
        let query = params
            .iter()
            .map(|(key, value)| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            })
            .collect::<Vec<_>>()
            .join("&");
        url.push('?');
        url.push_str(&query);
    }

    url
}

/// Convenience for building a parameter list from string pairs
pub fn params<K, V, I>(pairs: I) -> QueryParams
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: ToString,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.to_string()))
        .collect()
}
