use url::Url;

/// Maps a URL to the key its availability is aggregated under: the host,
/// without any port. Input that does not parse as a URL with a host is its
/// own key.
///
/// Hosts are normalised by the URL parser: lowercased, and internationalised
/// names converted to punycode (`bücher.de` becomes `xn--bcher-kva.de`).
pub fn extract_domain(raw_url: &str) -> String {
    match Url::parse(raw_url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => raw_url.to_string(),
        },
        Err(_) => raw_url.to_string(),
    }
}
