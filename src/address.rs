//! Server address handling
//!
//! Turns whatever the user typed into the form into a fully qualified URL,
//! and derives the probe, launch and display forms of that URL.

use reqwest::Url;

/// Default Home Assistant HTTP port
pub const DEFAULT_PORT: u16 = 8123;

/// Substrings and prefixes that mark an address as being on the local network.
const LOCAL_MARKER: &str = ".local";
const LOCAL_PREFIXES: [&str; 3] = ["192.168.", "10.0.", "172.16."];

/// Normalize a raw user-entered address into a fully qualified URL.
///
/// - Keeps an explicit `http://` / `https://` scheme.
/// - Otherwise picks `http://` for local addresses and `https://` for everything else.
/// - Appends `:8123` when no port is present, keeping a trailing slash last.
///
/// Known limitation: a bare host followed by a path (`ha.example.com/dashboard`)
/// has no port, so `:8123` is appended after the path.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();

    let mut url = if has_scheme(trimmed) {
        trimmed.to_string()
    } else if is_local(trimmed) {
        format!("http://{}", trimmed)
    } else {
        format!("https://{}", trimmed)
    };

    if !has_port(&url) {
        if let Some(stripped) = url.strip_suffix('/') {
            url = format!("{}:{}/", stripped, DEFAULT_PORT);
        } else {
            url = format!("{}:{}", url, DEFAULT_PORT);
        }
    }

    url
}

fn has_scheme(address: &str) -> bool {
    address.starts_with("http://") || address.starts_with("https://")
}

/// Whether the address points at the local network (plain HTTP is expected there).
pub fn is_local(address: &str) -> bool {
    address.contains(LOCAL_MARKER) || LOCAL_PREFIXES.iter().any(|p| address.starts_with(p))
}

/// Port detection ignores the `scheme://` separator.
fn has_port(url: &str) -> bool {
    let rest = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    rest.contains(':')
}

/// URL of the reachability probe: `<url>/api/` with the slash collapsed.
pub fn probe_url(url: &str) -> String {
    format!("{}api/", with_trailing_slash(url))
}

/// URL handed to the embedded view.
///
/// With a token the view starts on the auth callback so the frontend picks up
/// the session; without one the server URL is opened as is.
pub fn launch_url(url: &str, token: Option<&str>) -> String {
    match token {
        Some(t) if !t.is_empty() => format!("{}?auth_callback=1", with_trailing_slash(url)),
        _ => url.to_string(),
    }
}

/// Short `host[:port]` form for progress text. Falls back to the input when it
/// does not parse as a URL.
pub fn display_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match (parsed.host_str(), parsed.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            _ => url.to_string(),
        },
        Err(_) => url.to_string(),
    }
}

fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_hostname_gets_http_and_port() {
        assert_eq!(
            normalize("homeassistant.local"),
            "http://homeassistant.local:8123"
        );
    }

    #[test]
    fn test_lan_address_with_port_and_slash_is_kept() {
        assert_eq!(
            normalize("192.168.1.10:8123/"),
            "http://192.168.1.10:8123/"
        );
    }

    #[test]
    fn test_remote_hostname_gets_https_and_port() {
        assert_eq!(
            normalize("myha.duckdns.org"),
            "https://myha.duckdns.org:8123"
        );
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        assert_eq!(normalize("  10.0.0.5  "), "http://10.0.0.5:8123");
    }

    #[test]
    fn test_trailing_slash_stays_after_port() {
        assert_eq!(
            normalize("myha.duckdns.org/"),
            "https://myha.duckdns.org:8123/"
        );
        assert_eq!(normalize("172.16.4.2/"), "http://172.16.4.2:8123/");
    }

    #[test]
    fn test_explicit_scheme_is_kept() {
        assert_eq!(
            normalize("http://ha.example.com"),
            "http://ha.example.com:8123"
        );
        assert_eq!(
            normalize("https://homeassistant.local:443"),
            "https://homeassistant.local:443"
        );
    }

    #[test]
    fn test_local_prefix_must_lead() {
        // Only the leading octets mark a LAN address
        assert_eq!(normalize("host110.0.example.com"), "https://host110.0.example.com:8123");
        assert_eq!(normalize("nas.local.example.com"), "http://nas.local.example.com:8123");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in [
            "homeassistant.local",
            "192.168.1.10:8123/",
            "myha.duckdns.org",
            "https://ha.example.com:8443/",
        ] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "not idempotent for {raw}");
        }
    }

    #[test]
    fn test_exactly_one_scheme_and_one_default_port() {
        for raw in ["a.local", "192.168.0.2", "10.0.0.1/", "example.org", "example.org/"] {
            let url = normalize(raw);
            let schemes = url.matches("http://").count() + url.matches("https://").count();
            assert_eq!(schemes, 1, "{url}");
            assert_eq!(url.matches(":8123").count(), 1, "{url}");
        }
    }

    #[test]
    fn test_path_without_port_appends_after_path() {
        assert_eq!(
            normalize("https://ha.example.com/dashboard"),
            "https://ha.example.com/dashboard:8123"
        );
    }

    #[test]
    fn test_probe_url() {
        assert_eq!(
            probe_url("http://homeassistant.local:8123"),
            "http://homeassistant.local:8123/api/"
        );
        assert_eq!(
            probe_url("http://192.168.1.10:8123/"),
            "http://192.168.1.10:8123/api/"
        );
    }

    #[test]
    fn test_launch_url() {
        let url = "https://myha.duckdns.org:8123";
        assert_eq!(launch_url(url, None), url);
        assert_eq!(launch_url(url, Some("")), url);
        assert_eq!(
            launch_url(url, Some("abc")),
            "https://myha.duckdns.org:8123/?auth_callback=1"
        );
        assert_eq!(
            launch_url("http://ha.local:8123/", Some("abc")),
            "http://ha.local:8123/?auth_callback=1"
        );
    }

    #[test]
    fn test_display_url() {
        assert_eq!(
            display_url("http://homeassistant.local:8123"),
            "homeassistant.local:8123"
        );
        // Default port for the scheme is not shown
        assert_eq!(display_url("https://ha.example.com:443/"), "ha.example.com");
        assert_eq!(display_url("not a url"), "not a url");
    }
}
