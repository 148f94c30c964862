use sha2::{Digest as _, Sha256};
use url::Url;

/// Query parameters that only carry referral or campaign tracking.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_content",
    "utm_term",
    "ref",
    "source",
    "fbclid",
    "gclid",
];

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}

/// Normalize a URL so equivalent links compare equal.
///
/// Scheme and host are lowercased, tracking parameters and the fragment are
/// dropped, the remaining query is sorted by key, and a trailing path slash
/// is removed unless the path is the root. Unparseable input is returned as-is.
pub fn canonicalize(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    let mut url = match Url::parse(raw) {
        Ok(url) => url,
        Err(_) => return raw.to_string(),
    };

    // url lowercases special-scheme hosts on parse; do it for the rest too
    let lowered = url
        .host_str()
        .map(str::to_lowercase)
        .filter(|host| Some(host.as_str()) != url.host_str());
    if let Some(host) = lowered {
        if url.set_host(Some(&host)).is_err() {
            return raw.to_string();
        }
    }

    let mut kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    kept.sort_by(|a, b| a.0.cmp(&b.0));

    if kept.is_empty() {
        url.set_query(None);
    } else {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(kept.iter())
            .finish();
        url.set_query(Some(&query));
    }

    url.set_fragment(None);

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        url.set_path(if trimmed.is_empty() { "/" } else { trimmed });
    }

    url.to_string()
}

/// Full SHA-256 of the input, as `sha256:<64 hex>`.
pub fn fingerprint(canonical: &str) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(canonical.as_bytes())))
}

/// Short deterministic id: the first six bytes of the SHA-256, as `sha256:<12 hex>`.
pub fn item_id(seed: &str) -> String {
    let hash = Sha256::digest(seed.as_bytes());
    format!("sha256:{}", hex::encode(&hash[..6]))
}

/// Identity seed for items that carry no URL.
pub fn fallback_key(title: &str, source_name: &str) -> String {
    format!("{title}||{source_name}")
}

/// Identity triple for an item: `(canonical_url, fingerprint, id)`.
///
/// The canonical URL seeds both hashes; without a URL the title/source
/// fallback key is used instead.
pub fn identity(raw_url: &str, title: &str, source_name: &str) -> (String, String, String) {
    let canonical = canonicalize(raw_url);
    let seed = if canonical.is_empty() {
        fallback_key(title, source_name)
    } else {
        canonical.clone()
    };
    (canonical, fingerprint(&seed), item_id(&seed))
}

/// Lowercased host with a leading `www.` stripped. Empty when the URL has no host.
pub fn domain_of(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    let Ok(url) = Url::parse(raw.trim()) else {
        return String::new();
    };
    let host = url.host_str().unwrap_or("").to_lowercase();
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}
