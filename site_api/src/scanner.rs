//! Server-side accessibility scan: fetch a public page and run the static
//! checks from `wcag_core` over its HTML.

use std::error::Error as _;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use reqwest::{
    Client,
    header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT},
    redirect::Policy,
};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;
use wcag_core::accessibility::{StaticReport, analyze_html};

use crate::error::ScanError;

pub const SCANNER_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; AccessibilityTester/1.0; +https://thewcag.com)";
const SCANNER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const SCANNER_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";
const MAX_REDIRECTS: usize = 10;

/// Accepts absolute http(s) URLs whose host is not loopback or a private
/// IPv4 range.
///
/// ```
/// use wcag_site_api::scanner::is_valid_url;
/// assert!(is_valid_url("https://example.com"));
/// assert!(!is_valid_url("http://192.168.1.1/admin"));
/// ```
pub fn is_valid_url(input: &str) -> bool {
    let Ok(url) = Url::parse(input) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    if matches!(host.as_str(), "localhost" | "127.0.0.1" | "0.0.0.0") {
        return false;
    }
    if host.starts_with("10.") || host.starts_with("192.168.") {
        return false;
    }
    !(16..=31).any(|octet| host.starts_with(&format!("172.{octet}.")))
}

#[derive(Debug, Error)]
#[error("redirect to {0} is not allowed")]
struct BlockedRedirect(String);

/// Builds the scan client. Every redirect hop is held to [`is_valid_url`].
pub fn client() -> Result<Client, reqwest::Error> {
    let policy = Policy::custom(|attempt| {
        if attempt.previous().len() > MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else if is_valid_url(attempt.url().as_str()) {
            attempt.follow()
        } else {
            let target = attempt.url().to_string();
            attempt.error(BlockedRedirect(target))
        }
    });
    Client::builder().redirect(policy).build()
}

fn blocked_redirect(err: &reqwest::Error) -> Option<&BlockedRedirect> {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(blocked) = cause.downcast_ref::<BlockedRedirect>() {
            return Some(blocked);
        }
        source = cause.source();
    }
    None
}

pub struct FetchedPage {
    /// URL after redirects.
    pub url: String,
    pub html: String,
}

pub async fn fetch_page(client: &Client, url: &str, timeout: Duration) -> Result<FetchedPage, ScanError> {
    let response = client
        .get(url)
        .timeout(timeout)
        .header(USER_AGENT, SCANNER_USER_AGENT)
        .header(ACCEPT, SCANNER_ACCEPT)
        .header(ACCEPT_LANGUAGE, SCANNER_ACCEPT_LANGUAGE)
        .send()
        .await
        .map_err(|err| match blocked_redirect(&err) {
            Some(blocked) => {
                warn!(url, error = %blocked, "scan redirect refused");
                ScanError::InvalidUrl
            }
            None => ScanError::from(err),
        })?;
    let status = response.status();
    if !status.is_success() {
        let code = status.as_u16();
        let reason = status.canonical_reason().unwrap_or_default().to_string();
        debug!(url, code, "upstream refused scan");
        return Err(match code {
            401 | 403 => ScanError::Blocked { status: code, reason },
            _ => ScanError::Upstream { status: code, reason },
        });
    }
    let final_url = response.url().to_string();
    let html = response.text().await?;
    Ok(FetchedPage { url: final_url, html })
}

/// Fetches `url` and analyzes it without the address policy check.
pub(crate) async fn fetch_and_analyze(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> Result<StaticReport, ScanError> {
    let page = fetch_page(client, url, timeout).await?;
    let analysis = analyze_html(&page.html);
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let report = StaticReport::new(page.url, timestamp, analysis);
    info!(
        url = %report.url,
        violations = report.summary.violations,
        passes = report.summary.passes,
        "accessibility test completed"
    );
    Ok(report)
}

pub async fn scan(client: &Client, url: &str, timeout: Duration) -> Result<StaticReport, ScanError> {
    if !is_valid_url(url) {
        return Err(ScanError::InvalidUrl);
    }
    info!(url, "starting accessibility test");
    fetch_and_analyze(client, url, timeout).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::StatusCode, routing::get};
    use tokio::net::TcpListener;

    #[test]
    fn rejects_private_and_local_hosts() {
        for url in [
            "http://localhost:3000",
            "http://127.0.0.1/",
            "http://0.0.0.0",
            "http://192.168.1.1",
            "https://10.0.0.8/x",
            "http://172.16.0.1",
            "http://172.31.255.255",
            "http://LOCALHOST/",
        ] {
            assert!(!is_valid_url(url), "{url}");
        }
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        for url in ["ftp://example.com", "file:///etc/passwd", "example.com", "", "javascript:alert(1)"] {
            assert!(!is_valid_url(url), "{url}");
        }
    }

    #[test]
    fn accepts_public_hosts() {
        for url in [
            "https://example.com",
            "http://example.com/path?q=1",
            "https://172.32.0.1",
            "https://172.15.0.1",
            "https://sub.domain.example.org:8443/",
        ] {
            assert!(is_valid_url(url), "{url}");
        }
    }

    async fn serve(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn analyzes_fetched_page() {
        let base = serve(Router::new().route(
            "/",
            get(|| async {
                axum::response::Html(
                    r#"<html lang="en"><head><title>Shop</title></head><body><main><img src="a.png"></main></body></html>"#,
                )
            }),
        ))
        .await;
        let report = fetch_and_analyze(&Client::new(), &format!("{base}/"), Duration::from_secs(5))
            .await
            .expect("report");
        assert_eq!(report.url, format!("{base}/"));
        assert_eq!(report.page_metadata.title.as_deref(), Some("Shop"));
        assert!(report.results.violations.iter().any(|rule| rule.id == "image-alt"));
        assert_eq!(report.summary.violations, report.results.violations.len());
        assert!(report.static_analysis);
    }

    #[tokio::test]
    async fn maps_upstream_statuses() {
        let base = serve(
            Router::new()
                .route("/private", get(|| async { StatusCode::FORBIDDEN }))
                .route("/gone", get(|| async { StatusCode::NOT_FOUND })),
        )
        .await;
        let client = Client::new();
        let blocked = fetch_and_analyze(&client, &format!("{base}/private"), Duration::from_secs(5)).await;
        assert!(matches!(blocked, Err(ScanError::Blocked { status: 403, .. })));

        let missing = fetch_and_analyze(&client, &format!("{base}/gone"), Duration::from_secs(5))
            .await
            .err()
            .expect("404 fails");
        assert_eq!(missing.to_string(), "HTTP 404: Not Found");
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn slow_pages_time_out() {
        let base = serve(Router::new().route(
            "/",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                "late"
            }),
        ))
        .await;
        let result = fetch_and_analyze(&Client::new(), &base, Duration::from_millis(100)).await;
        assert!(matches!(result, Err(ScanError::Timeout)));
    }

    #[tokio::test]
    async fn redirects_into_private_hosts_are_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        let app = Router::new()
            .route(
                "/hop",
                get(move || async move {
                    axum::response::Redirect::temporary(&format!("http://localhost:{port}/admin"))
                }),
            )
            .route("/admin", get(|| async { "internal" }));
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let client = client().expect("client");
        let result = fetch_page(&client, &format!("http://127.0.0.1:{port}/hop"), Duration::from_secs(5)).await;
        assert!(matches!(result, Err(ScanError::InvalidUrl)));

        let direct = fetch_page(&client, &format!("http://127.0.0.1:{port}/admin"), Duration::from_secs(5))
            .await
            .expect("no redirect involved");
        assert_eq!(direct.html, "internal");
    }

    #[tokio::test]
    async fn scan_refuses_private_targets_before_fetching() {
        let result = scan(&Client::new(), "http://127.0.0.1:1/", Duration::from_secs(1)).await;
        assert!(matches!(result, Err(ScanError::InvalidUrl)));
    }
}
