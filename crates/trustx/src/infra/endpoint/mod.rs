use url::Url;

pub mod envelope;

/// Host and path of the bid endpoint.
pub const BID_PATH: &str = "//sofia.trustx.org/hb";
/// Host and path of the user sync pixel.
pub const SYNC_PATH: &str = "//sofia.trustx.org/push_sync";

/// Completes a protocol relative URL with the protocol of the page: `https`
/// on secure pages, `http` everywhere else.
pub fn for_page(path: &str, page: &Url) -> Result<Url, url::ParseError> {
    let scheme = match page.scheme() {
        "https" => "https",
        _ => "http",
    };
    Url::parse(&format!("{scheme}:{path}"))
}
