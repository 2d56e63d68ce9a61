use ammonia::{Builder, UrlRelative};
use url::Url;

/// Strip scripts, event handlers and other unsafe markup from feed HTML.
///
/// Relative links are resolved against `base` when it is a valid URL.
pub fn sanitise_html(html: &str, base: Option<&str>) -> String {
    let mut builder = Builder::default();
    if let Some(base) = base.and_then(|b| Url::parse(b).ok()) {
        builder.url_relative(UrlRelative::RewriteWithBase(base));
    }
    builder.clean(html).to_string()
}
