//! Text rewrites that turn a Hugo Markdown body into DEV Markdown.
//!
//! Every pass works on single lines only: a shortcode, image or `<img>` tag
//! split over several lines is left as is. The passes are meant to run in the
//! order of [`transform_body`].

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// `{{< youtube 30a0WrfaS2A >}}`
static SHORTCODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{< ([a-z]+) (.*?) >\}\}").expect("literal regex"));

/// `![alt](path)` or `![alt](path "title")`
static MARKDOWN_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"!\[([^\]\n]*)\]\(([^)\s]+)((?:[ \t]+"[^"\n]*")?)\)"#).expect("literal regex")
});

/// `src="path.png"`, restricted to the image extensions DEV can render.
static HTML_IMAGE_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"src="([^"\n]*\.(?:png|PNG|jpeg|JPG|jpg|gif|GIF|svg|SVG))""#)
        .expect("literal regex")
});

static URL_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*:").expect("literal regex"));

/// Hugo shortcodes become Liquid tags:
///
/// ```text
/// {{< youtube 30a0WrfaS2A >}}   =>   {% youtube 30a0WrfaS2A %}
/// ```
pub fn shortcodes_to_liquid(body: &str) -> String {
    SHORTCODE.replace_all(body, "{% $1 $2 %}").into_owned()
}

/// Prefix every relative Markdown image path with `base`.
///
/// With `base = "https://example.dev/post-1/"`, `![diagram](net.png)` becomes
/// `![diagram](https://example.dev/post-1/net.png)`.
pub fn absolutize_markdown_images(body: &str, base: &str) -> String {
    MARKDOWN_IMAGE
        .replace_all(body, |caps: &Captures| {
            let path = &caps[2];
            if !is_relative(path) {
                return caps[0].to_string();
            }
            format!("![{}]({base}{path}{})", &caps[1], &caps[3])
        })
        .into_owned()
}

/// Prefix the `src` of `<img>` tags with `base`, keeping the rest of the tag.
pub fn absolutize_html_images(body: &str, base: &str) -> String {
    HTML_IMAGE_SRC
        .replace_all(body, |caps: &Captures| {
            let path = &caps[1];
            if !is_relative(path) {
                return caps[0].to_string();
            }
            format!("src=\"{base}{path}\"")
        })
        .into_owned()
}

/// Paths already usable from another origin are left alone.
fn is_relative(path: &str) -> bool {
    !(path.starts_with('/') || path.starts_with('#') || URL_SCHEME.is_match(path))
}

/// Shortcodes, then Markdown images, then HTML images. Anchor remapping
/// ([`crate::anchor::convert_anchor_ids`]) runs on the result.
pub fn transform_body(body: &str, base: &str) -> String {
    let body = shortcodes_to_liquid(body);
    let body = absolutize_markdown_images(&body, base);
    absolutize_html_images(&body, base)
}
