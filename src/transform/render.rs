//! HTML templates for the link-card output modes. Every interpolated value is
//! escaped.

use crate::html::escape;
use crate::models::LinkMetadata;

/// Full card: optional image, title, optional description, site name.
pub fn render_card(meta: &LinkMetadata, class_name: &str) -> String {
    let class = escape(class_name);
    let mut html = format!(
        r#"<a href="{}" class="{class}" target="_blank" rel="noopener noreferrer">"#,
        escape(&meta.url)
    );
    html.push('\n');

    if !meta.image.is_empty() {
        html.push_str(&format!(
            r#"  <div class="{class}__image"><img src="{}" alt="" loading="lazy" /></div>"#,
            escape(&meta.image)
        ));
        html.push('\n');
    }

    html.push_str(&format!(r#"  <div class="{class}__content">"#));
    html.push('\n');
    html.push_str(&format!(
        r#"    <div class="{class}__title">{}</div>"#,
        escape(&meta.title)
    ));
    html.push('\n');

    if !meta.description.is_empty() {
        html.push_str(&format!(
            r#"    <div class="{class}__description">{}</div>"#,
            escape(&meta.description)
        ));
        html.push('\n');
    }

    html.push_str(&format!(
        concat!(
            r#"    <div class="{class}__meta">"#,
            "\n",
            r#"      <span class="{class}__site">{site}</span>"#,
            "\n",
            "    </div>\n",
            "  </div>\n",
            "</a>",
        ),
        class = class,
        site = escape(&meta.site_name),
    ));
    html
}

/// Data-attribute-only anchor for sites that style and script cards
/// themselves.
pub fn render_headless(meta: &LinkMetadata, class_name: &str) -> String {
    format!(
        concat!(
            r#"<a href="{url}" class="{class}" target="_blank" rel="noopener noreferrer" data-link-card"#,
            r#" data-title="{title}" data-description="{description}" data-image="{image}" data-site-name="{site}"></a>"#,
        ),
        url = escape(&meta.url),
        class = escape(class_name),
        title = escape(&meta.title),
        description = escape(&meta.description),
        image = escape(&meta.image),
        site = escape(&meta.site_name),
    )
}

/// Custom element placeholder, replaced later by a component.
pub fn render_marker(meta: &LinkMetadata, tag_name: &str) -> String {
    let tag = escape(tag_name);
    format!(
        concat!(
            r#"<{tag} data-url="{url}" data-title="{title}" data-description="{description}""#,
            r#" data-image="{image}" data-site-name="{site}"></{tag}>"#,
        ),
        tag = tag,
        url = escape(&meta.url),
        title = escape(&meta.title),
        description = escape(&meta.description),
        image = escape(&meta.image),
        site = escape(&meta.site_name),
    )
}

/// Plain link used when the metadata could not be fetched.
pub fn render_fallback(url: &str) -> String {
    let url = escape(url);
    format!(r#"<a href="{url}" target="_blank" rel="noopener noreferrer">{url}</a>"#)
}
