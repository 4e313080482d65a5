//! Torznab capability and RSS feed rendering.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::backend::SearchHit;
use crate::identity::native_to_borrowed;

/// Subcategory reported for hits the backend did not classify.
pub const DEFAULT_SUBCATEGORY: u32 = 5040;

/// Category trees advertised in caps: `(id, name, [(subcat id, name)])`.
pub const CATEGORY_TREES: &[(u32, &str, &[(u32, &str)])] = &[
    (
        5000,
        "TV",
        &[(5030, "TV/SD"), (5040, "TV/HD"), (5045, "TV/UHD")],
    ),
    (
        2000,
        "Movies",
        &[(2030, "Movies/SD"), (2040, "Movies/HD"), (2045, "Movies/UHD")],
    ),
];

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Renders Torznab documents.
#[derive(Debug, Clone)]
pub struct SearchFeedBuilder {
    title: String,
    max_results: u32,
}

impl SearchFeedBuilder {
    pub fn new(title: impl Into<String>, max_results: u32) -> Self {
        Self {
            title: title.into(),
            max_results,
        }
    }

    /// The `t=caps` document.
    pub fn caps(&self) -> String {
        let mut xml = String::with_capacity(1024);
        xml.push_str(XML_HEADER);
        xml.push_str("\n<caps>\n");
        let _ = writeln!(
            xml,
            r#"  <server version="1.0" title="{}" />"#,
            xml_escape(&self.title)
        );
        let _ = writeln!(
            xml,
            r#"  <limits max="{max}" default="{max}" />"#,
            max = self.max_results
        );
        xml.push_str("  <searching>\n");
        xml.push_str(r#"    <search available="yes" supportedParams="q" />"#);
        xml.push('\n');
        xml.push_str(r#"    <tv-search available="yes" supportedParams="q,season,ep" />"#);
        xml.push('\n');
        xml.push_str(r#"    <movie-search available="yes" supportedParams="q" />"#);
        xml.push('\n');
        xml.push_str(r#"    <music-search available="no" supportedParams="q" />"#);
        xml.push('\n');
        xml.push_str(r#"    <book-search available="no" supportedParams="q" />"#);
        xml.push('\n');
        xml.push_str("  </searching>\n  <categories>\n");
        for (id, name, subcats) in CATEGORY_TREES {
            let _ = writeln!(xml, r#"    <category id="{}" name="{}">"#, id, name);
            for (sub_id, sub_name) in *subcats {
                let _ = writeln!(xml, r#"      <subcat id="{}" name="{}" />"#, sub_id, sub_name);
            }
            xml.push_str("    </category>\n");
        }
        xml.push_str("  </categories>\n</caps>\n");
        xml
    }

    /// An RSS feed of `hits`. `offset` and `total` describe the page.
    pub fn feed(
        &self,
        hits: &[SearchHit],
        offset: u32,
        total: usize,
        published: DateTime<Utc>,
    ) -> String {
        let mut xml = String::with_capacity(512 + hits.len() * 1024);
        xml.push_str(XML_HEADER);
        xml.push('\n');
        xml.push_str(
            r#"<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom" xmlns:torznab="http://torznab.com/schemas/2015/feed">"#,
        );
        xml.push_str("\n<channel>\n");
        let _ = writeln!(xml, "<title>{}</title>", xml_escape(&self.title));
        let _ = writeln!(
            xml,
            "<description>{} ed2k search</description>",
            xml_escape(&self.title)
        );
        let _ = writeln!(
            xml,
            r#"<torznab:response offset="{}" total="{}" />"#,
            offset, total
        );

        let pub_date = published.to_rfc2822();
        for hit in hits {
            self.write_item(&mut xml, hit, &pub_date);
        }

        xml.push_str("</channel>\n</rss>\n");
        xml
    }

    /// A well-formed feed with no items.
    pub fn empty_feed(&self) -> String {
        self.feed(&[], 0, 0, Utc::now())
    }

    fn write_item(&self, xml: &mut String, hit: &SearchHit, pub_date: &str) {
        let link = native_to_borrowed(&hit.native_hash, &hit.display_name, hit.size_bytes);
        let uri = xml_escape(&link.uri);
        let subcat = hit.category_id.unwrap_or(DEFAULT_SUBCATEGORY);
        let parent = parent_category(subcat);

        xml.push_str("<item>\n");
        let _ = writeln!(xml, "  <title>{}</title>", xml_escape(&hit.display_name));
        let _ = writeln!(xml, "  <guid>{}</guid>", link.borrowed_hash);
        let _ = writeln!(xml, "  <pubDate>{}</pubDate>", pub_date);
        let _ = writeln!(xml, "  <size>{}</size>", hit.size_bytes);
        let _ = writeln!(xml, "  <link>{}</link>", uri);
        let _ = writeln!(xml, "  <category>{}</category>", parent);
        let _ = writeln!(xml, "  <category>{}</category>", subcat);
        let _ = writeln!(
            xml,
            r#"  <enclosure url="{}" length="{}" type="application/x-bittorrent" />"#,
            uri, hit.size_bytes
        );
        write_attr(xml, "category", &parent.to_string());
        write_attr(xml, "category", &subcat.to_string());
        write_attr(xml, "seeders", &hit.source_count.to_string());
        write_attr(xml, "peers", &hit.source_count.to_string());
        write_attr(xml, "size", &hit.size_bytes.to_string());
        write_attr(xml, "grabs", "0");
        write_attr(xml, "infohash", &link.borrowed_hash);
        write_attr(xml, "magneturl", &uri);
        write_attr(xml, "downloadvolumefactor", "0");
        write_attr(xml, "uploadvolumefactor", "1");
        xml.push_str("</item>\n");
    }
}

/// Torznab `<error>` document.
pub fn error_xml(code: u32, description: &str) -> String {
    format!(
        "{}\n<error code=\"{}\" description=\"{}\" />\n",
        XML_HEADER,
        code,
        xml_escape(description)
    )
}

/// 5040 -> 5000, 2045 -> 2000.
fn parent_category(subcat: u32) -> u32 {
    subcat / 1000 * 1000
}

/// `value` must already be escaped.
fn write_attr(xml: &mut String, name: &str, value: &str) {
    let _ = writeln!(xml, r#"  <torznab:attr name="{}" value="{}" />"#, name, value);
}

pub fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
            c => out.push(c),
        }
    }
    out
}
