//! `sitemap.xml` and `robots.txt`.
//!
//! Entry collection is separate from XML rendering so the URL set can be
//! checked without parsing XML.

use chrono::NaiveDate;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde::Serialize;
use std::io::Cursor;
use strum::{AsRefStr, Display};

use crate::blog::BlogPost;
use crate::catalog::Catalog;

const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const CITY_PAGE_PRIORITY: f32 = 0.7;
const POST_PRIORITY: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChangeFreq {
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitemapEntry {
    pub loc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<NaiveDate>,
    pub changefreq: ChangeFreq,
    pub priority: f32,
}

const STATIC_PAGES: &[(&str, ChangeFreq, f32)] = &[
    ("", ChangeFreq::Weekly, 1.0),
    ("/products", ChangeFreq::Weekly, 0.9),
    ("/services", ChangeFreq::Weekly, 0.9),
    ("/about", ChangeFreq::Monthly, 0.8),
    ("/contact", ChangeFreq::Monthly, 0.8),
    ("/blog", ChangeFreq::Daily, 0.8),
    ("/locations", ChangeFreq::Monthly, 0.6),
];

/// Every URL in the sitemap, in output order.
///
/// `base_url` must not end with `/`. Drafts in `posts` are skipped.
pub fn sitemap_entries(base_url: &str, catalog: &Catalog, posts: &[BlogPost]) -> Vec<SitemapEntry> {
    let mut entries: Vec<SitemapEntry> = STATIC_PAGES
        .iter()
        .map(|(path, changefreq, priority)| SitemapEntry {
            loc: format!("{base_url}{path}"),
            lastmod: None,
            changefreq: *changefreq,
            priority: *priority,
        })
        .collect();

    let city_pages = catalog
        .product_city_pages()
        .into_iter()
        .chain(catalog.service_city_pages());
    entries.extend(city_pages.map(|page| SitemapEntry {
        loc: format!("{base_url}{}", page.path()),
        lastmod: None,
        changefreq: ChangeFreq::Monthly,
        priority: CITY_PAGE_PRIORITY,
    }));

    entries.extend(
        posts
            .iter()
            .filter(|post| post.is_published())
            .map(|post| SitemapEntry {
                loc: format!("{base_url}{}", post.path()),
                lastmod: Some(post.updated_at.date_naive()),
                changefreq: ChangeFreq::Weekly,
                priority: POST_PRIORITY,
            }),
    );

    entries
}

pub fn render_sitemap(entries: &[SitemapEntry]) -> Result<String, quick_xml::Error> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut urlset = BytesStart::new("urlset");
    urlset.push_attribute(("xmlns", SITEMAP_NAMESPACE));
    writer.write_event(Event::Start(urlset))?;

    for entry in entries {
        writer.write_event(Event::Start(BytesStart::new("url")))?;
        write_text_element(&mut writer, "loc", &entry.loc)?;
        if let Some(lastmod) = entry.lastmod {
            write_text_element(&mut writer, "lastmod", &lastmod.format("%Y-%m-%d").to_string())?;
        }
        write_text_element(&mut writer, "changefreq", entry.changefreq.as_ref())?;
        write_text_element(&mut writer, "priority", &format!("{:.1}", entry.priority))?;
        writer.write_event(Event::End(BytesEnd::new("url")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("urlset")))?;
    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_text_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    name: &str,
    text: &str,
) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

pub fn robots_txt(base_url: &str) -> String {
    format!(
        "User-agent: *\nAllow: /\nDisallow: /admin/\nDisallow: /api/\n\nSitemap: {base_url}/sitemap.xml\n"
    )
}
