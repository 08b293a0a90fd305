//! Sitemap protocol XML rendering.

use std::fmt::Display;

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::{Error, Result, SitemapIndexEntry, UrlEntry};

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const IMAGE_NS: &str = "http://www.google.com/schemas/sitemap-image/1.1";

type XmlWriter = Writer<Vec<u8>>;

fn xml_error(err: impl Display) -> Error {
    Error::Serialization(format!("XML write failed: {err}"))
}

fn open(writer: &mut XmlWriter, start: BytesStart<'_>) -> Result<()> {
    writer.write_event(Event::Start(start)).map_err(xml_error)
}

fn close(writer: &mut XmlWriter, name: &str) -> Result<()> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_error)
}

fn text_element(writer: &mut XmlWriter, name: &str, text: &str) -> Result<()> {
    open(writer, BytesStart::new(name))?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_error)?;
    close(writer, name)
}

fn start_document() -> Result<XmlWriter> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;
    Ok(writer)
}

fn finish(writer: XmlWriter) -> Result<String> {
    String::from_utf8(writer.into_inner()).map_err(xml_error)
}

fn format_lastmod(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(super) fn write_urlset(entries: &[UrlEntry]) -> Result<String> {
    let mut writer = start_document()?;

    let mut root = BytesStart::new("urlset");
    root.push_attribute(("xmlns", SITEMAP_NS));
    if entries.iter().any(|entry| !entry.images().is_empty()) {
        root.push_attribute(("xmlns:image", IMAGE_NS));
    }
    open(&mut writer, root)?;

    for entry in entries {
        open(&mut writer, BytesStart::new("url"))?;
        text_element(&mut writer, "loc", entry.loc())?;
        if let Some(lastmod) = entry.lastmod() {
            text_element(&mut writer, "lastmod", &format_lastmod(lastmod))?;
        }
        if let Some(changefreq) = entry.changefreq() {
            text_element(&mut writer, "changefreq", changefreq.as_str())?;
        }
        if let Some(priority) = entry.priority() {
            text_element(&mut writer, "priority", &format!("{priority:.1}"))?;
        }
        for image in entry.images() {
            open(&mut writer, BytesStart::new("image:image"))?;
            text_element(&mut writer, "image:loc", image.loc())?;
            if let Some(title) = image.title() {
                text_element(&mut writer, "image:title", title)?;
            }
            if let Some(caption) = image.caption() {
                text_element(&mut writer, "image:caption", caption)?;
            }
            close(&mut writer, "image:image")?;
        }
        close(&mut writer, "url")?;
    }

    close(&mut writer, "urlset")?;
    finish(writer)
}

pub(super) fn write_index(entries: &[SitemapIndexEntry]) -> Result<String> {
    let mut writer = start_document()?;

    let mut root = BytesStart::new("sitemapindex");
    root.push_attribute(("xmlns", SITEMAP_NS));
    open(&mut writer, root)?;

    for entry in entries {
        open(&mut writer, BytesStart::new("sitemap"))?;
        text_element(&mut writer, "loc", entry.loc())?;
        if let Some(lastmod) = entry.lastmod() {
            text_element(&mut writer, "lastmod", &format_lastmod(lastmod))?;
        }
        close(&mut writer, "sitemap")?;
    }

    close(&mut writer, "sitemapindex")?;
    finish(writer)
}
