//! Print sitemap XML.

use anyhow::{Result, bail};
use sitemap_core::SitemapDate;

use crate::utils::context::AppContext;

/// Execute the index command
pub fn index(ctx: &AppContext) -> Result<()> {
    ctx.require_catalog()?;
    let index = ctx
        .scheduler
        .generator()
        .build_index(&ctx.config.site.base_url)?;
    print!("{}", index.to_xml()?);
    Ok(())
}

/// Execute the show command
pub fn show(ctx: &AppContext, date: &str) -> Result<()> {
    let date: SitemapDate = date.parse()?;
    let Some(record) = ctx.partitions.load(date)? else {
        bail!("No sitemap has been built for {date}. Run `sitemapctl generate {date}`.");
    };
    print!("{}", record.xml);
    Ok(())
}

/// Execute the archive command
pub fn archive(ctx: &AppContext, name: &str, page: usize) -> Result<()> {
    ctx.require_catalog()?;
    let Some(urls) = ctx.scheduler.generator().archive_page(name, page)? else {
        bail!("No enabled archive named '{name}'");
    };
    if urls.is_empty() {
        bail!("Archive '{name}' has no page {page}");
    }
    print!("{}", urls.to_xml()?);
    Ok(())
}
