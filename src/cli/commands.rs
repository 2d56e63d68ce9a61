use chrono::{Local, Utc};

use crate::app::{AppContext, Result};
use crate::render::{write_output, Renderer};
use crate::scheduler::{self, CycleReport};

pub async fn update(ctx: &mut AppContext, feed: Option<&str>) -> Result<CycleReport> {
    tracing::info!("Starting update");
    let report = scheduler::run_cycle(
        &mut ctx.state,
        &ctx.config.feeds,
        Utc::now(),
        feed,
        ctx.fetcher.as_ref(),
        &ctx.hooks,
    )
    .await?;

    tracing::info!(
        fetched = report.fetched.len(),
        failed = report.failed.len(),
        new_articles = report.new_articles,
        expired = report.expired,
        "Finished update"
    );
    Ok(report)
}

pub fn write(ctx: &AppContext) -> Result<()> {
    tracing::info!("Starting write");
    let templates = ctx.templates()?;
    let renderer = Renderer::new(&ctx.config, &templates, &ctx.hooks, Local);
    let document = renderer.compose(&ctx.state, Utc::now())?;
    write_output(&ctx.config.output_file, &ctx.dir, &document, &ctx.hooks)?;
    tracing::info!("Finished write");
    Ok(())
}

pub fn list(ctx: &AppContext) -> Result<()> {
    for feed in ctx.state.feeds.values() {
        println!("{}", feed.url);
        println!("  Hash: {}", feed.url_hash());
        println!("  Title: {}", feed.title.as_deref().unwrap_or("(none)"));
        println!("  Link: {}", feed.link.as_deref().unwrap_or("(none)"));
        println!("  Period: {} minutes", feed.period);
        println!(
            "  Last updated: {}",
            feed.last_update.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

pub fn show_template(ctx: &AppContext, item: bool) -> Result<()> {
    let templates = ctx.templates()?;
    if item {
        print!("{}", templates.item);
    } else {
        println!("{}", templates.page);
    }
    Ok(())
}
