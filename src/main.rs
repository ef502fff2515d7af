use anyhow::{bail, Context, Result};
use brandscope_core::BrandsFile;
use research_service::ResearchService;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "brandscope=info,research_service=info,reddit_sources=info,llm_providers=info"
                    .into()
            }),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(config_path), Some(brand_name)) = (args.next(), args.next()) else {
        bail!("Usage: brandscope <brands.json> <brand name>");
    };

    let raw = std::fs::read_to_string(&config_path)
        .with_context(|| format!("reading {config_path}"))?;
    let brands = BrandsFile::parse(&raw).context("parsing brands config")?;
    let brand = brands.find(&brand_name)?;

    tracing::info!(
        "Starting deep dive on {} [{}], keywords: {}",
        brand.name,
        brand.category,
        brand.keywords.join(", ")
    );

    let service = ResearchService::from_env().context("building research pipeline")?;
    let mut handle = service.spawn(brand)?;

    // Stream progress while the pipeline runs in the background.
    let mut progress = handle
        .take_progress()
        .expect("fresh handle always has a progress stream");
    let printer = tokio::spawn(async move {
        while let Some(event) = progress.recv().await {
            tracing::info!("{event}");
        }
    });

    let report = handle.wait().await?;
    let _ = printer.await;

    tracing::info!("{}", report.summary());
    for (subreddit, count) in report.top_subreddits(5) {
        tracing::info!("  r/{subreddit}: {count} relevant mentions");
    }

    // The full judged set goes to stdout; rendering and export are the
    // consumer's job.
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
