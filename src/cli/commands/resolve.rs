use crate::clients::resolver::ResolverClient;
use crate::config::Config;

pub async fn cmd_resolve(config: &Config, handle: &str) -> anyhow::Result<()> {
    let resolver = ResolverClient::new(&config.proxy, &config.cache)?;
    let did = resolver.resolve_handle(handle).await?;

    println!("{} -> {}", handle.trim().trim_start_matches('@'), did);
    Ok(())
}
