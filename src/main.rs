use agon::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let account = std::fs::read_to_string("account.json")?;
    let credentials: Credentials = serde_json::from_str(&account)?;

    let agon = AgonBuilder::new().build()?;
    agon.login_if_needed(&credentials).await?;

    // state call against the probe identifiers doubles as a connectivity self-test
    let state = agon.media_api().prepare_media_request(None).await?;
    println!("media state self-test: {state}");

    let episode_id = std::env::args().nth(1).unwrap_or_else(|| "22".to_string());
    let info = agon.get_episode_info(&episode_id).await?;
    println!("info: {info:#?}");

    let resolved = agon.resolve_media(&info, "small").await?;
    println!("media url: {}", resolved.media_url);
    println!("referer: {}", resolved.referer);
    Ok(())
}
