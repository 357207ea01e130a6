//! `fara serve` — boots the HTTP service.

use clap::Args;

#[derive(Args, Debug)]
pub struct ServeArgs {}

pub async fn run(_args: ServeArgs) -> anyhow::Result<()> {
    let settings = fara_api::Settings::from_env();
    fara_api::run(settings).await
}
