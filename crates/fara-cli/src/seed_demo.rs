//! `fara seed-demo` — force a demo-data seed against the configured store,
//! regardless of `FARA_DEMO`.

use clap::Args;
use fara_storage::get_store;

#[derive(Args, Debug)]
pub struct SeedDemoArgs {}

pub async fn run(_args: SeedDemoArgs) -> anyhow::Result<()> {
    let settings = fara_api::Settings::from_env();
    let store = get_store(&settings.db_backend, &settings.sqlite_path, &settings.postgres_dsn).await;
    fara_api::seed_demo_actions(store.as_ref()).await?;
    println!("demo actions seeded");
    Ok(())
}
