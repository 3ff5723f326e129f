//! `health` command - probe the inference server

use anyhow::Result;

use super::{CommonArgs, Setup};

pub fn execute(common: &CommonArgs) -> Result<()> {
    let setup = Setup::resolve(common)?;
    let server = setup.embed_server()?;

    let health = server.health()?;
    println!("✓ {} ({})", server.base_url(), health.status);
    for (key, value) in &health.details {
        println!("   {}: {}", key, value);
    }

    // Optional endpoint: absent on some servers
    match server.models() {
        Ok(models) => println!("   models: {}", models),
        Err(e) => tracing::debug!(error = %e, "no model listing"),
    }

    Ok(())
}
