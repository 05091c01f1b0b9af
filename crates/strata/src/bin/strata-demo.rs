//! Serves the demo API.
//!
//! ```text
//! strata-demo [config.toml]
//! ```
//!
//! Without a path the built-in defaults apply; `STRATA__*` variables
//! override either.

use strata::config::ConfigLoader;
use strata::{demo, App, ENV_PREFIX};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut loader = ConfigLoader::new().with_dotenv()?;
    if let Some(path) = std::env::args_os().nth(1) {
        loader = loader.with_file(path)?;
    }
    let config = loader.with_env_prefix(ENV_PREFIX).load()?;

    App::new(config).api(demo::api()?).run().await?;
    Ok(())
}
