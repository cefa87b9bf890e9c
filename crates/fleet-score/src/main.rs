mod bootstrap;
mod report;

use anyhow::{Context, Result};
use score_core::settings::Settings;
use score_data::analysis::analyze_report;
use score_data::speed_limit::{HttpSpeedLimitClient, SpeedLimitLookup};

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("fleet-score v{} starting", env!("CARGO_PKG_VERSION"));

    let client = settings
        .lookup_settings()
        .and_then(|lookup| match HttpSpeedLimitClient::new(lookup) {
            Ok(client) => {
                tracing::info!("Speed limits will be resolved through the lookup service");
                Some(client)
            }
            Err(e) => {
                tracing::warn!("Speed-limit lookup unavailable ({}); using the fixed limit", e);
                None
            }
        });
    let lookup = client.as_ref().map(|c| c as &dyn SpeedLimitLookup);

    let report = analyze_report(&settings.input, lookup)
        .with_context(|| format!("failed to score {}", settings.input.display()))?;

    if settings.json_output() {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report::render_text(&report));
    }

    Ok(())
}
