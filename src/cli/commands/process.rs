//! Process command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the process command: the full pipeline over unprocessed episodes.
pub async fn run_process(settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Process) {
        Output::error(&format!("{}", e));
        Output::info("Run 'ordskifte doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let pipeline = Pipeline::new(settings)?;

    match pipeline.run().await {
        Ok(summary) => {
            println!();
            Output::success(&format!(
                "Run complete: {} processed, {} skipped, {} failed",
                summary.processed, summary.skipped, summary.failed
            ));
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Pipeline run aborted: {}", e));
            Err(e.into())
        }
    }
}
