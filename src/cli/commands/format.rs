//! Format command implementation.
//!
//! Re-runs formatting and export over saved raw transcripts, for iterating
//! on speaker maps without paying for transcription again.

use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the format command.
pub async fn run_format(settings: Settings) -> Result<()> {
    let pipeline = Pipeline::new_offline(settings)?;

    match pipeline.format_existing().await {
        Ok(summary) => {
            println!();
            Output::success(&format!(
                "Formatting complete: {} formatted, {} skipped, {} failed",
                summary.processed, summary.skipped, summary.failed
            ));
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Formatting aborted: {}", e));
            Err(e.into())
        }
    }
}
