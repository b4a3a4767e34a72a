//! Analysis pipeline and result envelope.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use paper_vis_core::analysis::AnalysisPipeline;
//! use paper_vis_core::config::ServiceConfig;
//! use paper_vis_core::transport::{HttpTransport, UploadFile};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServiceConfig::from_env()?;
//! let pipeline = AnalysisPipeline::new(&config, Arc::new(HttpTransport::new(&config)?));
//! let file = UploadFile::from_path(std::path::Path::new("paper.pdf")).await?;
//!
//! let envelope = pipeline.run(&file, None).await;
//! match envelope.metadata() {
//!     Some(metadata) => println!("{} ({} figures)", metadata.title, metadata.figures_count),
//!     None => eprintln!("failed: {}", envelope.error().unwrap_or_default()),
//! }
//! # Ok(())
//! # }
//! ```

mod envelope;
mod error;
mod pipeline;

pub use envelope::{AnalysisMetadata, ResultEnvelope, UNKNOWN_TITLE};
pub use error::{AnalysisError, CROSS_ORIGIN_MESSAGE, is_cross_origin};
pub use pipeline::{
    ACCEPTED_MEDIA_TYPE, AnalysisPipeline, AnalysisRun, COMPLETE_LABEL, DEFAULT_FAILURE_MESSAGE,
    FAILED_LABEL_PREFIX, INVALID_FILE_TYPE_MESSAGE, PREPARING_LABEL,
};
