use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use dicom_grid::{
    InitError, Layout, LoadCoordinator, LoaderConfig, OverflowPolicy, RenderError,
    RenderingEngine, SeriesGroup, SlotId,
};

/// Stand-in engine that only logs what it is asked to draw.
struct LogEngine;

#[async_trait(?Send)]
impl RenderingEngine for LogEngine {
    async fn initialize(&self) -> Result<(), InitError> {
        Ok(())
    }

    async fn bind(&self, slot: SlotId, series: &Arc<SeriesGroup>) -> Result<(), RenderError> {
        log::info!(
            "slot {}: {} ({} images)",
            slot.0,
            series.label(),
            series.len()
        );
        Ok(())
    }

    async fn unbind(&self, slot: SlotId) {
        log::info!("slot {}: cleared", slot.0);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let _ = env_logger::Builder::from_default_env()
        .format_timestamp_secs()
        .try_init();

    let config = LoaderConfig::new()
        .with_initial_layout(Layout::TwoByTwo)
        .with_overflow_policy(OverflowPolicy::Warn);
    let coordinator = LoadCoordinator::new(LogEngine, config);
    coordinator
        .initialize()
        .await
        .expect("should have initialized the engine");

    let report = coordinator
        .load_directory(&PathBuf::from("dicom"))
        .await
        .expect("should have loaded files from directory");
    for error in &report.errors {
        log::warn!("{error}");
    }

    for layout in Layout::ALL {
        coordinator
            .switch_layout(layout)
            .await
            .expect("engine should be ready");
    }
}
