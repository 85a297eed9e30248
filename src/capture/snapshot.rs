//! One-shot capture of every output at session start

use std::collections::HashMap;

use crate::capture::ScreenshotImage;
use crate::error::CaptureError;
use crate::wayland::{CaptureSource, WaylandHelper};

/// Frozen contents of one output
#[derive(Clone, Debug)]
pub struct OutputSnapshot {
    pub name: String,
    pub logical_size: (u32, u32),
    pub image: ScreenshotImage,
}

/// Every output as it looked when the session started.
///
/// Taken once and never refreshed; the overlay shows it instead of the live
/// desktop.
#[derive(Clone, Debug, Default)]
pub struct ScreenSnapshot {
    outputs: HashMap<String, OutputSnapshot>,
}

impl ScreenSnapshot {
    pub fn get(&self, name: &str) -> Option<&OutputSnapshot> {
        self.outputs.get(name)
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn insert(&mut self, snapshot: OutputSnapshot) {
        self.outputs.insert(snapshot.name.clone(), snapshot);
    }
}

/// Capture every output known to the helper
pub async fn capture_snapshot(helper: WaylandHelper) -> anyhow::Result<ScreenSnapshot> {
    let mut snapshot = ScreenSnapshot::default();

    for output in helper.outputs() {
        let Some(info) = helper.output_info(&output) else {
            log::warn!("Output {:?} has no info", output);
            continue;
        };
        let Some(name) = info.name.clone() else {
            log::warn!("Output {:?} has no name", output);
            continue;
        };
        let Some(logical_size) = info.logical_size else {
            log::warn!("Output {:?} has no size", output);
            continue;
        };

        let frame = helper
            .capture_source_shm(CaptureSource::Output(output.clone()), false)
            .await
            .map_err(|e| match e {
                CaptureError::Screencopy(reason) => {
                    CaptureError::Screencopy(format!("{name}: {reason}"))
                }
                other => other,
            })?;
        let image = ScreenshotImage::new(frame)?;
        log::debug!(
            "Output {}: logical_size={}x{}, image={}x{}, scale_factor={}",
            name,
            logical_size.0,
            logical_size.1,
            image.width(),
            image.height(),
            info.scale_factor
        );

        snapshot.insert(OutputSnapshot {
            name,
            logical_size: (logical_size.0.max(0) as u32, logical_size.1.max(0) as u32),
            image,
        });
    }

    if snapshot.is_empty() {
        return Err(CaptureError::NoOutputs.into());
    }
    log::info!("Captured {} output(s)", snapshot.len());
    Ok(snapshot)
}
