#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

use platecheck::DetectionPipeline;
use std::sync::Arc;

/// Pipeline over fake models, validating against [`TODAY`].
pub fn make_scanner(detector: FakeDetector, reader: ScriptedReader) -> DetectionPipeline {
    DetectionPipeline::new(Arc::new(detector), Arc::new(reader)).with_today(TODAY)
}
