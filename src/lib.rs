pub mod audit;
pub mod config;
pub mod detection;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod tax;
pub mod web;

pub use models::{Detection, PlateBox, RecognizedPlate};
pub use detection::{DetectionPipeline, PlateDetector, build_standard_pipeline, detect_number_plates, filter_by_confidence};
pub use detection::ocr::{TextReader, recognize_number_plates};
pub use pipeline::{
    Pipeline, PipelineData, PipelineStep, PipelineContext, DebugConfig
};
pub use report::{Notice, NoticeLevel, PlateReport, ScanReport};
pub use tax::{TaxCode, TaxStatus, TaxValidation, extract_tax_info, validate_tax};
