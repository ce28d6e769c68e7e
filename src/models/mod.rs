pub mod analysis_types;
pub mod upload_types;
