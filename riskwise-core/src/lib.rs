//! # Riskwise Core
//!
//! Services around the risk calculation engine: the calculation request
//! service, the risk register with its storage backends, CSV/JSON export,
//! layered configuration and the HTTP gateway.

pub mod calculation;
pub mod config;
pub mod error;
pub mod export;
pub mod gateway;
pub mod ids;
pub mod register;

// Re-export commonly used types at the crate root.
pub use calculation::{
    RiskCalculationInput, RiskCalculationResult, RiskCalculationService, RiskTrend,
};
pub use config::{RiskwiseConfig, load_config};
pub use error::{RegisterError, Result, RiskwiseError};
pub use export::{DateRange, ExportDocument, ExportFormat, ExportOptions};
pub use gateway::{ApiResponse, AppState};
pub use register::{
    NewRiskEntry, RiskEntryPatch, RiskFilter, RiskRegister, RiskRegisterEntry, RiskRepository,
    RiskStatus, open_repository,
};
