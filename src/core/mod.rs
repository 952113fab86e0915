pub mod bundle;
pub mod engine;
pub mod planner;

pub use crate::domain::model::{BundleLayout, CertificateSummary, RenewalPlan, RenewalReport};
pub use crate::domain::ports::{CertificateApi, ConfigProvider, ServiceRestarter};
pub use crate::utils::error::Result;
