pub mod config;
pub mod config_loader;
pub mod error;
pub mod matrix;
pub mod report_formatter;
pub mod result;
pub mod sharpe;

pub use config::{RecenteringVariant, SpaConfig};
pub use config_loader::ConfigLoader;
pub use error::{SpaError, SpaResult};
pub use matrix::ReturnMatrix;
pub use report_formatter::ReportFormatter;
pub use result::{StrategyStatistic, TestResult};
pub use sharpe::{correlation, mean, sample_std_dev, sharpe_ratio};
