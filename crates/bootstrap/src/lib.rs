pub mod analytic;
pub mod engine;
pub mod null_distribution;
pub mod resampler;
pub mod studentizer;

pub use analytic::{AnalyticScreen, ScreenResult, ScreenStep};
pub use engine::SpaTest;
pub use null_distribution::{loglog_threshold, retained_mean, NullDistribution};
pub use resampler::{gather_into, Block, StationaryBootstrap};
pub use studentizer::{bootstrap_std_dev, studentize, StudentizedStatistics, Studentizer};
