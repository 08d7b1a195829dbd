pub mod config;
pub mod errors;
pub mod filters;
pub mod metrics;
pub mod reader;
pub mod results;
pub mod search;

pub use config::{EncodingMode, ScanConfig};
pub use errors::{ScanError, ScanResult};
pub use reader::{ContentSource, FsSource, ThrottledReader};
pub use results::{MatchList, ScanOutput};
pub use search::{scan, MatchPattern, Scanner};
