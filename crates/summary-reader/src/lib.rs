//! Summary time series reader.
//!
//! A summary run consists of a specification file (`.SMSPEC` / `.FSMSPEC`)
//! describing the recorded series, and result data either in one unified
//! file or one file per report step. This crate:
//!
//! - builds canonical keys (`WOPR:OP_1`, `BPR:12,3,4`, `RWFT:2-3`) for every
//!   series and merges them over a restart chain
//! - locates every timestep without reading sample values
//! - loads vectors lazily, by seeking to single values or by reading whole
//!   `PARAMS` arrays
//! - exports a single-file `.ESMRY` cache and reads it back
//!
//! # Example
//!
//! ```no_run
//! use summary_reader::{Summary, SummarySource};
//!
//! let summary = Summary::open("NORNE_ATW2013.SMSPEC")?;
//! let fopt = summary.get("FOPT")?;
//! let dates = summary.dates_at_report_steps()?;
//! for key in summary.list_keys("WOPR:*")? {
//!     println!("{} [{}]", key, summary.unit(&key)?);
//! }
//! # Ok::<(), summary_reader::SummaryError>(())
//! ```

pub mod cache;
pub mod catalog;
pub mod chain;
pub mod error;
pub mod loader;
pub mod node;
pub mod pattern;
pub mod results;
pub mod smspec;
pub mod source;
pub mod summary;

pub use cache::{cache_path, CachedSummary};
pub use catalog::SummaryCatalog;
pub use chain::{ChainLink, RestartChain};
pub use error::{SummaryError, SummaryResult};
pub use loader::{LoadStrategy, VectorCache, INVALID_VALUE};
pub use node::{Category, LgrCell, SummaryNode, NO_NAME};
pub use pattern::KeyPattern;
pub use results::TimeStep;
pub use smspec::{RestartInfo, StartDate};
pub use source::SummarySource;
pub use summary::{Summary, SummaryOptions};
