//! Reader and writer for the named-array block container.
//!
//! Grid, initialization, summary specification and summary result files all
//! share one container: a flat sequence of named, typed arrays. Each array is
//! a header (name, element count, type tag) followed by its payload. Two
//! layouts exist:
//!
//! - **Unformatted**: big-endian binary, payload split into blocks bracketed
//!   by byte-length markers
//! - **Formatted**: fixed-width text columns
//!
//! # Example
//!
//! ```no_run
//! use ecl_format::EclFile;
//!
//! let file = EclFile::open("CASE.EGRID")?;
//! for entry in file.entries() {
//!     println!("{} {} {}", entry.name, entry.array_type, entry.count);
//! }
//! let dims = file.get_int_named("GRIDHEAD")?;
//! # Ok::<(), ecl_format::EclFormatError>(())
//! ```

pub mod array;
pub mod binary;
pub mod block;
pub mod error;
pub mod formatted;
pub mod reader;
pub mod types;
pub mod writer;

pub use array::ArrayData;
pub use block::{BlockLayout, BlockRun, FormattedLayout};
pub use error::{EclFormatError, EclResult};
pub use reader::{ArrayEntry, EclFile};
pub use types::{
    is_formatted_path, ArrayType, MAX_BLOCK_ELEMENTS, MAX_BLOCK_ELEMENTS_STRING, SIZE_OF_MARKER,
};
pub use writer::EclOutput;
