//! Element types of the named-array container.
//!
//! Every array record carries a four character type tag. The tag decides the
//! on-disk element size, how many elements fit in one payload block, and the
//! column layout used by the formatted (text) variant.

use std::fmt;
use std::path::Path;

use crate::block::{BlockLayout, FormattedLayout};
use crate::error::{EclFormatError, EclResult};

/// Size in bytes of the integer block markers.
pub const SIZE_OF_MARKER: usize = 4;

/// Maximum number of numeric or logical elements per payload block.
pub const MAX_BLOCK_ELEMENTS: usize = 1000;

/// Maximum number of string elements per payload block.
pub const MAX_BLOCK_ELEMENTS_STRING: usize = 105;

/// Width of array names in headers.
pub const NAME_WIDTH: usize = 8;

/// Element type of an array record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayType {
    /// 32-bit signed integer (`INTE`)
    Inte,
    /// 32-bit float (`REAL`)
    Real,
    /// 64-bit float (`DOUB`)
    Doub,
    /// Logical stored as a 32-bit integer (`LOGI`)
    Logi,
    /// Eight character string (`CHAR`)
    Char,
    /// String of the given width (`C0nn`)
    C0nn(usize),
    /// Message record without payload (`MESS`)
    Mess,
}

impl ArrayType {
    /// Decode a type tag such as `INTE` or `C056`.
    pub fn from_tag(tag: &str) -> EclResult<Self> {
        match tag {
            "INTE" => Ok(ArrayType::Inte),
            "REAL" => Ok(ArrayType::Real),
            "DOUB" => Ok(ArrayType::Doub),
            "LOGI" => Ok(ArrayType::Logi),
            "CHAR" => Ok(ArrayType::Char),
            "MESS" => Ok(ArrayType::Mess),
            _ => {
                let width = tag
                    .strip_prefix('C')
                    .filter(|digits| digits.len() == 3 && digits.bytes().all(|b| b.is_ascii_digit()))
                    .and_then(|digits| digits.parse::<usize>().ok())
                    .filter(|width| *width > 0);

                width
                    .map(ArrayType::C0nn)
                    .ok_or_else(|| EclFormatError::UnknownArrayType(tag.to_string()))
            }
        }
    }

    /// The four character tag written to headers.
    pub fn tag(&self) -> String {
        match self {
            ArrayType::Inte => "INTE".to_string(),
            ArrayType::Real => "REAL".to_string(),
            ArrayType::Doub => "DOUB".to_string(),
            ArrayType::Logi => "LOGI".to_string(),
            ArrayType::Char => "CHAR".to_string(),
            ArrayType::C0nn(width) => format!("C{:03}", width),
            ArrayType::Mess => "MESS".to_string(),
        }
    }

    /// Size of one element on disk (binary layout).
    pub fn element_size(&self) -> usize {
        match self {
            ArrayType::Inte | ArrayType::Real | ArrayType::Logi => 4,
            ArrayType::Doub => 8,
            ArrayType::Char => 8,
            ArrayType::C0nn(width) => *width,
            ArrayType::Mess => 0,
        }
    }

    /// Number of elements in one full payload block.
    pub fn block_elements(&self) -> usize {
        match self {
            ArrayType::Char | ArrayType::C0nn(_) => MAX_BLOCK_ELEMENTS_STRING,
            _ => MAX_BLOCK_ELEMENTS,
        }
    }

    /// Short name of the element kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ArrayType::Inte => "integer",
            ArrayType::Real => "real",
            ArrayType::Doub => "double",
            ArrayType::Logi => "logical",
            ArrayType::Char | ArrayType::C0nn(_) => "string",
            ArrayType::Mess => "message",
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, ArrayType::Char | ArrayType::C0nn(_))
    }

    /// Block arithmetic for the binary layout.
    pub fn block_layout(&self) -> BlockLayout {
        BlockLayout::new(self.block_elements(), self.element_size())
    }

    /// Column arithmetic for the formatted layout.
    pub fn formatted_layout(&self) -> FormattedLayout {
        let (columns, width) = match self {
            ArrayType::Inte => (6, 12),
            ArrayType::Real => (4, 17),
            ArrayType::Doub => (3, 23),
            ArrayType::Logi => (25, 3),
            ArrayType::Char => (7, 11),
            ArrayType::C0nn(width) => ((80 / (width + 3)).max(1), width + 3),
            ArrayType::Mess => (1, 0),
        };
        FormattedLayout::new(self.block_elements(), columns, width)
    }

    /// Number of payload bytes following the header.
    pub fn size_on_disk(&self, count: usize, formatted: bool) -> u64 {
        if *self == ArrayType::Mess {
            return 0;
        }
        if formatted {
            self.formatted_layout().size_on_disk(count as u64)
        } else {
            self.block_layout().size_on_disk(count as u64)
        }
    }
}

impl fmt::Display for ArrayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

/// Check whether a file name denotes the formatted (text) variant.
///
/// Formatted files use an extension starting with `F` (`.FEGRID`, `.FSMSPEC`,
/// `.FUNSMRY`, ...) or the numbered `.Annnn` result files.
pub fn is_formatted_path(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    let ext = ext.to_ascii_uppercase();

    if let Some(digits) = ext.strip_prefix('A') {
        return digits.len() == 4 && digits.bytes().all(|b| b.is_ascii_digit());
    }

    ext.len() > 1 && ext.starts_with('F')
}
