use core::fmt;

/// BASIC-visible error codes.
///
/// BASIC programs see these as plain numbers in the error register; user
/// code may also raise arbitrary codes of its own through `SetError`, so
/// this catalog is a convention, not an exhaustive domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i32)]
pub enum ErrorCode {
    /// Catch-all for failures inside the runtime itself.
    Internal = -1,
    /// The named file does not exist.
    FileNotFound = 100,
    /// Permission was denied.
    AccessDenied = 101,
    /// The path exceeds the platform limit.
    PathTooLong = 102,
    /// The disk is out of space.
    DiskFull = 103,
    /// A file path names a directory.
    PathIsDirectory = 104,
    /// A directory path names a file.
    PathIsNotDirectory = 105,
    /// The directory has entries.
    DirectoryNotEmpty = 106,
    /// The locale name is not recognized.
    InvalidLocaleName = 107,
    /// Catch-all for input/output failures.
    IoFailure = 108,
}

impl ErrorCode {
    /// The numeric form BASIC programs compare against.
    pub const fn code(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl TryFrom<i32> for ErrorCode {
    type Error = i32;

    /// Look a number up in the catalog; user-defined codes come back as
    /// `Err` untouched.
    fn try_from(code: i32) -> Result<Self, i32> {
        use ErrorCode::*;
        Ok(match code {
            -1 => Internal,
            100 => FileNotFound,
            101 => AccessDenied,
            102 => PathTooLong,
            103 => DiskFull,
            104 => PathIsDirectory,
            105 => PathIsNotDirectory,
            106 => DirectoryNotEmpty,
            107 => InvalidLocaleName,
            108 => IoFailure,
            _ => return Err(code),
        })
    }
}
