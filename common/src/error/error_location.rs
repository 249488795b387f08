use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FormatResult};
use std::panic::Location as PanicLocation;

/// Source position of the code that raised an error.
///
/// Captured with `Location::caller()` from `#[track_caller]` functions, so the
/// position is the `?` or construction site rather than the helper that built
/// the error. Doubles as the `at` line of an error report's stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorLocation {
    pub file: &'static str,
    pub line: u32,
    pub column: u32,
}

impl ErrorLocation {
    pub const fn from(location: &'static PanicLocation<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
            column: location.column(),
        }
    }

    /// Renders the location as a stack frame line (`at file:line:column`).
    pub fn as_frame(&self) -> String {
        format!("at {}:{}:{}", self.file, self.line, self.column)
    }
}

impl Display for ErrorLocation {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "[{}:{}:{}]", self.file, self.line, self.column)
    }
}
