//! Error codes for all compiler diagnostics.
//!
//! The first digit names the phase that reports it:
//! - E0xxx: lexer
//! - E1xxx: parser
//! - E2xxx: name resolution
//! - E3xxx: types (including literal parsing during lowering)
//! - E9xxx: internal compiler errors

use std::fmt;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum ErrorCode {
    // Lexer
    /// Unterminated string literal
    E0001,
    /// Unknown character
    E0002,
    /// Malformed numeric literal
    E0003,
    /// Unterminated block comment
    E0004,
    /// Invalid character literal
    E0005,

    // Parser
    /// Unexpected token
    E1001,
    /// Expected expression
    E1002,
    /// Unclosed delimiter
    E1003,
    /// Expected identifier
    E1004,
    /// Expected type
    E1005,
    /// Invalid pattern
    E1006,
    /// Missing `;` after a statement
    E1007,
    /// `match` without arms
    E1008,
    /// Chained comparison operators
    E1009,

    // Resolution
    /// Undefined name
    E2001,
    /// Name defined twice in one scope
    E2002,
    /// Value used in its own initializer
    E2003,
    /// Unknown module
    E2004,

    // Types
    /// Type mismatch
    E3001,
    /// Infinite type
    E3002,
    /// Wrong number of type arguments
    E3003,
    /// Unknown record field
    E3004,
    /// Cyclic type alias
    E3005,
    /// Numeric literal out of range
    E3006,
    /// Invalid escape in a literal
    E3007,
    /// Record literal with missing or duplicate fields
    E3008,

    // Internal
    /// Internal compiler error
    E9001,
}

impl ErrorCode {
    /// Every variant, for exhaustive testing.
    pub const ALL: &[ErrorCode] = &[
        ErrorCode::E0001,
        ErrorCode::E0002,
        ErrorCode::E0003,
        ErrorCode::E0004,
        ErrorCode::E0005,
        ErrorCode::E1001,
        ErrorCode::E1002,
        ErrorCode::E1003,
        ErrorCode::E1004,
        ErrorCode::E1005,
        ErrorCode::E1006,
        ErrorCode::E1007,
        ErrorCode::E1008,
        ErrorCode::E1009,
        ErrorCode::E2001,
        ErrorCode::E2002,
        ErrorCode::E2003,
        ErrorCode::E2004,
        ErrorCode::E3001,
        ErrorCode::E3002,
        ErrorCode::E3003,
        ErrorCode::E3004,
        ErrorCode::E3005,
        ErrorCode::E3006,
        ErrorCode::E3007,
        ErrorCode::E3008,
        ErrorCode::E9001,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::E0001 => "E0001",
            ErrorCode::E0002 => "E0002",
            ErrorCode::E0003 => "E0003",
            ErrorCode::E0004 => "E0004",
            ErrorCode::E0005 => "E0005",
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E1004 => "E1004",
            ErrorCode::E1005 => "E1005",
            ErrorCode::E1006 => "E1006",
            ErrorCode::E1007 => "E1007",
            ErrorCode::E1008 => "E1008",
            ErrorCode::E1009 => "E1009",
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E3001 => "E3001",
            ErrorCode::E3002 => "E3002",
            ErrorCode::E3003 => "E3003",
            ErrorCode::E3004 => "E3004",
            ErrorCode::E3005 => "E3005",
            ErrorCode::E3006 => "E3006",
            ErrorCode::E3007 => "E3007",
            ErrorCode::E3008 => "E3008",
            ErrorCode::E9001 => "E9001",
        }
    }

    pub const fn is_lexer_error(self) -> bool {
        matches!(self.as_str().as_bytes()[1], b'0')
    }

    pub const fn is_parser_error(self) -> bool {
        matches!(self.as_str().as_bytes()[1], b'1')
    }

    pub const fn is_resolve_error(self) -> bool {
        matches!(self.as_str().as_bytes()[1], b'2')
    }

    pub const fn is_type_error(self) -> bool {
        matches!(self.as_str().as_bytes()[1], b'3')
    }

    pub const fn is_internal(self) -> bool {
        matches!(self.as_str().as_bytes()[1], b'9')
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse an error code string like `"E2001"`. Case-insensitive.
impl std::str::FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_belongs_to_one_phase() {
        for code in ErrorCode::ALL {
            let phases = [
                code.is_lexer_error(),
                code.is_parser_error(),
                code.is_resolve_error(),
                code.is_type_error(),
                code.is_internal(),
            ];
            assert_eq!(phases.iter().filter(|p| **p).count(), 1, "{code}");
        }
    }

    #[test]
    fn parse_round_trips() {
        assert_eq!("e2003".parse::<ErrorCode>(), Ok(ErrorCode::E2003));
        assert_eq!("E7777".parse::<ErrorCode>(), Err(()));
    }
}
