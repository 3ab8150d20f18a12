//! Macro for implementing Display and FromStr for status enums
//!
//! # Example
//!
//! ```rust
//! use erpsync_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum LookupState {
//!     Pending,
//!     Matched,
//!     Exhausted,
//! }
//!
//! impl_domain_status_conversions!(LookupState {
//!     Pending => "pending",
//!     Matched => "matched",
//!     Exhausted => "exhausted",
//! });
//!
//! assert_eq!(LookupState::Matched.to_string(), "matched");
//! ```

/// Implements Display and FromStr traits for status enums
///
/// - Display writes the mapped lowercase string
/// - FromStr parses case-insensitively and names the enum in its error
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum ProbeState {
        Pending,
        Matched,
        Exhausted,
    }

    impl_domain_status_conversions!(ProbeState {
        Pending => "pending",
        Matched => "matched",
        Exhausted => "exhausted",
    });

    #[test]
    fn display_uses_mapped_string() {
        assert_eq!(ProbeState::Pending.to_string(), "pending");
        assert_eq!(ProbeState::Exhausted.to_string(), "exhausted");
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(ProbeState::from_str("MATCHED").unwrap(), ProbeState::Matched);
        assert_eq!(ProbeState::from_str("Exhausted").unwrap(), ProbeState::Exhausted);
    }

    #[test]
    fn rejects_unknown_values() {
        let result = ProbeState::from_str("halted");
        assert!(result.unwrap_err().contains("Invalid ProbeState: halted"));
    }
}
