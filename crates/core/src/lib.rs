//! DSICOLA domain rules.
//!
//! Everything here is pure: no I/O, no clock. Callers pass the current date
//! and the relevant records in, and get a decision or a computed value out.

/// Declares a closed set of values stored as upper-case text in the database
/// and on the wire, with `as_str`, `Display` and `FromStr`.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::RuleError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    other => Err($crate::RuleError::invalid(
                        stringify!($name),
                        format!("unknown value '{other}'"),
                    )),
                }
            }
        }
    };
}

pub mod academic;
pub mod access;
pub mod attendance;
pub mod documents;
pub mod enrollment;
pub mod error;
pub mod finance;
pub mod grading;
pub mod library;
pub mod payroll;
pub mod plano;

pub use error::RuleError;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
