use std::{fmt, str::FromStr};

use paste::paste;

use crate::errors::{Error, Result};

macro_rules! dims {
    ($($name:ident),*) => {
        paste! {
            /// Label identifying a semantic axis of a variable.
            ///
            /// Dims are compared by identity only. The derived ordering exists so dims can be used
            /// as keys of ordered collections; it carries no meaning for the data.
            ///
            #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub enum Dim {
                $($name),*
            }

            impl Dim {
                /// All dims, in declaration order
                pub const ALL: &'static [Dim] = &[$(Dim::$name),*];

                pub fn name(&self) -> &'static str {
                    match self {
                        $(Self::$name => stringify!($name)),*
                    }
                }
            }

            impl FromStr for Dim {
                type Err = Error;

                fn from_str(s: &str) -> Result<Self> {
                    match s {
                        $(stringify!($name) | stringify!([<$name:lower>]) => Ok(Self::$name),)*
                        _ => Err(Error::DimensionMismatch(format!("unknown dimension {s:?}"))),
                    }
                }
            }
        }
    };
}

dims!(X, Y, Z, Time, Tof, Energy, Wavelength, Q, Position, Spectrum, Detector, Row, Event);

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
