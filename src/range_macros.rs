// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

// Macros for defining unit-carrying integer newtypes.

macro_rules! range_u64 {
    ($(#[$comment:meta])? $T:ident, $display_name:expr) => {
        range!($(#[$comment])? $T, $display_name, u64, serialize_u64);
    };
}

macro_rules! range_u128 {
    ($(#[$comment:meta])? $T:ident, $display_name:expr) => {
        range!($(#[$comment])? $T, $display_name, u128, serialize_u128);
    };
}

macro_rules! range {
    ($(#[$comment:meta])? $T:ident, $display_name:expr, $inner:ty, $serialize:ident) => {
        $(
            #[$comment]
        )?
        #[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
        pub struct $T(pub $inner);

        impl $T {
            /// Add two items of this type, None on overflow.
            pub fn checked_add(&self, other: $T) -> Option<$T> {
                self.0.checked_add(other.0).map($T)
            }
        }

        impl std::ops::Deref for $T {
            type Target = $inner;
            fn deref(&self) -> &$inner {
                &self.0
            }
        }

        impl From<$inner> for $T {
            fn from(t: $inner) -> $T {
                $T(t)
            }
        }

        impl From<$T> for $inner {
            fn from(t: $T) -> $inner {
                t.0
            }
        }

        impl std::ops::Add for $T {
            type Output = $T;
            fn add(self, rhs: $T) -> $T {
                $T(self.0 + rhs.0)
            }
        }

        impl std::ops::Sub for $T {
            type Output = $T;
            fn sub(self, rhs: $T) -> $T {
                $T(self.0 - rhs.0)
            }
        }

        impl std::ops::Mul<$inner> for $T {
            type Output = $T;
            fn mul(self, rhs: $inner) -> $T {
                $T(self.0 * rhs)
            }
        }

        impl std::ops::Div<$T> for $T {
            type Output = $inner;
            fn div(self, rhs: $T) -> $inner {
                self.0 / rhs.0
            }
        }

        impl std::iter::Sum for $T {
            fn sum<I: Iterator<Item = $T>>(iter: I) -> $T {
                iter.fold($T::default(), std::ops::Add::add)
            }
        }

        impl std::fmt::Debug for $T {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($T), self.0)
            }
        }

        impl std::fmt::Display for $T {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{} {}", self.0, $display_name)
            }
        }

        impl serde::Serialize for $T {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.$serialize(self.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $T {
            fn deserialize<D>(deserializer: D) -> Result<$T, D::Error>
            where
                D: serde::de::Deserializer<'de>,
            {
                Ok($T(serde::Deserialize::deserialize(deserializer)?))
            }
        }
    };
}
