//! This module defines the unit types used in the simulation and the arithmetic rules between them.
use serde::{Deserialize, Serialize};

/// Round a value to the given number of decimal places (half away from zero)
pub fn round_dp(value: f64, decimal_places: i32) -> f64 {
    let factor = 10f64.powi(decimal_places);
    (value * factor).round() / factor
}

/// Represents a dimensionless quantity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    PartialOrd,
    Serialize,
    Deserialize,
    derive_more::Add,
    derive_more::Sub,
)]
#[serde(transparent)]
pub struct Dimensionless(pub f64);

impl std::ops::Mul for Dimensionless {
    type Output = Dimensionless;

    fn mul(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 * rhs.0)
    }
}

impl std::ops::Div for Dimensionless {
    type Output = Dimensionless;

    fn div(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 / rhs.0)
    }
}

impl Dimensionless {
    /// Raise to a power
    pub fn powf(self, rhs: f64) -> Self {
        Dimensionless(self.0.powf(rhs))
    }

    /// Whether the underlying value is finite
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    /// Round to the given number of decimal places
    pub fn round_dp(self, decimal_places: i32) -> Self {
        Dimensionless(round_dp(self.0, decimal_places))
    }
}

impl From<f64> for Dimensionless {
    fn from(val: f64) -> Self {
        Self(val)
    }
}

impl From<Dimensionless> for f64 {
    fn from(val: Dimensionless) -> Self {
        val.0
    }
}

impl float_cmp::ApproxEq for Dimensionless {
    type Margin = float_cmp::F64Margin;

    fn approx_eq<M: Into<Self::Margin>>(self, other: Self, margin: M) -> bool {
        self.0.approx_eq(other.0, margin)
    }
}

macro_rules! unit_struct {
    ($name:ident) => {
        /// Represents a type of quantity.
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            PartialOrd,
            Serialize,
            Deserialize,
            derive_more::Add,
            derive_more::Sub,
        )]
        #[serde(transparent)]
        pub struct $name(pub f64);

        impl $name {
            /// Creates a new instance of the unit type from a f64 value.
            pub fn new(val: f64) -> Self {
                Self(val)
            }

            /// Returns the value of the unit type as a f64.
            pub fn value(self) -> f64 {
                self.0
            }

            /// Whether the underlying value is finite
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }

            /// Round to the given number of decimal places
            pub fn round_dp(self, decimal_places: i32) -> Self {
                Self(round_dp(self.0, decimal_places))
            }

            /// Round down to the nearest whole number
            pub fn floor(self) -> Self {
                Self(self.0.floor())
            }

            /// The larger of two values
            pub fn max(self, other: Self) -> Self {
                Self(self.0.max(other.0))
            }
        }

        impl std::ops::Mul<Dimensionless> for $name {
            type Output = $name;
            fn mul(self, rhs: Dimensionless) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Mul<$name> for Dimensionless {
            type Output = $name;
            fn mul(self, rhs: $name) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Div<Dimensionless> for $name {
            type Output = $name;
            fn div(self, rhs: Dimensionless) -> $name {
                $name(self.0 / rhs.0)
            }
        }

        impl std::ops::Div for $name {
            type Output = Dimensionless;
            fn div(self, rhs: $name) -> Dimensionless {
                Dimensionless(self.0 / rhs.0)
            }
        }

        impl std::ops::AddAssign for $name {
            fn add_assign(&mut self, rhs: $name) {
                self.0 += rhs.0;
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl float_cmp::ApproxEq for $name {
            type Margin = float_cmp::F64Margin;

            fn approx_eq<M: Into<Self::Margin>>(self, other: Self, margin: M) -> bool {
                self.0.approx_eq(other.0, margin)
            }
        }
    };
}

macro_rules! impl_mul {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Mul<$Rhs> for $Lhs {
            type Output = $Out;
            fn mul(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 * rhs.0)
            }
        }
        impl std::ops::Mul<$Lhs> for $Rhs {
            type Output = $Out;
            fn mul(self, lhs: $Lhs) -> $Out {
                <$Out>::new(self.0 * lhs.0)
            }
        }
    };
}

macro_rules! impl_div {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Div<$Rhs> for $Lhs {
            type Output = $Out;
            fn div(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 / rhs.0)
            }
        }
    };
}

// Base quantities
unit_struct!(Money);
unit_struct!(Tokens);
unit_struct!(Days);

// Derived quantities
unit_struct!(MoneyPerToken);
unit_struct!(MoneyPerNight);
unit_struct!(MoneyPerDay);

// Division rules
impl_div!(Money, MoneyPerDay, Days);
impl_div!(Money, Tokens, MoneyPerToken);

// Multiplication rules
impl_mul!(Tokens, MoneyPerToken, Money);
impl_mul!(MoneyPerNight, Days, Money);
impl_mul!(MoneyPerDay, Days, Money);
