use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// The category of a logged drink.
///
/// The declaration order is significant: it is the order used to break ties
/// when ranking kinds by consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrinkKind {
    /// Beer, lager, ale.
    Beer,
    /// Wine of any colour.
    Wine,
    /// Mixed drinks.
    Cocktail,
    /// Distilled spirits served neat or with a mixer.
    Spirit,
    /// Cider and perry.
    Cider,
    /// Sweetened liqueurs.
    Liqueur,
    /// Bitter herbal liqueurs.
    Amaro,
    /// Port, sherry, vermouth.
    FortifiedWine,
    /// Water. Carries no alcohol units.
    Water,
    /// Non-alcoholic mixed drinks. Carries no alcohol units.
    Mocktail,
}

impl DrinkKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Beer,
        Self::Wine,
        Self::Cocktail,
        Self::Spirit,
        Self::Cider,
        Self::Liqueur,
        Self::Amaro,
        Self::FortifiedWine,
        Self::Water,
        Self::Mocktail,
    ];

    /// Whether this kind contributes to alcohol aggregates.
    ///
    /// Water and mocktails are logged like any other drink but are excluded
    /// from every weekly, daily and monthly sum.
    #[must_use]
    pub const fn is_alcoholic(self) -> bool {
        !matches!(self, Self::Water | Self::Mocktail)
    }

    /// The number of units suggested when the user doesn't provide one.
    #[must_use]
    pub const fn default_units(self) -> f64 {
        match self {
            Self::Cocktail => 1.5,
            Self::Water | Self::Mocktail => 0.0,
            _ => 1.0,
        }
    }

    /// The machine-readable name, as used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Beer => "beer",
            Self::Wine => "wine",
            Self::Cocktail => "cocktail",
            Self::Spirit => "spirit",
            Self::Cider => "cider",
            Self::Liqueur => "liqueur",
            Self::Amaro => "amaro",
            Self::FortifiedWine => "fortified_wine",
            Self::Water => "water",
            Self::Mocktail => "mocktail",
        }
    }

    /// A human-friendly label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Beer => "Beer",
            Self::Wine => "Wine",
            Self::Cocktail => "Cocktail",
            Self::Spirit => "Spirit",
            Self::Cider => "Cider",
            Self::Liqueur => "Liqueur",
            Self::Amaro => "Amaro",
            Self::FortifiedWine => "Fortified wine",
            Self::Water => "Water",
            Self::Mocktail => "Mocktail",
        }
    }
}

impl fmt::Display for DrinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrinkKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalised)
            .ok_or_else(|| ParseKindError(s.to_string()))
    }
}

/// Error returned when a string doesn't name a known drink kind.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown drink kind '{0}'")]
pub struct ParseKindError(String);
