use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::ProductId;
use super::validation::{ValidationError, require_non_empty};

/// Unit a product's serving size is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServingType {
    Grams,
    Milliliters,
    Units,
}

impl ServingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grams => "grams",
            Self::Milliliters => "milliliters",
            Self::Units => "units",
        }
    }
}

impl fmt::Display for ServingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServingType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grams" => Ok(Self::Grams),
            "milliliters" => Ok(Self::Milliliters),
            "units" => Ok(Self::Units),
            other => Err(ValidationError::new(
                "serving.type",
                format!("unknown serving type '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Serving {
    #[serde(rename = "type")]
    pub kind: ServingType,
    pub size: Decimal,
    pub calories: i64,
}

/// Client-supplied fields of a product (create and full-replace update).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCore {
    pub name: String,
    pub serving: Serving,
}

impl ProductCore {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        if self.serving.size <= Decimal::ZERO {
            return Err(ValidationError::new("serving.size", "must be greater than 0"));
        }
        if self.serving.calories < 0 {
            return Err(ValidationError::new("serving.calories", "must not be negative"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub serving: Serving,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oats() -> ProductCore {
        ProductCore {
            name: "Rolled oats".into(),
            serving: Serving {
                kind: ServingType::Grams,
                size: Decimal::new(40, 0),
                calories: 150,
            },
        }
    }

    #[test]
    fn valid_product_passes() {
        assert!(oats().validate().is_ok());
    }

    #[test]
    fn negative_calories_name_the_calories_field() {
        let mut p = oats();
        p.serving.calories = -1;
        assert_eq!(p.validate().unwrap_err().attribute, "serving.calories");
    }

    #[test]
    fn zero_calories_are_allowed() {
        let mut p = oats();
        p.serving.calories = 0;
        assert!(p.validate().is_ok());
    }

    #[test]
    fn zero_size_is_rejected() {
        let mut p = oats();
        p.serving.size = Decimal::ZERO;
        assert_eq!(p.validate().unwrap_err().attribute, "serving.size");
    }

    #[test]
    fn serving_type_round_trips_through_str() {
        for kind in [ServingType::Grams, ServingType::Milliliters, ServingType::Units] {
            assert_eq!(kind.as_str().parse::<ServingType>().unwrap(), kind);
        }
        assert!("cups".parse::<ServingType>().is_err());
    }
}
