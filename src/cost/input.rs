//! User input and boundary validation.
//!
//! Nothing reaches the cost model without passing
//! [`UserInput::validate`].

use serde::{Deserialize, Serialize};

use crate::error::InputError;

use super::benchmarks::{AutomationLevel, Category, Channel, VolumeBasis};

/// Default fully loaded hourly labor rate.
pub const DEFAULT_HOURLY_RATE: f64 = 50.0;

/// Default overhead multiplier.
pub const DEFAULT_OVERHEAD_MULTIPLIER: f64 = 1.5;

/// Parameters submitted for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInput {
    /// Selected category
    pub category: Category,
    /// Units per month (monthly categories)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_volume: Option<f64>,
    /// Customer count (per-entity categories)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customers: Option<f64>,
    /// Average customer size, e.g. members per plan (per-entity categories)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_customer_size: Option<f64>,
    /// Staff currently doing the work (reported against FTE equivalent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_count: Option<f64>,
    /// Fully loaded hourly labor rate
    pub hourly_rate: f64,
    /// Overhead multiplier, at least 1
    pub overhead_multiplier: f64,
    /// Automation maturity
    #[serde(default)]
    pub automation: AutomationLevel,
    /// Intake channel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
}

impl UserInput {
    /// Input for `category` with default rates and no volumes.
    #[must_use]
    pub const fn new(category: Category) -> Self {
        Self {
            category,
            monthly_volume: None,
            customers: None,
            avg_customer_size: None,
            staff_count: None,
            hourly_rate: DEFAULT_HOURLY_RATE,
            overhead_multiplier: DEFAULT_OVERHEAD_MULTIPLIER,
            automation: AutomationLevel::Manual,
            channel: None,
        }
    }

    /// Sets the monthly volume.
    #[must_use]
    pub const fn with_monthly_volume(mut self, volume: f64) -> Self {
        self.monthly_volume = Some(volume);
        self
    }

    /// Sets customer count and average size.
    #[must_use]
    pub const fn with_customers(mut self, customers: f64, avg_size: f64) -> Self {
        self.customers = Some(customers);
        self.avg_customer_size = Some(avg_size);
        self
    }

    /// Sets the hourly rate.
    #[must_use]
    pub const fn with_hourly_rate(mut self, rate: f64) -> Self {
        self.hourly_rate = rate;
        self
    }

    /// Sets the overhead multiplier.
    #[must_use]
    pub const fn with_overhead(mut self, multiplier: f64) -> Self {
        self.overhead_multiplier = multiplier;
        self
    }

    /// Sets the automation level.
    #[must_use]
    pub const fn with_automation(mut self, level: AutomationLevel) -> Self {
        self.automation = level;
        self
    }

    /// Sets the intake channel.
    #[must_use]
    pub const fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Sets the staff count.
    #[must_use]
    pub const fn with_staff(mut self, staff: f64) -> Self {
        self.staff_count = Some(staff);
        self
    }

    /// Checks every invariant the cost model relies on.
    ///
    /// `basis` is the category's volume derivation from the benchmark
    /// table.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule: a negative or non-finite number,
    /// an overhead multiplier below 1, or a missing parameter the
    /// category's volume basis needs.
    pub fn validate(&self, basis: VolumeBasis) -> Result<(), InputError> {
        let numbers = [
            ("monthly_volume", self.monthly_volume),
            ("customers", self.customers),
            ("avg_customer_size", self.avg_customer_size),
            ("staff_count", self.staff_count),
            ("hourly_rate", Some(self.hourly_rate)),
            ("overhead_multiplier", Some(self.overhead_multiplier)),
        ];
        for (field, value) in numbers {
            if let Some(value) = value
                && (!value.is_finite() || value < 0.0)
            {
                return Err(InputError::InvalidNumber { field, value });
            }
        }

        if self.overhead_multiplier < 1.0 {
            return Err(InputError::OverheadBelowOne(self.overhead_multiplier));
        }

        let category = self.category.as_str();
        match basis {
            VolumeBasis::Monthly if self.monthly_volume.is_none() => {
                Err(InputError::MissingParameter {
                    category,
                    field: "monthly_volume",
                })
            }
            VolumeBasis::PerEntity if self.customers.is_none() => {
                Err(InputError::MissingParameter {
                    category,
                    field: "customers",
                })
            }
            VolumeBasis::PerEntity if self.avg_customer_size.is_none() => {
                Err(InputError::MissingParameter {
                    category,
                    field: "avg_customer_size",
                })
            }
            _ => Ok(()),
        }
    }
}

/// Share of cost an automation initiative removes, in `(0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct ReductionFraction(f64);

impl ReductionFraction {
    /// Validates `value`.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidReduction`] unless `0 < value <= 1`.
    pub fn new(value: f64) -> Result<Self, InputError> {
        if value.is_finite() && value > 0.0 && value <= 1.0 {
            Ok(Self(value))
        } else {
            Err(InputError::InvalidReduction(value))
        }
    }

    /// The fraction.
    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for ReductionFraction {
    type Error = InputError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_monthly_input() {
        let input = UserInput::new(Category::TicketProcessing).with_monthly_volume(5000.0);
        assert_eq!(input.validate(VolumeBasis::Monthly), Ok(()));
    }

    #[test]
    fn test_negative_and_nan_rejected() {
        let input = UserInput::new(Category::TicketProcessing).with_monthly_volume(-1.0);
        assert_eq!(
            input.validate(VolumeBasis::Monthly),
            Err(InputError::InvalidNumber {
                field: "monthly_volume",
                value: -1.0
            })
        );

        let input = UserInput::new(Category::TicketProcessing)
            .with_monthly_volume(10.0)
            .with_hourly_rate(f64::NAN);
        assert!(matches!(
            input.validate(VolumeBasis::Monthly),
            Err(InputError::InvalidNumber {
                field: "hourly_rate",
                ..
            })
        ));
    }

    #[test]
    fn test_overhead_below_one_rejected() {
        let input = UserInput::new(Category::InvoiceProcessing)
            .with_monthly_volume(10.0)
            .with_overhead(0.9);
        assert_eq!(
            input.validate(VolumeBasis::Monthly),
            Err(InputError::OverheadBelowOne(0.9))
        );
    }

    #[test]
    fn test_missing_category_parameters() {
        let input = UserInput::new(Category::InvoiceProcessing);
        assert!(matches!(
            input.validate(VolumeBasis::Monthly),
            Err(InputError::MissingParameter {
                field: "monthly_volume",
                ..
            })
        ));

        let mut input = UserInput::new(Category::ClaimsProcessing);
        input.customers = Some(3.0);
        assert!(matches!(
            input.validate(VolumeBasis::PerEntity),
            Err(InputError::MissingParameter {
                field: "avg_customer_size",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_customers_is_valid() {
        let input = UserInput::new(Category::ClaimsProcessing).with_customers(0.0, 0.0);
        assert_eq!(input.validate(VolumeBasis::PerEntity), Ok(()));
    }

    #[test]
    fn test_reduction_fraction_bounds() {
        assert!(ReductionFraction::new(1.0).is_ok());
        assert!(ReductionFraction::new(0.35).is_ok());
        for bad in [0.0, -0.1, 1.01, f64::NAN] {
            assert!(ReductionFraction::new(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_input_yaml_shape() {
        let yaml = "category: claims-processing\ncustomers: 4\navg_customer_size: 25000\nhourly_rate: 60\noverhead_multiplier: 2\nautomation: partial\n";
        let input: UserInput = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(input.category, Category::ClaimsProcessing);
        assert_eq!(input.automation, AutomationLevel::Partial);
        assert_eq!(input.channel, None);
    }
}
