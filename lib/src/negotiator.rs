//! Payment option selection.

use crate::error::{Result, Stx402Error};
use crate::x402::{Amount, PaymentOption, PaymentRequired};

/// Choose which of the server's options to pay.
///
/// The policy is "first listed wins". This is the one place to change if a
/// smarter choice (cheapest, preferred network) is ever wanted.
pub fn select_payment_option(options: &[PaymentOption]) -> Option<&PaymentOption> {
    options.first()
}

/// Applies [`select_payment_option`] and checks the chosen option against
/// the caller's limits.
///
/// # Example
///
/// ```
/// use stx402_lib::negotiator::PaymentNegotiator;
/// use stx402_lib::x402::PaymentRequired;
///
/// let challenge: PaymentRequired = serde_json::from_str(
///     r#"{"resource": {"url": "/api/ai/chat"}, "accepts": [{"amount": "100000"}]}"#,
/// ).unwrap();
///
/// let negotiator = PaymentNegotiator::new().with_max_amount(Some(50_000));
/// assert!(negotiator.select(&challenge).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct PaymentNegotiator {
    max_amount: Option<u128>,
}

impl PaymentNegotiator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum amount willing to pay (in micro-STX).
    #[must_use]
    pub fn with_max_amount(mut self, amount: Option<u128>) -> Self {
        self.max_amount = amount;
        self
    }

    /// Select the option to pay and its amount.
    pub fn select<'a>(&self, requirements: &'a PaymentRequired) -> Result<(&'a PaymentOption, Amount)> {
        let option = select_payment_option(&requirements.accepts).ok_or_else(|| {
            Stx402Error::missing_requirements("the server listed no payment options")
        })?;

        let amount = option.amount()?;
        self.validate_constraints(amount)?;
        Ok((option, amount))
    }

    fn validate_constraints(&self, amount: Amount) -> Result<()> {
        if let Some(max) = self.max_amount {
            if amount.as_atomic_units() > max {
                return Err(Stx402Error::AmountExceedsMax {
                    required: amount.as_atomic_units(),
                    max,
                });
            }
        }
        Ok(())
    }
}
