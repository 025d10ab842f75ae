use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::QuoteError;
use crate::types::{Money, Rate, Years};
use crate::QuoteResult;

/// Rate step below which Newton-Raphson / bisection is considered converged
/// (0.0001%).
pub const IRR_TOLERANCE: Rate = dec!(0.000001);
pub const MAX_IRR_ITERATIONS: u32 = 100;
const NPV_EPSILON: Decimal = dec!(0.0000001);

/// Search bracket for IRR. Below -50% a storage project is a write-off and
/// above 500% the discount factors leave Decimal range for long lifetimes.
pub const IRR_LOWER_BOUND: Rate = dec!(-0.5);
pub const IRR_UPPER_BOUND: Rate = dec!(5);

fn overflow(context: &str) -> QuoteError {
    QuoteError::InvalidInput {
        field: "cash_flows".into(),
        reason: format!("Decimal overflow while discounting ({context})"),
    }
}

/// Net Present Value of a series of annual cash flows; `cash_flows[0]` is
/// undiscounted (year 0).
pub fn npv(rate: Rate, cash_flows: &[Money]) -> QuoteResult<Money> {
    if rate <= dec!(-1) {
        return Err(QuoteError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = match discount.checked_mul(one_plus_r) {
                Some(d) => d,
                // Remaining terms are smaller than Decimal resolution
                None => break,
            };
        }
        if discount.is_zero() {
            return Err(QuoteError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        let term = cf.checked_div(discount).ok_or_else(|| overflow("NPV"))?;
        result = result.checked_add(term).ok_or_else(|| overflow("NPV"))?;
    }

    Ok(result)
}

/// NPV and its derivative with respect to the rate, for Newton-Raphson.
fn npv_with_derivative(rate: Rate, cash_flows: &[Money]) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;
    let mut npv_val = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = match discount.checked_mul(one_plus_r) {
                Some(d) => d,
                None => break,
            };
        }
        if discount.is_zero() {
            return None;
        }
        npv_val = npv_val.checked_add(cf.checked_div(discount)?)?;
        if t > 0 {
            let t_dec = Decimal::from(t as i64);
            let denom = discount.checked_mul(one_plus_r)?;
            dnpv = dnpv.checked_sub(t_dec.checked_mul(*cf)?.checked_div(denom)?)?;
        }
    }

    Some((npv_val, dnpv))
}

/// Internal Rate of Return using Newton-Raphson
pub fn irr(cash_flows: &[Money], guess: Rate) -> QuoteResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(QuoteError::InvalidInput {
            field: "cash_flows".into(),
            reason: "IRR requires at least 2 cash flows".into(),
        });
    }

    let mut rate = guess;
    let mut last_npv = Decimal::ZERO;

    for i in 0..MAX_IRR_ITERATIONS {
        let Some((npv_val, dnpv)) = npv_with_derivative(rate, cash_flows) else {
            return Err(QuoteError::NoConvergence {
                function: "IRR (Newton-Raphson)".into(),
                iterations: i,
                last_npv,
            });
        };
        last_npv = npv_val;

        if npv_val.abs() < NPV_EPSILON {
            return Ok(rate);
        }

        if dnpv.is_zero() {
            return Err(QuoteError::NoConvergence {
                function: "IRR (Newton-Raphson)".into(),
                iterations: i,
                last_npv: npv_val,
            });
        }

        let step = npv_val / dnpv;
        rate -= step;

        // Guard against divergence
        if rate < IRR_LOWER_BOUND {
            rate = IRR_LOWER_BOUND;
        } else if rate > IRR_UPPER_BOUND {
            rate = IRR_UPPER_BOUND;
        }

        if step.abs() < IRR_TOLERANCE {
            return Ok(rate);
        }
    }

    Err(QuoteError::NoConvergence {
        function: "IRR (Newton-Raphson)".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_npv,
    })
}

/// Internal Rate of Return by bisection over `[lower, upper]`. Requires the
/// NPV to change sign across the bracket.
pub fn irr_bisection(cash_flows: &[Money], lower: Rate, upper: Rate) -> QuoteResult<Rate> {
    let mut lo = lower;
    let mut hi = upper;
    let mut f_lo = npv(lo, cash_flows)?;
    let f_hi = npv(hi, cash_flows)?;

    if f_lo.is_zero() {
        return Ok(lo);
    }
    if f_hi.is_zero() {
        return Ok(hi);
    }
    if f_lo.is_sign_positive() == f_hi.is_sign_positive() {
        return Err(QuoteError::NoConvergence {
            function: "IRR (bisection)".into(),
            iterations: 0,
            last_npv: f_lo,
        });
    }

    let mut mid = (lo + hi) / dec!(2);
    let mut f_mid = Decimal::ZERO;
    for _ in 0..MAX_IRR_ITERATIONS {
        mid = (lo + hi) / dec!(2);
        f_mid = npv(mid, cash_flows)?;

        if f_mid.abs() < NPV_EPSILON || (hi - lo) / dec!(2) < IRR_TOLERANCE {
            return Ok(mid);
        }

        if f_mid.is_sign_positive() == f_lo.is_sign_positive() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    tracing::trace!(%mid, "bisection exhausted its iteration budget");
    Err(QuoteError::NoConvergence {
        function: "IRR (bisection)".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_npv: f_mid,
    })
}

/// IRR with Newton-Raphson first and bisection over the standard bracket as
/// the fallback.
pub fn solve_irr(cash_flows: &[Money]) -> QuoteResult<Rate> {
    match irr(cash_flows, dec!(0.10)) {
        Ok(rate) if rate > IRR_LOWER_BOUND && rate < IRR_UPPER_BOUND => Ok(rate),
        Ok(_) | Err(_) => {
            tracing::debug!("Newton-Raphson IRR failed or hit a bound; falling back to bisection");
            irr_bisection(cash_flows, IRR_LOWER_BOUND, IRR_UPPER_BOUND)
        }
    }
}

/// Years until cumulative cash flow turns non-negative, interpolated within
/// the crossing year. `cash_flows[0]` is the (negative) initial outlay.
/// Returns `None` if the outlay is never recovered.
pub fn payback_period(cash_flows: &[Money]) -> Option<Years> {
    let (first, rest) = cash_flows.split_first()?;
    let mut cumulative = *first;
    if cumulative >= Decimal::ZERO {
        return Some(Decimal::ZERO);
    }

    for (i, cf) in rest.iter().enumerate() {
        let prev_cumulative = cumulative;
        cumulative += cf;
        if cumulative >= Decimal::ZERO {
            let fraction = if *cf > Decimal::ZERO {
                -prev_cumulative / cf
            } else {
                Decimal::ZERO
            };
            return Some(Decimal::from(i as i64) + fraction);
        }
    }

    None
}

/// Discount each cash flow back to year 0.
pub fn discount_series(rate: Rate, cash_flows: &[Money]) -> QuoteResult<Vec<Money>> {
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;
    let mut out = Vec::with_capacity(cash_flows.len());

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r).ok_or_else(|| overflow("series"))?;
        }
        if discount.is_zero() {
            return Err(QuoteError::DivisionByZero {
                context: format!("discount factor at period {t}"),
            });
        }
        out.push(cf.checked_div(discount).ok_or_else(|| overflow("series"))?);
    }

    Ok(out)
}
