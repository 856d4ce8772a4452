use rust_decimal::Decimal;

use super::cells::round_price;

/// Price movements at or below this are rounding noise, not a change.
pub const PRICE_CHANGE_TOLERANCE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// Result of applying a row's pricing policy to a live price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceOutcome {
    pub new_price: Decimal,
    pub floor_applied: bool,
}

/// `round(current × (1 + percent / 100), 2)`, raised to `floor` when it would
/// fall below it. `None` when the product overflows.
pub fn compute_new_price(current: Decimal, percent: Decimal, floor: Option<Decimal>) -> Option<PriceOutcome> {
    let factor = Decimal::ONE.checked_add(percent.checked_div(Decimal::ONE_HUNDRED)?)?;
    let new_price = round_price(current.checked_mul(factor)?);

    Some(match floor {
        Some(floor) if new_price < floor => PriceOutcome {
            new_price: floor,
            floor_applied: true,
        },
        _ => PriceOutcome {
            new_price,
            floor_applied: false,
        },
    })
}

/// True when the live price moved by more than the tolerance. A difference
/// too large to represent counts as moved.
pub fn price_moved(observed: Decimal, persisted: Decimal) -> bool {
    observed
        .checked_sub(persisted)
        .map_or(true, |diff| diff.abs() > PRICE_CHANGE_TOLERANCE)
}
