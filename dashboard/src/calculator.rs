//! What-if fuel arithmetic for the calculator view. Never touches the
//! ledger; non-positive inputs yield 0.0 rather than an error.

/// Liters a given amount of money buys.
pub fn liters_for_amount(price_per_liter: f64, amount: f64) -> f64 {
    if price_per_liter > 0.0 && amount > 0.0 {
        amount / price_per_liter
    } else {
        0.0
    }
}

/// Cost of filling a given number of liters.
pub fn cost_for_liters(price_per_liter: f64, liters: f64) -> f64 {
    if price_per_liter > 0.0 && liters > 0.0 {
        price_per_liter * liters
    } else {
        0.0
    }
}

/// Fuel needed to cover a distance at a given mileage.
pub fn fuel_for_distance(mileage_kmpl: f64, distance_km: f64) -> f64 {
    if mileage_kmpl > 0.0 && distance_km > 0.0 {
        distance_km / mileage_kmpl
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn liters_for_amount_divides_by_price() {
        assert_eq!(liters_for_amount(100.0, 500.0), 5.0);
    }

    #[test]
    fn cost_for_liters_multiplies_by_price() {
        assert_eq!(cost_for_liters(105.0, 2.0), 210.0);
    }

    #[test]
    fn fuel_for_distance_divides_by_mileage() {
        assert_eq!(fuel_for_distance(40.0, 100.0), 2.5);
    }

    #[test]
    fn non_positive_inputs_yield_zero() {
        assert_eq!(liters_for_amount(0.0, 500.0), 0.0);
        assert_eq!(liters_for_amount(100.0, -1.0), 0.0);
        assert_eq!(cost_for_liters(-105.0, 2.0), 0.0);
        assert_eq!(fuel_for_distance(40.0, 0.0), 0.0);
        assert_eq!(fuel_for_distance(f64::NAN, 100.0), 0.0);
    }
}
