use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// General ad valorem duty when no trade agreement applies
pub const GENERAL_DUTY_RATE: Decimal = dec!(0.06);

/// Surcharge on the ad valorem duty for used goods (+50% of the duty)
pub const USED_GOODS_SURCHARGE: Decimal = dec!(0.5);

/// Theoretical insurance as a fraction of FOB + freight, used when none is declared
pub const THEORETICAL_INSURANCE_RATE: Decimal = dec!(0.02);

/// IVA
pub const VAT_RATE: Decimal = dec!(0.19);

/// FOB value (USD) above which a customs agent is mandatory
pub const CUSTOMS_AGENT_FOB_THRESHOLD: Decimal = dec!(1000);

/// Format a rate as a percentage: whole percentages without decimals, otherwise one decimal place.
pub fn format_percentage(rate: Decimal) -> String {
    let percentage = rate * dec!(100);
    if percentage.fract().is_zero() {
        format!("{}%", percentage.trunc().normalize())
    } else {
        let rounded = percentage.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
        format!("{:.1}%", rounded)
    }
}

/// USD amount with two decimals, e.g. "1543.99"
pub fn format_usd(amount: Decimal) -> String {
    format!(
        "{:.2}",
        amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

/// CLP amount rounded to whole pesos with '.' thousands separators, e.g. "1.450.123"
pub fn format_clp(amount: Decimal) -> String {
    let pesos = amount
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let digits = pesos.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    if pesos.is_sign_negative() && !pesos.is_zero() {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_percentages_have_no_decimals() {
        assert_eq!(format_percentage(dec!(0.06)), "6%");
        assert_eq!(format_percentage(dec!(0.09)), "9%");
        assert_eq!(format_percentage(dec!(0.03)), "3%");
        assert_eq!(format_percentage(Decimal::ZERO), "0%");
    }

    #[test]
    fn fractional_percentages_have_one_decimal() {
        assert_eq!(format_percentage(dec!(0.597)), "59.7%");
        assert_eq!(format_percentage(dec!(0.0225)), "2.3%");
        assert_eq!(format_percentage(dec!(0.0304)), "3.0%");
    }

    #[test]
    fn usd_formatting() {
        assert_eq!(format_usd(dec!(1543.9936)), "1543.99");
        assert_eq!(format_usd(dec!(214.980155)), "214.98");
        assert_eq!(format_usd(dec!(24)), "24.00");
    }

    #[test]
    fn clp_formatting() {
        assert_eq!(format_clp(dec!(1450123.4)), "1.450.123");
        assert_eq!(format_clp(dec!(999.5)), "1.000");
        assert_eq!(format_clp(dec!(12)), "12");
        assert_eq!(format_clp(Decimal::ZERO), "0");
    }
}
