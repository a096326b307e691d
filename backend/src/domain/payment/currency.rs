//! Currency input shaping for invoice creation.

/// Fiat currency a stablecoin ticker is pegged to.
///
/// Network-suffixed tickers (`usdttrc20`, `usdcmatic`) share their base
/// coin's peg.
pub fn stablecoin_peg(ticker: &str) -> Option<&'static str> {
    const USD: &[&str] = &["usdt", "usdc", "busd", "tusd", "dai"];
    const EUR: &[&str] = &["eurt", "eurc"];

    let ticker = ticker.trim().to_ascii_lowercase();
    if USD.iter().any(|base| ticker.starts_with(base)) {
        Some("usd")
    } else if EUR.iter().any(|base| ticker.starts_with(base)) {
        Some("eur")
    } else {
        None
    }
}

/// Normalizes the price currency sent to the gateway.
///
/// Pricing an invoice in a stablecoin while also paying in a stablecoin
/// with the same peg is ambiguous to the gateway, so the price is coerced
/// to the fiat peg. All other inputs are only lowercased.
pub fn normalize_price_currency(price_currency: &str, pay_currency: &str) -> String {
    match (stablecoin_peg(price_currency), stablecoin_peg(pay_currency)) {
        (Some(price_peg), Some(pay_peg)) if price_peg == pay_peg => price_peg.to_string(),
        _ => price_currency.trim().to_ascii_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stablecoin_priced_and_paid_becomes_fiat() {
        assert_eq!(normalize_price_currency("usdt", "usdttrc20"), "usd");
        assert_eq!(normalize_price_currency("USDTTRC20", "usdterc20"), "usd");
        assert_eq!(normalize_price_currency("usdc", "usdtbsc"), "usd");
        assert_eq!(normalize_price_currency("eurt", "eurc"), "eur");
    }

    #[test]
    fn mismatched_pegs_are_left_alone() {
        assert_eq!(normalize_price_currency("eurt", "usdttrc20"), "eurt");
    }

    #[test]
    fn fiat_price_is_only_lowercased() {
        assert_eq!(normalize_price_currency("USD", "usdttrc20"), "usd");
        assert_eq!(normalize_price_currency("kzt", "btc"), "kzt");
    }

    #[test]
    fn stablecoin_price_with_volatile_pay_is_unchanged() {
        assert_eq!(normalize_price_currency("usdt", "btc"), "usdt");
    }

    #[test]
    fn peg_lookup() {
        assert_eq!(stablecoin_peg("usdttrc20"), Some("usd"));
        assert_eq!(stablecoin_peg("btc"), None);
    }
}
