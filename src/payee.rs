use std::sync::OnceLock;

use regex::Regex;

/// Payment-processor prefixes that vary per charge and hide the merchant.
const PROCESSOR_PREFIXES: &[&str] = &[
    "APLPAY ", "APPLEPAY ", "GOOGLEPAY ", "PAYPAL *", "PAYPAL ", "SP * ", "SP *", "SQ * ", "SQ *",
    "TST* ", "TST*", "POS ", "ACH ",
];

fn reference_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Trailing reference/store numbers and masked card fragments: "12345",
    // "X9921", "#0042". Short numbers embedded in a name ("7-ELEVEN") survive.
    RE.get_or_init(|| Regex::new(r"^[X#]*\d{3,}$").unwrap())
}

/// Normalize a raw bank description into a stable payee key.
///
/// "APLPAY NETFLIX.COM 866-579-7172" and "NETFLIX.COM 12345" both map to
/// "NETFLIX.COM", so repeated charges group under one key.
pub fn payee_key(description: &str) -> String {
    let mut desc = description.to_uppercase();

    for prefix in PROCESSOR_PREFIXES {
        if let Some(rest) = desc.strip_prefix(prefix) {
            desc = rest.to_string();
            break;
        }
    }

    let cleaned = desc.replace(['*', '#'], " ");

    let key: Vec<&str> = cleaned
        .split_whitespace()
        .filter(|word| !reference_token().is_match(word))
        .take(3)
        .collect();

    key.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_processor_prefix() {
        assert_eq!(payee_key("APLPAY NETFLIX.COM 866-579"), "NETFLIX.COM 866-579");
        assert_eq!(payee_key("SQ * BLUE BOTTLE COFFEE"), "BLUE BOTTLE COFFEE");
        assert_eq!(payee_key("PAYPAL *SPOTIFY"), "SPOTIFY");
    }

    #[test]
    fn test_drops_reference_numbers() {
        assert_eq!(payee_key("NETFLIX.COM 12345"), "NETFLIX.COM");
        assert_eq!(payee_key("SHELL OIL #5742 PORTLAND"), "SHELL OIL PORTLAND");
        assert_eq!(payee_key("AMAZON MKTP X992104"), "AMAZON MKTP");
    }

    #[test]
    fn test_same_merchant_same_key() {
        assert_eq!(payee_key("SPOTIFY USA 8882211161"), payee_key("Spotify USA"));
        assert_eq!(
            payee_key("APLPAY NETFLIX.COM"),
            payee_key("NETFLIX.COM 40291")
        );
    }

    #[test]
    fn test_keeps_short_numbers_in_names() {
        assert_eq!(payee_key("7-ELEVEN 23"), "7-ELEVEN 23");
    }

    #[test]
    fn test_caps_at_three_words() {
        assert_eq!(
            payee_key("CITY OF PORTLAND WATER BUREAU UTILITY"),
            "CITY OF PORTLAND"
        );
    }
}
