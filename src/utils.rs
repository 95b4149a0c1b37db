// Utility modules

use rand::Rng;

/// Generates a shareable 4-digit room pin in 1000..=9999.
pub fn generate_room_pin() -> String {
    rand::rng().random_range(1000..10_000).to_string()
}

/// Pins are exactly four decimal digits; anything else is rejected before
/// touching storage.
pub fn validate_room_pin(pin: &str) -> bool {
    pin.len() == 4 && pin.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_pins_are_valid() {
        for _ in 0..100 {
            let pin = generate_room_pin();
            assert!(validate_room_pin(&pin), "bad pin: {pin}");
        }
    }

    #[test]
    fn validate_rejects_malformed_pins() {
        assert!(validate_room_pin("1234"));
        assert!(validate_room_pin("0042"));
        assert!(!validate_room_pin(""));
        assert!(!validate_room_pin("123"));
        assert!(!validate_room_pin("12345"));
        assert!(!validate_room_pin("12a4"));
        assert!(!validate_room_pin("12 4"));
        assert!(!validate_room_pin("-123"));
    }
}
