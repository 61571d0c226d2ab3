use crate::frame::Cell;

/// Checks whether a cell holds a valid ISBN-10 or ISBN-13. Separators
/// (hyphens and spaces) are stripped before checking length and checksum.
/// Non-string cells, including nulls, are invalid; this never errors.
pub fn validate_isbn(cell: &Cell) -> bool {
    let Cell::Str(raw) = cell else {
        return false;
    };
    let cleaned: String = raw.chars().filter(|c| *c != '-' && *c != ' ').collect();
    match cleaned.len() {
        10 => valid_isbn10(&cleaned),
        13 => valid_isbn13(&cleaned),
        _ => false,
    }
}

fn valid_isbn10(isbn: &str) -> bool {
    let mut sum = 0u32;
    for (position, ch) in isbn.chars().enumerate() {
        let value = match ch {
            '0'..='9' => ch as u32 - '0' as u32,
            // The check digit may be X, standing for ten
            'X' | 'x' if position == 9 => 10,
            _ => return false,
        };
        sum += (10 - position as u32) * value;
    }
    sum % 11 == 0
}

fn valid_isbn13(isbn: &str) -> bool {
    let mut sum = 0u32;
    for (position, ch) in isbn.chars().enumerate() {
        let Some(digit) = ch.to_digit(10) else {
            return false;
        };
        sum += digit * if position % 2 == 0 { 1 } else { 3 };
    }
    sum % 10 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn isbn(raw: &str) -> Cell {
        Cell::Str(raw.to_string())
    }

    #[test]
    fn test_valid_isbn13_with_hyphens() {
        assert!(validate_isbn(&isbn("978-3-16-148410-0")));
    }

    #[test]
    fn test_valid_isbn13_plain() {
        assert!(validate_isbn(&isbn("9780306406157")));
    }

    #[test]
    fn test_valid_isbn10() {
        assert!(validate_isbn(&isbn("0-306-40615-2")));
        assert!(validate_isbn(&isbn("043942089X")));
    }

    #[test]
    fn test_bad_checksum() {
        assert!(!validate_isbn(&isbn("1234567890")));
        assert!(!validate_isbn(&isbn("9783161484101")));
    }

    #[test]
    fn test_wrong_length_or_characters() {
        assert!(!validate_isbn(&isbn("12345")));
        assert!(!validate_isbn(&isbn("030640615X2")));
        assert!(!validate_isbn(&isbn("03064X6152")));
        assert!(!validate_isbn(&isbn("")));
    }

    #[test]
    fn test_non_string_cells_are_invalid() {
        assert!(!validate_isbn(&Cell::Null));
        assert!(!validate_isbn(&Cell::Int(9783161484100)));
        assert!(!validate_isbn(&Cell::Float(9783161484100.0)));
        assert!(!validate_isbn(&Cell::Bool(true)));
    }
}
