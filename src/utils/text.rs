//! Small text helpers shared by exports, searches and numeric form input.

use crate::errors::{CajaError, Result};

/// Replaces accented Latin letters with their unaccented ASCII base.
pub fn strip_accents(input: &str) -> String {
    input.chars().map(fold_char).collect()
}

fn fold_char(ch: char) -> char {
    match ch {
        'á' | 'à' | 'ä' | 'â' | 'ã' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'Á' | 'À' | 'Ä' | 'Â' | 'Ã' => 'A',
        'É' | 'È' | 'Ë' | 'Ê' => 'E',
        'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
        'Ó' | 'Ò' | 'Ö' | 'Ô' | 'Õ' => 'O',
        'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ç' => 'c',
        'Ç' => 'C',
        other => other,
    }
}

/// Lowercased, accent-free form used for case-insensitive matching.
pub fn search_key(input: &str) -> String {
    strip_accents(input.trim()).to_lowercase()
}

/// Parses operator-typed decimals, accepting `,` as the decimal mark and an
/// optional trailing `%`.
pub fn parse_decimal_input(raw: &str) -> Result<f64> {
    let trimmed = raw.trim().trim_end_matches('%').trim();
    if trimmed.is_empty() {
        return Err(CajaError::InvalidInput("empty numeric value".into()));
    }
    let normalized = if trimmed.contains(',') && trimmed.contains('.') {
        // 1.234,5 style: dots group thousands.
        trimmed.replace('.', "").replace(',', ".")
    } else {
        trimmed.replace(',', ".")
    };
    let value: f64 = normalized
        .parse()
        .map_err(|_| CajaError::InvalidInput(format!("`{}` is not a number", raw.trim())))?;
    if !value.is_finite() {
        return Err(CajaError::InvalidInput(format!(
            "`{}` is not a finite number",
            raw.trim()
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_spanish_accents() {
        assert_eq!(strip_accents("Descripción"), "Descripcion");
        assert_eq!(strip_accents("Número de Señas"), "Numero de Senas");
        assert_eq!(strip_accents("García"), "Garcia");
    }

    #[test]
    fn comma_decimal_is_normalized() {
        assert_eq!(parse_decimal_input("12,5").unwrap(), 12.5);
        assert_eq!(parse_decimal_input(" 12.5 % ").unwrap(), 12.5);
        assert_eq!(parse_decimal_input("1.234,5").unwrap(), 1234.5);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_decimal_input("abc").is_err());
        assert!(parse_decimal_input("").is_err());
        assert!(parse_decimal_input("inf").is_err());
    }

    #[test]
    fn search_key_folds_case_and_accents() {
        assert_eq!(search_key("  MARÍA "), "maria");
    }
}
