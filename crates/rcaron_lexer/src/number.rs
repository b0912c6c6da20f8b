//! Numeric literal suffix grammar and value conversion.
use rcaron_syntax::{ErrorCode, Number, NumberKind};
use rust_decimal::Decimal;

/// Raw pieces of a numeric literal as scanned by the lexer.
pub(crate) struct NumberLiteral<'a> {
    /// Digits including `_` separators and, when fractional, the `.`.
    pub digits: &'a str,
    pub negative: bool,
    pub hex: bool,
    pub fractional: bool,
    pub suffix: &'a str,
}

fn suffix_kind(lit: &NumberLiteral<'_>) -> Result<NumberKind, (ErrorCode, String)> {
    let mut unsigned = false;
    let mut int32 = false;
    let mut int64 = false;
    let mut floating: Option<NumberKind> = None;
    let mut repeated_float = false;
    for c in lit.suffix.chars() {
        match c.to_ascii_lowercase() {
            'u' => unsigned = true,
            'i' => int32 = true,
            'l' => int64 = true,
            'f' | 'd' | 'm' => {
                repeated_float |= floating.is_some();
                floating = Some(match c.to_ascii_lowercase() {
                    'f' => NumberKind::F32,
                    'd' => NumberKind::F64,
                    _ => NumberKind::Decimal,
                });
            }
            _ => {}
        }
    }

    if lit.hex && (lit.fractional || floating == Some(NumberKind::Decimal)) {
        return Err((
            ErrorCode::InvalidHexNumber,
            "Hex literals cannot be fractional or decimal".to_string(),
        ));
    }
    let bad_suffix = |what: &str| {
        Err((
            ErrorCode::InvalidNumberSuffix,
            format!("Invalid number suffix '{}': {what}", lit.suffix),
        ))
    };
    if unsigned && floating.is_some() {
        return bad_suffix("unsigned cannot be floating");
    }
    if repeated_float || (floating.is_some() && (int32 || int64)) {
        return bad_suffix("conflicting width");
    }
    if lit.fractional && (unsigned || int32 || int64) {
        return bad_suffix("fractional literal with an integer suffix");
    }

    Ok(match floating {
        Some(kind) => kind,
        None if unsigned && int64 => NumberKind::U64,
        None if unsigned => NumberKind::U32,
        None if int64 => NumberKind::I64,
        None if int32 => NumberKind::I32,
        None if lit.fractional => NumberKind::F64,
        None => NumberKind::I64,
    })
}

/// Convert a scanned literal into a typed value.
pub(crate) fn evaluate(lit: &NumberLiteral<'_>) -> Result<Number, (ErrorCode, String)> {
    let kind = suffix_kind(lit)?;
    let mut text: String = lit.digits.chars().filter(|c| *c != '_').collect();
    if lit.hex && text.is_empty() {
        return Err((
            ErrorCode::InvalidHexNumber,
            "Hex literal has no digits".to_string(),
        ));
    }
    if lit.negative {
        text.insert(0, '-');
    }
    let radix = if lit.hex { 16 } else { 10 };
    let out_of_range = || {
        (
            ErrorCode::NumberOutOfRange,
            format!("'{text}' does not fit in {}", kind.name()),
        )
    };
    let value = match kind {
        NumberKind::I32 => i32::from_str_radix(&text, radix).map(Number::I32).ok(),
        NumberKind::I64 => i64::from_str_radix(&text, radix).map(Number::I64).ok(),
        NumberKind::U32 => u32::from_str_radix(&text, radix).map(Number::U32).ok(),
        NumberKind::U64 => u64::from_str_radix(&text, radix).map(Number::U64).ok(),
        NumberKind::F32 => text.parse::<f32>().map(Number::F32).ok(),
        NumberKind::F64 => text.parse::<f64>().map(Number::F64).ok(),
        NumberKind::Decimal => text.parse::<Decimal>().map(Number::Decimal).ok(),
    };
    value.ok_or_else(out_of_range)
}

/// Value used for a literal that failed to evaluate, so parsing can go on.
pub(crate) fn fallback(lit: &NumberLiteral<'_>) -> Number {
    if lit.fractional {
        Number::F64(0.0)
    } else {
        Number::I64(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit<'a>(digits: &'a str, suffix: &'a str) -> NumberLiteral<'a> {
        NumberLiteral {
            digits,
            negative: false,
            hex: false,
            fractional: digits.contains('.'),
            suffix,
        }
    }

    #[test]
    fn suffix_table() {
        let cases = [
            ("", NumberKind::I64),
            ("i", NumberKind::I32),
            ("l", NumberKind::I64),
            ("u", NumberKind::U32),
            ("ul", NumberKind::U64),
            ("lu", NumberKind::U64),
            ("iu", NumberKind::U32),
            ("f", NumberKind::F32),
            ("d", NumberKind::F64),
            ("m", NumberKind::Decimal),
        ];
        for (suffix, kind) in cases {
            assert_eq!(evaluate(&lit("12", suffix)).map(|n| n.kind()), Ok(kind), "{suffix}");
        }
    }

    #[test]
    fn rejected_combinations() {
        for suffix in ["uf", "ud", "um", "fd", "if"] {
            let err = evaluate(&lit("1", suffix)).map(|_| ()).unwrap_err();
            assert_eq!(err.0, ErrorCode::InvalidNumberSuffix, "{suffix}");
        }
        let err = evaluate(&lit("1.5", "i")).map(|_| ()).unwrap_err();
        assert_eq!(err.0, ErrorCode::InvalidNumberSuffix);
    }

    #[test]
    fn overflow_is_reported() {
        let err = evaluate(&lit("3000000000", "i")).map(|_| ()).unwrap_err();
        assert_eq!(err.0, ErrorCode::NumberOutOfRange);
    }
}
