//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module converts the external line representation of intents into the
// typed form. One intent per line, comma-separated fields, a numeric code in
// the first field:
//
// | Code | Intent     | Fields after the code              |
// |------|------------|------------------------------------|
// | 0    | AddLimit   | orderId, side, quantity, price     |
// | 1    | Cancel     | orderId                            |
// | 5    | Market     | orderId, side, quantity            |
// | 6    | StopLoss   | orderId, side, quantity, stopPrice |
//
// Side code 0 is BUY; any other integer decodes as SELL. Trailing `// ...`
// comments that follow content are stripped; blank lines decode to nothing.
// Malformed lines are reported to the caller, who logs and skips them.
//--------------------------------------------------------------------------------------------------

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::warn;

use crate::messages::Intent;
use crate::types::{OrderId, Quantity, Side};

/// Failures while decoding a single line.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// The line does not carry enough comma-separated fields for its code.
    #[error("line {0:?} has too few fields")]
    TooFewFields(String),

    /// The leading code is not one of the supported intents.
    #[error("unrecognised message code {code} in line {line:?}")]
    UnknownCode { code: u32, line: String },

    /// An integer field failed to parse.
    #[error("invalid integer field {field:?}: {source}")]
    InvalidInteger {
        field: String,
        source: std::num::ParseIntError,
    },

    /// A price field failed to parse.
    #[error("invalid price field {field:?}: {source}")]
    InvalidPrice {
        field: String,
        source: rust_decimal::Error,
    },

    /// A quantity field decoded to zero.
    #[error("quantity must be positive in line {0:?}")]
    ZeroQuantity(String),
}

/// Strips a trailing `//` comment when it follows non-blank content. A line
/// that starts with the marker is left alone and fails decoding instead.
fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(index) if !line[..index].trim().is_empty() => line[..index].trim_end(),
        _ => line,
    }
}

fn parse_u32(field: &str) -> Result<u32, DecodeError> {
    field.trim().parse().map_err(|source| DecodeError::InvalidInteger {
        field: field.trim().to_string(),
        source,
    })
}

fn parse_price(field: &str) -> Result<Decimal, DecodeError> {
    field.trim().parse().map_err(|source| DecodeError::InvalidPrice {
        field: field.trim().to_string(),
        source,
    })
}

fn parse_side(field: &str) -> Result<Side, DecodeError> {
    Ok(match parse_u32(field)? {
        0 => Side::Buy,
        _ => Side::Sell,
    })
}

fn parse_quantity(field: &str, line: &str) -> Result<Quantity, DecodeError> {
    match parse_u32(field)? {
        0 => Err(DecodeError::ZeroQuantity(line.to_string())),
        quantity => Ok(quantity),
    }
}

/// Decodes one input line.
///
/// # Returns
/// * `Ok(Some(intent))` - the line carried a valid intent
/// * `Ok(None)` - the line was blank (or blank after comment stripping)
/// * `Err(error)` - the line was malformed; the caller decides how to report
pub fn decode_line(line: &str) -> Result<Option<Intent>, DecodeError> {
    let stripped = strip_comment(line).trim();
    if stripped.is_empty() {
        return Ok(None);
    }

    let fields: Vec<&str> = stripped.split(',').collect();
    if fields.len() < 2 {
        return Err(DecodeError::TooFewFields(stripped.to_string()));
    }

    let code = parse_u32(fields[0])?;
    let order_id: OrderId = parse_u32(fields[1])?;

    let intent = match code {
        0 => {
            if fields.len() < 5 {
                return Err(DecodeError::TooFewFields(stripped.to_string()));
            }
            Intent::AddLimit {
                order_id,
                side: parse_side(fields[2])?,
                quantity: parse_quantity(fields[3], stripped)?,
                price: parse_price(fields[4])?,
            }
        }
        1 => Intent::Cancel { order_id },
        5 => {
            if fields.len() < 4 {
                return Err(DecodeError::TooFewFields(stripped.to_string()));
            }
            Intent::Market {
                order_id,
                side: parse_side(fields[2])?,
                quantity: parse_quantity(fields[3], stripped)?,
            }
        }
        6 => {
            if fields.len() < 5 {
                return Err(DecodeError::TooFewFields(stripped.to_string()));
            }
            Intent::StopLoss {
                order_id,
                side: parse_side(fields[2])?,
                quantity: parse_quantity(fields[3], stripped)?,
                stop_price: parse_price(fields[4])?,
            }
        }
        code => {
            return Err(DecodeError::UnknownCode {
                code,
                line: stripped.to_string(),
            })
        }
    };
    Ok(Some(intent))
}

/// Decodes a batch of lines, logging and skipping the ones that fail.
pub fn decode_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<Intent> {
    let mut intents = Vec::new();
    for line in lines {
        match decode_line(line) {
            Ok(Some(intent)) => intents.push(intent),
            Ok(None) => {}
            Err(error) => warn!(%error, "skipping undecodable input line"),
        }
    }
    intents
}

/// Decodes a whole input text, one intent per line.
pub fn decode_input(input: &str) -> Vec<Intent> {
    decode_lines(input.lines())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_decode_add_limit() {
        let intent = decode_line("0,100000,1,1,1075").unwrap();
        assert_eq!(
            intent,
            Some(Intent::AddLimit {
                order_id: 100000,
                side: Side::Sell,
                quantity: 1,
                price: dec!(1075),
            })
        );
    }

    #[test]
    fn test_decode_cancel() {
        let intent = decode_line("1,100004").unwrap();
        assert_eq!(intent, Some(Intent::Cancel { order_id: 100004 }));
    }

    #[test]
    fn test_decode_market() {
        let intent = decode_line("5,100009,1,3").unwrap();
        assert_eq!(
            intent,
            Some(Intent::Market {
                order_id: 100009,
                side: Side::Sell,
                quantity: 3,
            })
        );
    }

    #[test]
    fn test_decode_stop_loss() {
        let intent = decode_line("6,100011,1,30,1000").unwrap();
        assert_eq!(
            intent,
            Some(Intent::StopLoss {
                order_id: 100011,
                side: Side::Sell,
                quantity: 30,
                stop_price: dec!(1000),
            })
        );
    }

    #[test]
    fn test_trailing_comment_is_stripped() {
        let intent = decode_line("0,100008,0,3,1050    /// buy 3 @ 1050").unwrap();
        assert_eq!(
            intent,
            Some(Intent::AddLimit {
                order_id: 100008,
                side: Side::Buy,
                quantity: 3,
                price: dec!(1050),
            })
        );
    }

    #[test]
    fn test_blank_lines_decode_to_nothing() {
        assert_eq!(decode_line("").unwrap(), None);
        assert_eq!(decode_line("   ").unwrap(), None);
    }

    #[test]
    fn test_comment_only_line_is_an_error() {
        // A marker with nothing before it is not stripped, so the line fails
        // to decode rather than silently disappearing.
        let err = decode_line("// just a comment").expect_err("must not decode");
        assert!(matches!(err, DecodeError::TooFewFields(_)));
    }

    #[test]
    fn test_garbage_line_is_an_error() {
        let err = decode_line("BADMESSAGE").expect_err("must not decode");
        assert_eq!(err, DecodeError::TooFewFields("BADMESSAGE".to_string()));
    }

    #[test]
    fn test_unknown_code_is_an_error() {
        let err = decode_line("9,100000").expect_err("must not decode");
        assert!(matches!(err, DecodeError::UnknownCode { code: 9, .. }));
    }

    #[test]
    fn test_nonzero_side_codes_decode_as_sell() {
        let intent = decode_line("0,1,2,5,1000").unwrap();
        match intent {
            Some(Intent::AddLimit { side, .. }) => assert_eq!(side, Side::Sell),
            other => panic!("unexpected decode result: {other:?}"),
        }
    }

    #[test]
    fn test_zero_quantity_is_rejected() {
        let err = decode_line("0,1,0,0,1000").expect_err("must not decode");
        assert!(matches!(err, DecodeError::ZeroQuantity(_)));
    }

    #[test]
    fn test_negative_quantity_is_rejected() {
        let err = decode_line("0,1,0,-3,1000").expect_err("must not decode");
        assert!(matches!(err, DecodeError::InvalidInteger { .. }));
    }

    #[test]
    fn test_batch_decoding_skips_bad_lines() {
        let input = "0,100000,1,1,1075\nBADMESSAGE\n\n1,100000\n";
        let intents = decode_input(input);
        assert_eq!(intents.len(), 2);
        assert_eq!(intents[1], Intent::Cancel { order_id: 100000 });
    }
}
