use serde::Serialize;

use crate::error::{Error, Result};

/// Print any report as formatted JSON to stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", to_json(value)?);
    Ok(())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| Error::Parse(format!("JSON serialize: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::{HoldingEntry, Valuation, value_holdings};

    #[test]
    fn valuation_serializes_rows_and_total() {
        let holdings = vec![HoldingEntry::new("bitcoin", "Bitcoin", 2.0).unwrap()];
        let valuation: Valuation = value_holdings(&holdings, &[]);

        let json: serde_json::Value = serde_json::from_str(&to_json(&valuation).unwrap()).unwrap();
        assert_eq!(json["total"], 0.0);
        assert_eq!(json["rows"][0]["id"], "bitcoin");
        assert_eq!(json["rows"][0]["quoted"], false);
    }
}
