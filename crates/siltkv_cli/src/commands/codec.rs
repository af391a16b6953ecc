//! Key codec inspection commands.

use siltkv_codec::{decode_key, encode_key, Value};

/// Encodes typed literals as one key tuple and returns it as hex.
pub fn encode(literals: &[String]) -> Result<String, Box<dyn std::error::Error>> {
    let values = literals
        .iter()
        .map(|l| Value::from_literal(l))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(to_hex(&encode_key(&values)?))
}

/// Decodes a hex key and returns its values as space-separated literals.
pub fn decode(hex: &str) -> Result<String, Box<dyn std::error::Error>> {
    let bytes = from_hex(hex.trim()).ok_or("key must be an even number of hex digits")?;
    let values = decode_key(&bytes)?;
    Ok(values
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" "))
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn from_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literals(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn encodes_typed_literals() {
        assert_eq!(encode(&literals(&["null"])).unwrap(), "00");
        assert_eq!(
            encode(&literals(&["s:abc"])).unwrap(),
            "046162630000000000fa"
        );
        assert!(encode(&literals(&["q:1"])).is_err());
    }

    #[test]
    fn decode_reverses_encode() {
        let hex = encode(&literals(&["i:-3", "s:abc", "null"])).unwrap();
        assert_eq!(decode(&hex).unwrap(), "i:-3 s:abc null");
        assert!(decode("0").is_err());
        assert!(decode("zz").is_err());
    }
}
