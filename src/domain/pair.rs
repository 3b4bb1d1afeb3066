use serde::{Deserialize, Serialize};

/// (token, quote) market identity. Addresses are lower-cased on construction so
/// the same pair always maps to the same snapshot file.
#[derive(Serialize, Deserialize, Debug, Clone, Hash, Eq, PartialEq)]
pub struct PairId {
    token_address: String,
    quote_address: String,
}

impl PairId {
    pub fn new(token_address: &str, quote_address: &str) -> Self {
        Self {
            token_address: token_address.trim().to_lowercase(),
            quote_address: quote_address.trim().to_lowercase(),
        }
    }

    pub fn token_address(&self) -> &str {
        &self.token_address
    }

    pub fn quote_address(&self) -> &str {
        &self.quote_address
    }
}

impl std::fmt::Display for PairId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.token_address, self.quote_address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_are_case_normalized() {
        let a = PairId::new("0xABCdef", " 0xBB4C ");
        let b = PairId::new("0xabcdef", "0xbb4c");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "0xabcdef/0xbb4c");
    }
}
