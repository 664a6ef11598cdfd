use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    /// Classify a raw `type` field. Only `call` and `put` (any case, any
    /// surrounding whitespace) are recognised.
    pub fn classify(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "call" => Some(OptionType::Call),
            "put" => Some(OptionType::Put),
            _ => None,
        }
    }

    /// Lower-case tag used in file names
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionType::Call => "call",
            OptionType::Put => "put",
        }
    }
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionType::Call => write!(f, "Call"),
            OptionType::Put => write!(f, "Put"),
        }
    }
}

/// One contract of an options chain as returned by the quote source.
/// The API reports every field as a string, so they are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionRecord {
    #[serde(rename = "contractID")]
    pub contract_id: String,
    pub symbol: String,
    pub expiration: String,
    pub strike: String,
    #[serde(rename = "type")]
    pub option_type: String,
    pub last: String,
    pub mark: String,
    pub bid: String,
    pub bid_size: String,
    pub ask: String,
    pub ask_size: String,
    pub volume: String,
    pub open_interest: String,
    pub date: String,
    pub implied_volatility: String,
    pub delta: String,
    pub gamma: String,
    pub theta: String,
    pub vega: String,
    pub rho: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionChainResponse {
    pub endpoint: String,
    pub message: String,
    pub data: Vec<OptionRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_normalizes_case_and_whitespace() {
        assert_eq!(OptionType::classify("call"), Some(OptionType::Call));
        assert_eq!(OptionType::classify("  PUT "), Some(OptionType::Put));
        assert_eq!(OptionType::classify("Call\t"), Some(OptionType::Call));
        assert_eq!(OptionType::classify("calls"), None);
        assert_eq!(OptionType::classify(""), None);
        assert_eq!(OptionType::classify("straddle"), None);
    }

    #[test]
    fn record_deserializes_api_field_names() {
        let json = r#"{
            "contractID": "SPY250620C00100000",
            "symbol": "SPY",
            "expiration": "2025-06-20",
            "strike": "100.00",
            "type": "call",
            "date": "2025-01-01",
            "implied_volatility": "0.20",
            "bid_size": "12"
        }"#;
        let rec: OptionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.contract_id, "SPY250620C00100000");
        assert_eq!(rec.option_type, "call");
        assert_eq!(rec.bid_size, "12");
        // absent fields default to empty
        assert_eq!(rec.rho, "");
    }
}
