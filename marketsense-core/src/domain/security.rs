use serde::{Deserialize, Serialize};
use std::fmt;

/// Security identity: the `(symbol, exchange)` pair used as a join key for bars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SecurityId {
    pub symbol: String,
    pub exchange: String,
}

impl SecurityId {
    pub fn new(symbol: impl Into<String>, exchange: impl Into<String>) -> Self {
        Self { symbol: symbol.into(), exchange: exchange.into() }
    }
}

impl fmt::Display for SecurityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.exchange, self.symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecurityType {
    Stock,
    Etf,
    Forex,
    Future,
}

/// A tradable security.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Security {
    pub id: SecurityId,
    pub kind: SecurityType,
}

impl Security {
    pub fn new(symbol: impl Into<String>, exchange: impl Into<String>, kind: SecurityType) -> Self {
        Self { id: SecurityId::new(symbol, exchange), kind }
    }

    /// Shorthand for a common stock.
    pub fn stock(symbol: impl Into<String>, exchange: impl Into<String>) -> Self {
        Self::new(symbol, exchange, SecurityType::Stock)
    }

    pub fn symbol(&self) -> &str {
        &self.id.symbol
    }

    pub fn exchange(&self) -> &str {
        &self.id.exchange
    }
}

impl fmt::Display for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn identity_is_the_symbol_exchange_pair() {
        let a = SecurityId::new("AAPL", "NASDAQ");
        let b = SecurityId::new("AAPL", "NASDAQ");
        let c = SecurityId::new("AAPL", "NYSE");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn display_is_exchange_then_symbol() {
        let sec = Security::stock("SPY", "NYSE");
        assert_eq!(sec.to_string(), "NYSE:SPY");
        assert_eq!(sec.symbol(), "SPY");
    }
}
