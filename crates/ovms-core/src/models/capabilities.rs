//! Command capability table (`V` message)

use serde::{Deserialize, Serialize};

use crate::decode::Params;
use crate::error::DecodeError;

/// Which command codes the connected vehicle firmware accepts
///
/// Serialized as the sorted list of supported codes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<u8>", from = "Vec<u8>")]
pub struct CommandSupport([bool; 256]);

impl Default for CommandSupport {
    fn default() -> Self {
        Self([false; 256])
    }
}

impl CommandSupport {
    /// Build a table from capability tokens such as `C1` or `C3-6`
    ///
    /// Tokens without the `C` prefix are ignored.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self, DecodeError> {
        let mut table = Self::default();
        table.replace(tokens)?;
        Ok(table)
    }

    /// Clear the table, then mark tokens in order
    ///
    /// Stops at the first bad token; codes marked before it stay set.
    pub fn replace<S: AsRef<str>>(&mut self, tokens: &[S]) -> Result<(), DecodeError> {
        self.0 = [false; 256];
        for token in tokens {
            let token = token.as_ref().trim();
            let Some(range) = token.strip_prefix('C') else {
                continue;
            };
            let invalid = || DecodeError::InvalidCapability(token.to_string());
            let (start, end) = match range.split_once('-') {
                Some((start, end)) => (start, end),
                None => (range, range),
            };
            let start: u8 = start.trim().parse().map_err(|_| invalid())?;
            let end: u8 = end.trim().parse().map_err(|_| invalid())?;
            for code in start..=end {
                self.0[code as usize] = true;
            }
        }
        Ok(())
    }

    pub(crate) fn apply(&mut self, p: &Params<'_>) -> Result<(), DecodeError> {
        self.replace(p.all())
    }

    pub fn supports(&self, code: u8) -> bool {
        self.0[code as usize]
    }

    pub fn set(&mut self, code: u8, supported: bool) {
        self.0[code as usize] = supported;
    }

    pub fn supported(&self) -> Vec<u8> {
        (0..=u8::MAX).filter(|&c| self.supports(c)).collect()
    }

    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&s| s).count()
    }
}

impl std::fmt::Debug for CommandSupport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CommandSupport").field(&self.supported()).finish()
    }
}

impl From<CommandSupport> for Vec<u8> {
    fn from(table: CommandSupport) -> Self {
        table.supported()
    }
}

impl From<Vec<u8>> for CommandSupport {
    fn from(codes: Vec<u8>) -> Self {
        let mut table = Self::default();
        for code in codes {
            table.set(code, true);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tokens_and_ranges() {
        let table = CommandSupport::from_tokens(&["C1", "C3-6"]).unwrap();
        assert_eq!(table.supported(), vec![1, 3, 4, 5, 6]);
        assert_eq!(table.count(), 5);
        assert!(!table.supports(2));
        assert!(!table.supports(0));
        assert!(!table.supports(255));
    }

    #[test]
    fn test_full_range() {
        let table = CommandSupport::from_tokens(&["C0-255"]).unwrap();
        assert_eq!(table.count(), 256);
    }

    #[test]
    fn test_ignores_foreign_tokens() {
        let table = CommandSupport::from_tokens(&["X9", "", "C7"]).unwrap();
        assert_eq!(table.supported(), vec![7]);
    }

    #[test]
    fn test_invalid_tokens() {
        assert_eq!(
            CommandSupport::from_tokens(&["C1", "Cx"]).unwrap_err(),
            DecodeError::InvalidCapability("Cx".into())
        );
        assert!(CommandSupport::from_tokens(&["C250-300"]).is_err());
    }

    #[test]
    fn test_replace_keeps_ranges_before_bad_token() {
        let mut table = CommandSupport::from_tokens(&["C1-40"]).unwrap();
        assert_eq!(
            table.replace(&["C9", "C20-21", "C?", "C30"]).unwrap_err(),
            DecodeError::InvalidCapability("C?".into())
        );
        assert_eq!(table.supported(), vec![9, 20, 21]);
    }

    #[test]
    fn test_serde_as_code_list() {
        let table = CommandSupport::from_tokens(&["C7", "C20-22"]).unwrap();
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, "[7,20,21,22]");
        let back: CommandSupport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
