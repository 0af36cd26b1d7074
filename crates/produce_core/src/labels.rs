use std::collections::HashMap;

use crate::error::{Error, Result};

/// Dense integer code assigned to a label name.
pub type LabelCode = usize;

/// Bidirectional mapping between label names and dense codes.
///
/// Names are stored lower-cased; codes are handed out in first-seen order
/// starting at 0 and never change once assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelIndex {
    names: Vec<String>,
    codes: HashMap<String, LabelCode>,
}

/// Canonical form under which label names are stored and compared.
pub fn normalize(name: &str) -> String {
    name.to_lowercase()
}

impl LabelIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the code for `name`, assigning the next free one on first sight.
    pub fn intern(&mut self, name: &str) -> LabelCode {
        let canonical = normalize(name);
        if let Some(&code) = self.codes.get(&canonical) {
            return code;
        }
        let code = self.names.len();
        self.names.push(canonical.clone());
        self.codes.insert(canonical, code);
        code
    }

    pub fn name_to_code(&self, name: &str) -> Result<LabelCode> {
        self.codes
            .get(&normalize(name))
            .copied()
            .ok_or_else(|| Error::UnknownLabel(name.to_string()))
    }

    pub fn code_to_name(&self, code: LabelCode) -> Result<&str> {
        self.names
            .get(code)
            .map(String::as_str)
            .ok_or(Error::UnknownCode(code))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Label names ordered by code.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_assigns_contiguous_codes_in_first_seen_order() {
        let mut index = LabelIndex::new();
        assert_eq!(index.intern("fresh_apple"), 0);
        assert_eq!(index.intern("rotten_apple"), 1);
        assert_eq!(index.intern("fresh_apple"), 0);
        assert_eq!(index.intern("fresh_banana"), 2);
        assert_eq!(index.len(), 3);
        assert_eq!(index.names(), ["fresh_apple", "rotten_apple", "fresh_banana"]);
    }

    #[test]
    fn intern_is_case_insensitive_and_stores_lowercase() -> Result<()> {
        let mut index = LabelIndex::new();
        let a = index.intern("Fresh_Apple");
        let b = index.intern("FRESH_APPLE");
        assert_eq!(a, b);
        assert_eq!(index.len(), 1);
        assert_eq!(index.code_to_name(a)?, "fresh_apple");
        assert_eq!(index.name_to_code("fresh_APPLE")?, a);
        Ok(())
    }

    #[test]
    fn lookups_roundtrip_for_every_interned_name() -> Result<()> {
        let inputs = ["Kiwi", "apple", "APPLE", "Banana", "kiwi", "Mango"];
        let mut index = LabelIndex::new();
        for name in inputs {
            index.intern(name);
        }
        for name in inputs {
            let code = index.name_to_code(name)?;
            assert_eq!(index.code_to_name(code)?, normalize(name));
        }
        let mut codes: Vec<LabelCode> = index
            .names()
            .iter()
            .map(|n| index.name_to_code(n))
            .collect::<Result<_>>()?;
        codes.sort_unstable();
        assert_eq!(codes, (0..4).collect::<Vec<_>>());
        Ok(())
    }

    #[test]
    fn unknown_lookups_fail() {
        let mut index = LabelIndex::new();
        index.intern("pear");
        assert!(matches!(
            index.name_to_code("plum"),
            Err(Error::UnknownLabel(name)) if name == "plum"
        ));
        assert!(matches!(index.code_to_name(1), Err(Error::UnknownCode(1))));
    }
}
