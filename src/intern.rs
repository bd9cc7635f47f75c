use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::sync::{Arc, RwLock};

use lazy_static::lazy_static;

lazy_static! {
    static ref SUBSTITUENT_NAMES: RwLock<HashMap<Arc<str>, Name>> = RwLock::new(HashMap::new());
}

/// An interned substituent name such as `n-acetyl` or `sulfate`.
///
/// Every copy of a repeat unit carries the same substituents, so each
/// distinct spelling is stored once and shared. Names are compared by
/// content.
#[derive(Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Name(Arc<str>);

impl Name {
    /// Intern `name`, lowercased with surrounding whitespace removed.
    pub fn new(name: &str) -> Self {
        let key = name.trim().to_lowercase();
        let known = SUBSTITUENT_NAMES
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key.as_str())
            .cloned();
        if let Some(name) = known {
            return name;
        }

        let mut names = SUBSTITUENT_NAMES
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let shared: Arc<str> = Arc::from(key);
        names
            .entry(shared.clone())
            .or_insert_with(|| Name(shared))
            .clone()
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Name::new(s)
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Name::new(&s)
    }
}

impl Debug for Name {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{:?}", self.name())
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.write_str(self.name())
    }
}
