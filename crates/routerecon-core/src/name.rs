//! Hierarchical route names.
//!
//! A name is an ordered list of text components, written as a URI such as
//! `/ndn/edu/router-a`. Equality and ordering are component-wise.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// A hierarchical name made of text components.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Name(Vec<String>);

impl Name {
    /// The root name `/` with no components.
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a name from components.
    ///
    /// Components must be non-empty and must not contain `/`.
    pub fn from_components<I, C>(components: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        let mut out = Vec::new();
        for c in components {
            let c = c.into();
            if c.is_empty() {
                return Err(CoreError::InvalidName("empty component".into()));
            }
            if c.contains('/') {
                return Err(CoreError::InvalidName(format!("component contains '/': {}", c)));
            }
            out.push(c);
        }
        Ok(Self(out))
    }

    /// Parse a URI form like `/a/b/c`. Repeated slashes are collapsed.
    pub fn from_uri(uri: &str) -> Result<Self, CoreError> {
        if !uri.starts_with('/') {
            return Err(CoreError::InvalidName(format!("name must start with '/': {}", uri)));
        }
        Self::from_components(uri.split('/').filter(|c| !c.is_empty()))
    }

    /// The components of this name.
    pub fn components(&self) -> &[String] {
        &self.0
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this is the root name.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a component, returning the extended name.
    pub fn append(mut self, component: impl Into<String>) -> Result<Self, CoreError> {
        let c = component.into();
        if c.is_empty() || c.contains('/') {
            return Err(CoreError::InvalidName(format!("invalid component: {:?}", c)));
        }
        self.0.push(c);
        Ok(self)
    }

    /// Whether `self` is a prefix of (or equal to) `other`.
    pub fn is_prefix_of(&self, other: &Name) -> bool {
        self.0.len() <= other.0.len() && self.0.iter().zip(&other.0).all(|(a, b)| a == b)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for c in &self.0 {
            write!(f, "/{}", c)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self)
    }
}

impl FromStr for Name {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_uri(s)
    }
}
