//! Grammar data model: symbols, patterns, templates, and their lookup tables.
//!
//! The registry and the template table are dumb stores. They refuse
//! duplicate keys at insertion time, but reference resolution and cycle
//! checks belong to the expansion engine and the builder.

use std::collections::HashMap;

use crate::error::GrammarError;

/// A single literal bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bit {
    /// Literal `0`.
    Zero,
    /// Literal `1`.
    One,
}

impl Bit {
    /// Converts `0` or `1` into a bit.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Zero),
            1 => Some(Self::One),
            _ => None,
        }
    }

    /// Returns the bit as `0` or `1`.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Zero => 0,
            Self::One => 1,
        }
    }

    /// Returns the bit as an ASCII `'0'` or `'1'`.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Zero => '0',
            Self::One => '1',
        }
    }
}

/// One element of a template or pattern alternative.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(try_from = "RawSymbol", into = "RawSymbol")
)]
pub enum Symbol {
    /// A literal bit, kept as-is by expansion.
    Bit(Bit),
    /// A reference to a named pattern, replaced by each of its alternatives.
    Ref(String),
}

impl Symbol {
    /// Literal `0`.
    pub const ZERO: Self = Self::Bit(Bit::Zero);
    /// Literal `1`.
    pub const ONE: Self = Self::Bit(Bit::One);

    /// Creates a reference to the named pattern.
    #[must_use]
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Ref(name.into())
    }

    /// Returns the referenced pattern name, if this is a reference.
    #[must_use]
    pub fn as_reference(&self) -> Option<&str> {
        match self {
            Self::Bit(_) => None,
            Self::Ref(name) => Some(name),
        }
    }
}

impl From<Bit> for Symbol {
    fn from(bit: Bit) -> Self {
        Self::Bit(bit)
    }
}

/// Wire form of a symbol: `0`, `1`, or a pattern name.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(untagged)]
enum RawSymbol {
    Bit(u8),
    Ref(String),
}

#[cfg(feature = "serde")]
impl TryFrom<RawSymbol> for Symbol {
    type Error = String;

    fn try_from(raw: RawSymbol) -> Result<Self, Self::Error> {
        match raw {
            RawSymbol::Bit(value) => Bit::from_u8(value)
                .map(Self::Bit)
                .ok_or_else(|| format!("literal bit must be 0 or 1, got {value}")),
            RawSymbol::Ref(name) => Ok(Self::Ref(name)),
        }
    }
}

#[cfg(feature = "serde")]
impl From<Symbol> for RawSymbol {
    fn from(symbol: Symbol) -> Self {
        match symbol {
            Symbol::Bit(bit) => Self::Bit(bit.as_u8()),
            Symbol::Ref(name) => Self::Ref(name),
        }
    }
}

/// Builds a `Vec<Symbol>` from `0`, `1`, and pattern-name string literals.
///
/// ```
/// use lutgen_core::{symbols, Symbol};
///
/// let template = symbols![0, 1, "Xn"];
/// assert_eq!(template[0], Symbol::ZERO);
/// assert_eq!(template[2], Symbol::reference("Xn"));
/// ```
#[macro_export]
macro_rules! symbols {
    (@symbol 0) => {
        $crate::Symbol::ZERO
    };
    (@symbol 1) => {
        $crate::Symbol::ONE
    };
    (@symbol $name:literal) => {
        $crate::Symbol::reference($name)
    };
    ($($symbol:tt),* $(,)?) => {
        vec![$($crate::symbols!(@symbol $symbol)),*]
    };
}

/// A named field definition made of mutually exclusive alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Pattern {
    /// Name used by reference symbols.
    pub name: String,
    /// Alternatives in declaration order.
    pub alternatives: Vec<Vec<Symbol>>,
}

impl Pattern {
    /// Creates a pattern.
    #[must_use]
    pub fn new(name: impl Into<String>, alternatives: Vec<Vec<Symbol>>) -> Self {
        Self {
            name: name.into(),
            alternatives,
        }
    }
}

/// The root encoding of one mnemonic.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Template {
    /// Mnemonic the resolved words decode as.
    pub mnemonic: String,
    /// Symbols that must resolve to exactly 16 literal bits.
    pub symbols: Vec<Symbol>,
}

impl Template {
    /// Creates a template.
    #[must_use]
    pub fn new(mnemonic: impl Into<String>, symbols: Vec<Symbol>) -> Self {
        Self {
            mnemonic: mnemonic.into(),
            symbols,
        }
    }
}

/// Named patterns, looked up by name, kept in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(try_from = "Vec<Pattern>", into = "Vec<Pattern>")
)]
pub struct PatternRegistry {
    patterns: Vec<Pattern>,
    index: HashMap<String, usize>,
}

impl PatternRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pattern.
    ///
    /// # Errors
    ///
    /// Returns `DuplicatePattern` if the name is taken and `EmptyPattern`
    /// if the pattern has no alternatives.
    pub fn insert(&mut self, pattern: Pattern) -> Result<(), GrammarError> {
        if pattern.alternatives.is_empty() {
            return Err(GrammarError::EmptyPattern { name: pattern.name });
        }
        if self.index.contains_key(&pattern.name) {
            return Err(GrammarError::DuplicatePattern { name: pattern.name });
        }
        self.index.insert(pattern.name.clone(), self.patterns.len());
        self.patterns.push(pattern);
        Ok(())
    }

    /// Registers a pattern from its name and alternatives.
    ///
    /// # Errors
    ///
    /// See [`PatternRegistry::insert`].
    pub fn define(
        &mut self,
        name: impl Into<String>,
        alternatives: Vec<Vec<Symbol>>,
    ) -> Result<(), GrammarError> {
        self.insert(Pattern::new(name, alternatives))
    }

    /// Looks up a pattern on behalf of the template or pattern referencing it.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPattern` naming both `referenced_by` and `name`.
    pub fn lookup(&self, name: &str, referenced_by: &str) -> Result<&Pattern, GrammarError> {
        self.get(name).ok_or_else(|| GrammarError::UnknownPattern {
            referenced_by: referenced_by.to_string(),
            name: name.to_string(),
        })
    }

    /// Returns the named pattern, if registered.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Pattern> {
        self.index.get(name).map(|&i| &self.patterns[i])
    }

    /// Iterates patterns in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }

    /// Number of registered patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true if no pattern is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl TryFrom<Vec<Pattern>> for PatternRegistry {
    type Error = GrammarError;

    fn try_from(patterns: Vec<Pattern>) -> Result<Self, Self::Error> {
        let mut registry = Self::new();
        for pattern in patterns {
            registry.insert(pattern)?;
        }
        Ok(registry)
    }
}

impl From<PatternRegistry> for Vec<Pattern> {
    fn from(registry: PatternRegistry) -> Self {
        registry.patterns
    }
}

/// Templates keyed by unique mnemonic, kept in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(try_from = "Vec<Template>", into = "Vec<Template>")
)]
pub struct TemplateTable {
    templates: Vec<Template>,
    index: HashMap<String, usize>,
}

impl TemplateTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a template if its mnemonic is not yet taken.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateMnemonic`; the earlier template is kept untouched.
    pub fn insert(&mut self, template: Template) -> Result<(), GrammarError> {
        if self.index.contains_key(&template.mnemonic) {
            return Err(GrammarError::DuplicateMnemonic {
                mnemonic: template.mnemonic,
            });
        }
        self.index
            .insert(template.mnemonic.clone(), self.templates.len());
        self.templates.push(template);
        Ok(())
    }

    /// Registers a template from its mnemonic and symbols.
    ///
    /// # Errors
    ///
    /// See [`TemplateTable::insert`].
    pub fn define(
        &mut self,
        mnemonic: impl Into<String>,
        symbols: Vec<Symbol>,
    ) -> Result<(), GrammarError> {
        self.insert(Template::new(mnemonic, symbols))
    }

    /// Returns the template for a mnemonic, if registered.
    #[must_use]
    pub fn get(&self, mnemonic: &str) -> Option<&Template> {
        self.index.get(mnemonic).map(|&i| &self.templates[i])
    }

    /// Iterates templates in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }

    /// Number of registered templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns true if no template is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TryFrom<Vec<Template>> for TemplateTable {
    type Error = GrammarError;

    fn try_from(templates: Vec<Template>) -> Result<Self, Self::Error> {
        let mut table = Self::new();
        for template in templates {
            table.insert(template)?;
        }
        Ok(table)
    }
}

impl From<TemplateTable> for Vec<Template> {
    fn from(table: TemplateTable) -> Self {
        table.templates
    }
}

/// A complete grammar: the pattern registry plus the template table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Grammar {
    /// Named field definitions.
    pub patterns: PatternRegistry,
    /// Per-mnemonic root templates.
    pub templates: TemplateTable,
}
