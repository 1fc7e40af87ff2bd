//! Expansion engine: resolves symbol sequences into literal-only bit vectors.
//!
//! A reference symbol is replaced by each alternative of its pattern in turn
//! and the spliced sequence is resolved again from the splice point, so a
//! field's width falls out of resolution instead of being declared. Pending
//! sequences live on an explicit worklist; nesting depth in the grammar
//! never turns into call-stack depth.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::GrammarError;
use crate::grammar::{Bit, PatternRegistry, Symbol};

/// Width of one instruction word in bits.
pub const WORD_BITS: usize = 16;

/// A fully resolved, literal-only bit sequence.
///
/// Bits are stored most-significant first. The length is whatever the
/// resolved symbols produced; only 16-bit vectors map onto a decode slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BitVector(Vec<Bit>);

impl BitVector {
    /// Creates a vector from bits, most-significant first.
    #[must_use]
    pub const fn new(bits: Vec<Bit>) -> Self {
        Self(bits)
    }

    /// Expands a word into its 16 bits, most-significant first.
    #[must_use]
    pub fn from_word(word: u16) -> Self {
        Self(
            (0..WORD_BITS)
                .rev()
                .map(|shift| {
                    if (word >> shift) & 1 == 1 {
                        Bit::One
                    } else {
                        Bit::Zero
                    }
                })
                .collect(),
        )
    }

    /// The bits, most-significant first.
    #[must_use]
    pub fn bits(&self) -> &[Bit] {
        &self.0
    }

    /// Number of bits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for a zero-width vector.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reads the vector as an unsigned big-endian word.
    ///
    /// `None` unless the vector is exactly [`WORD_BITS`] long.
    #[must_use]
    pub fn as_word(&self) -> Option<u16> {
        if self.0.len() != WORD_BITS {
            return None;
        }
        Some(
            self.0
                .iter()
                .fold(0u16, |word, bit| (word << 1) | u16::from(bit.as_u8())),
        )
    }

    fn from_literals(symbols: &[Symbol]) -> Self {
        Self(
            symbols
                .iter()
                .filter_map(|symbol| match symbol {
                    Symbol::Bit(bit) => Some(*bit),
                    Symbol::Ref(_) => None,
                })
                .collect(),
        )
    }
}

impl fmt::Display for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.0 {
            write!(f, "{}", bit.as_char())?;
        }
        Ok(())
    }
}

/// A partially resolved sequence; every symbol before `cursor` is a literal.
struct Candidate {
    symbols: Vec<Symbol>,
    cursor: usize,
}

/// Resolves templates and pattern fragments against a pattern registry.
#[derive(Debug, Clone, Copy)]
pub struct Expander<'a> {
    registry: &'a PatternRegistry,
}

impl<'a> Expander<'a> {
    /// Creates an expander over a read-only registry.
    #[must_use]
    pub const fn new(registry: &'a PatternRegistry) -> Self {
        Self { registry }
    }

    /// Verifies that every pattern reachable from `symbols` exists and that
    /// no pattern appears in its own expansion ancestry.
    ///
    /// `origin` names the template or pattern that owns `symbols` and is
    /// reported as the referencing name for unresolved top-level references.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPattern` or `CyclicPattern`.
    pub fn check(&self, origin: &str, symbols: &[Symbol]) -> Result<(), GrammarError> {
        let mut ancestry = Vec::new();
        let mut resolved = HashSet::new();
        self.check_sequence(origin, symbols, &mut ancestry, &mut resolved)
    }

    fn check_sequence(
        &self,
        referenced_by: &str,
        symbols: &[Symbol],
        ancestry: &mut Vec<&'a str>,
        resolved: &mut HashSet<&'a str>,
    ) -> Result<(), GrammarError> {
        let registry = self.registry;

        for name in symbols.iter().filter_map(Symbol::as_reference) {
            if resolved.contains(name) {
                continue;
            }

            if let Some(start) = ancestry.iter().position(|entry| *entry == name) {
                let mut path: Vec<String> = ancestry[start..]
                    .iter()
                    .map(|entry| (*entry).to_string())
                    .collect();
                path.push(name.to_string());
                return Err(GrammarError::CyclicPattern { path });
            }

            let pattern = registry.lookup(name, referenced_by)?;
            ancestry.push(&pattern.name);
            for alternative in &pattern.alternatives {
                self.check_sequence(&pattern.name, alternative, ancestry, resolved)?;
            }
            ancestry.pop();
            resolved.insert(&pattern.name);
        }

        Ok(())
    }

    /// Produces every literal-only vector that `symbols` denotes.
    ///
    /// Alternatives are taken in declaration order with the leftmost
    /// reference varying slowest, so the output order is stable across
    /// runs. Vector lengths are not checked here; fragments of any width
    /// may be expanded.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPattern` or `CyclicPattern` before any expansion.
    pub fn expand(&self, origin: &str, symbols: &[Symbol]) -> Result<Vec<BitVector>, GrammarError> {
        self.check(origin, symbols)?;
        self.resolve(origin, symbols, None)
    }

    /// Produces every vector of a template that must resolve to one
    /// instruction word.
    ///
    /// Same order as [`Expander::expand`], but a branch is abandoned as soon
    /// as no completion of it can be exactly [`WORD_BITS`] wide, so an
    /// over-wide or short template fails without enumerating its words.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPattern` or `CyclicPattern` before any expansion, and
    /// `MalformedEncoding` carrying one wrong-width completion of the first
    /// branch that cannot fit.
    pub fn expand_word(
        &self,
        origin: &str,
        symbols: &[Symbol],
    ) -> Result<Vec<BitVector>, GrammarError> {
        self.check(origin, symbols)?;
        self.resolve(origin, symbols, Some(WORD_BITS))
    }

    /// Shortest and longest resolved width of `symbols`, without
    /// enumerating. Saturates at `usize::MAX`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPattern` or `CyclicPattern`.
    pub fn width_range(
        &self,
        origin: &str,
        symbols: &[Symbol],
    ) -> Result<(usize, usize), GrammarError> {
        self.check(origin, symbols)?;
        self.sequence_widths(origin, symbols, &mut HashMap::new())
    }

    fn resolve(
        &self,
        origin: &str,
        symbols: &[Symbol],
        width: Option<usize>,
    ) -> Result<Vec<BitVector>, GrammarError> {
        let mut widths = HashMap::new();
        let mut vectors = Vec::new();
        let mut pending = vec![Candidate {
            symbols: symbols.to_vec(),
            cursor: 0,
        }];

        while let Some(Candidate { symbols, cursor }) = pending.pop() {
            if let Some(width) = width {
                let (shortest, longest) =
                    self.sequence_widths(origin, &symbols[cursor..], &mut widths)?;
                let too_long = cursor.saturating_add(shortest) > width;
                if too_long || cursor.saturating_add(longest) < width {
                    let vector =
                        self.completion(origin, &symbols, cursor, !too_long, &mut widths)?;
                    return Err(GrammarError::MalformedEncoding {
                        mnemonic: origin.to_string(),
                        vector,
                    });
                }
            }

            let next_reference = symbols[cursor..]
                .iter()
                .enumerate()
                .find_map(|(offset, symbol)| {
                    symbol.as_reference().map(|name| (cursor + offset, name))
                });

            let Some((position, name)) = next_reference else {
                vectors.push(BitVector::from_literals(&symbols));
                continue;
            };
            let pattern = self.registry.lookup(name, origin)?;

            for alternative in pattern.alternatives.iter().rev() {
                let mut spliced = Vec::with_capacity(symbols.len() + alternative.len());
                spliced.extend_from_slice(&symbols[..position]);
                spliced.extend_from_slice(alternative);
                spliced.extend_from_slice(&symbols[position + 1..]);
                pending.push(Candidate {
                    symbols: spliced,
                    cursor: position,
                });
            }
        }

        tracing::trace!(origin, vectors = vectors.len(), "expanded symbol sequence");
        Ok(vectors)
    }

    /// Resolves one completion of a candidate, taking the longest (or
    /// shortest) alternative at every reference; first declared wins ties.
    fn completion(
        &self,
        origin: &str,
        symbols: &[Symbol],
        cursor: usize,
        longest: bool,
        widths: &mut HashMap<&'a str, (usize, usize)>,
    ) -> Result<BitVector, GrammarError> {
        let mut bits = BitVector::from_literals(&symbols[..cursor]).0;
        let mut stack: Vec<(&str, &[Symbol])> = vec![(origin, &symbols[cursor..])];

        while let Some((referenced_by, sequence)) = stack.pop() {
            let Some((first, rest)) = sequence.split_first() else {
                continue;
            };
            stack.push((referenced_by, rest));
            match first {
                Symbol::Bit(bit) => bits.push(*bit),
                Symbol::Ref(name) => {
                    let pattern = self.registry.lookup(name, referenced_by)?;
                    let mut chosen: Option<(&[Symbol], usize)> = None;
                    for alternative in &pattern.alternatives {
                        let (shortest, most) =
                            self.sequence_widths(&pattern.name, alternative, widths)?;
                        let key = if longest { most } else { shortest };
                        let better = match chosen {
                            None => true,
                            Some((_, best)) if longest => key > best,
                            Some((_, best)) => key < best,
                        };
                        if better {
                            chosen = Some((alternative.as_slice(), key));
                        }
                    }
                    if let Some((alternative, _)) = chosen {
                        stack.push((pattern.name.as_str(), alternative));
                    }
                }
            }
        }

        Ok(BitVector(bits))
    }

    fn sequence_widths(
        &self,
        referenced_by: &str,
        symbols: &[Symbol],
        per_pattern: &mut HashMap<&'a str, (usize, usize)>,
    ) -> Result<(usize, usize), GrammarError> {
        let registry = self.registry;
        let (mut shortest, mut longest) = (0usize, 0usize);

        for symbol in symbols {
            let (low, high) = match symbol {
                Symbol::Bit(_) => (1, 1),
                Symbol::Ref(name) => {
                    let pattern = registry.lookup(name, referenced_by)?;
                    if let Some(&known) = per_pattern.get(pattern.name.as_str()) {
                        known
                    } else {
                        let mut range = (usize::MAX, 0);
                        for alternative in &pattern.alternatives {
                            let (low, high) =
                                self.sequence_widths(&pattern.name, alternative, per_pattern)?;
                            range = (range.0.min(low), range.1.max(high));
                        }
                        per_pattern.insert(&pattern.name, range);
                        range
                    }
                }
            };
            shortest = shortest.saturating_add(low);
            longest = longest.saturating_add(high);
        }

        Ok((shortest, longest))
    }

    /// Expands a single named pattern on its own.
    ///
    /// # Errors
    ///
    /// See [`Expander::expand`].
    pub fn expand_pattern(&self, name: &str) -> Result<Vec<BitVector>, GrammarError> {
        self.expand(name, &[Symbol::reference(name)])
    }

    /// Number of vectors [`Expander::expand`] would return, without
    /// enumerating them. Saturates at `u64::MAX`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPattern` or `CyclicPattern`.
    pub fn count(&self, origin: &str, symbols: &[Symbol]) -> Result<u64, GrammarError> {
        self.check(origin, symbols)?;
        let mut per_pattern = HashMap::new();
        self.count_sequence(origin, symbols, &mut per_pattern)
    }

    fn count_sequence(
        &self,
        referenced_by: &str,
        symbols: &[Symbol],
        per_pattern: &mut HashMap<&'a str, u64>,
    ) -> Result<u64, GrammarError> {
        let registry = self.registry;
        let mut total = 1u64;

        for name in symbols.iter().filter_map(Symbol::as_reference) {
            let pattern = registry.lookup(name, referenced_by)?;
            let branches = if let Some(&known) = per_pattern.get(pattern.name.as_str()) {
                known
            } else {
                let mut sum = 0u64;
                for alternative in &pattern.alternatives {
                    sum = sum.saturating_add(self.count_sequence(
                        &pattern.name,
                        alternative,
                        per_pattern,
                    )?);
                }
                per_pattern.insert(&pattern.name, sum);
                sum
            };
            total = total.saturating_mul(branches);
        }

        Ok(total)
    }
}
