//! Decode table builder.
//!
//! A build runs in three phases:
//! 1. Input validation: every reference resolves and no pattern is cyclic.
//! 2. Expansion of each template, optionally sharded across worker threads.
//!    A template whose branches cannot all resolve to 16 bits fails here,
//!    before its words are enumerated.
//! 3. A serialized merge in template order that checks slot ownership.
//!
//! No table is returned while any error is outstanding.

use std::collections::HashSet;
use std::thread;

use crate::error::{ErrorCollection, GrammarError};
use crate::expansion::{BitVector, Expander};
use crate::grammar::{Grammar, PatternRegistry, Symbol, Template, TemplateTable};
use crate::table::{Claim, DecodeTable, MnemonicId};

/// Build configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildConfig {
    /// Worker threads used for expansion; `0` and `1` both expand inline.
    pub workers: usize,
    /// Keep going after the first error and report everything found.
    pub collect_all_errors: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            collect_all_errors: false,
        }
    }
}

struct ErrorSink {
    errors: ErrorCollection,
    collect_all: bool,
}

impl ErrorSink {
    const fn new(collect_all: bool) -> Self {
        Self {
            errors: ErrorCollection::new(),
            collect_all,
        }
    }

    /// Stores an error, or hands it straight back when failing fast.
    fn record(&mut self, error: GrammarError) -> Result<(), ErrorCollection> {
        if !self.collect_all {
            return Err(error.into());
        }
        if !self.errors.iter().any(|known| *known == error) {
            self.errors.push(error);
        }
        Ok(())
    }

    fn finish<T>(self, value: T) -> Result<T, ErrorCollection> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }
}

type Expansion<'t> = (&'t Template, Result<Vec<BitVector>, GrammarError>);

/// Builds the decode table with the default configuration.
///
/// # Errors
///
/// Returns the first grammar error found.
pub fn build(
    registry: &PatternRegistry,
    templates: &TemplateTable,
) -> Result<DecodeTable, ErrorCollection> {
    build_with_config(registry, templates, &BuildConfig::default())
}

/// Builds the decode table.
///
/// # Errors
///
/// Returns the first grammar error found, or every error found when
/// `collect_all_errors` is set.
pub fn build_with_config(
    registry: &PatternRegistry,
    templates: &TemplateTable,
    config: &BuildConfig,
) -> Result<DecodeTable, ErrorCollection> {
    let expander = Expander::new(registry);
    let mut sink = ErrorSink::new(config.collect_all_errors);

    validate(expander, registry, templates, &mut sink)?;
    if !sink.errors.is_empty() {
        return Err(sink.errors);
    }

    let expansions = expand_all(expander, templates, config.workers);
    let table = merge(expansions, &mut sink)?;

    tracing::info!(
        mnemonics = templates.len(),
        occupied = table.occupied_count(),
        "decode table built"
    );
    sink.finish(table)
}

impl Grammar {
    /// Builds this grammar's decode table.
    ///
    /// # Errors
    ///
    /// See [`build_with_config`].
    pub fn build_table(&self, config: &BuildConfig) -> Result<DecodeTable, ErrorCollection> {
        build_with_config(&self.patterns, &self.templates, config)
    }
}

fn validate(
    expander: Expander<'_>,
    registry: &PatternRegistry,
    templates: &TemplateTable,
    sink: &mut ErrorSink,
) -> Result<(), ErrorCollection> {
    for pattern in registry.iter() {
        if let Err(error) = expander.check(&pattern.name, &[Symbol::reference(&pattern.name)]) {
            sink.record(error)?;
        }
    }
    for template in templates.iter() {
        if let Err(error) = expander.check(&template.mnemonic, &template.symbols) {
            sink.record(error)?;
        }
    }
    Ok(())
}

fn expand_all<'t>(
    expander: Expander<'_>,
    templates: &'t TemplateTable,
    workers: usize,
) -> Vec<Expansion<'t>> {
    let templates: Vec<&Template> = templates.iter().collect();
    let expand_one = move |template: &'t Template| {
        (
            template,
            expander.expand_word(&template.mnemonic, &template.symbols),
        )
    };

    if workers <= 1 || templates.len() <= 1 {
        return templates.into_iter().map(expand_one).collect();
    }

    let shard_len = templates.len().div_ceil(workers);
    thread::scope(|scope| {
        let handles: Vec<_> = templates
            .chunks(shard_len)
            .map(|shard| {
                scope.spawn(move || shard.iter().copied().map(expand_one).collect::<Vec<_>>())
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
            })
            .collect()
    })
}

fn merge(
    expansions: Vec<Expansion<'_>>,
    sink: &mut ErrorSink,
) -> Result<DecodeTable, ErrorCollection> {
    let mut table = DecodeTable::default();
    let mut reported_pairs: HashSet<(MnemonicId, MnemonicId)> = HashSet::new();

    for (template, expansion) in expansions {
        let id = table.add_mnemonic(&template.mnemonic);
        let vectors = match expansion {
            Ok(vectors) => vectors,
            Err(error) => {
                sink.record(error)?;
                continue;
            }
        };

        tracing::debug!(
            mnemonic = %template.mnemonic,
            vectors = vectors.len(),
            "generated bit patterns"
        );

        for vector in vectors {
            let Some(word) = vector.as_word() else {
                sink.record(GrammarError::MalformedEncoding {
                    mnemonic: template.mnemonic.clone(),
                    vector,
                })?;
                break;
            };

            tracing::trace!(mnemonic = %template.mnemonic, bits = %vector, "claiming slot");

            if let Claim::Collision { owner } = table.claim(word, id) {
                if reported_pairs.insert((owner, id)) {
                    sink.record(GrammarError::SlotCollision {
                        first: table.mnemonic(owner).to_string(),
                        second: template.mnemonic.clone(),
                        slot: word,
                        bit_string: vector.to_string(),
                    })?;
                }
            }
        }
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::{build, build_with_config, BuildConfig};
    use crate::error::GrammarError;
    use crate::grammar::{PatternRegistry, Symbol, TemplateTable};

    fn size_grammar() -> (PatternRegistry, TemplateTable) {
        let mut registry = PatternRegistry::new();
        registry
            .define("Size", vec![symbols![0, 0], symbols![0, 1], symbols![1, 0]])
            .expect("fixture pattern");
        let mut templates = TemplateTable::new();
        templates
            .define("OP", symbols![0, 0, 0, 0, "Size", 1, 1, 1, 1, 1, 1, 1, 1, 0, 0])
            .expect("fixture template");
        (registry, templates)
    }

    #[test]
    fn size_field_occupies_three_distinct_slots() {
        let (registry, templates) = size_grammar();
        let table = build(&registry, &templates).expect("builds");

        assert_eq!(table.occupied_count(), 3);
        assert_eq!(table.words_for("OP"), [0x03FC, 0x07FC, 0x0BFC]);
        assert_eq!(table.get(0x0FFC), None);
    }

    #[test]
    fn same_mnemonic_reaching_a_word_twice_is_not_a_collision() {
        let mut registry = PatternRegistry::new();
        registry
            .define("dup", vec![symbols![0], symbols![0], symbols![1]])
            .expect("fixture pattern");
        let mut templates = TemplateTable::new();
        templates
            .define("X", symbols![1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, "dup"])
            .expect("fixture template");

        let table = build(&registry, &templates).expect("builds");
        assert_eq!(table.words_for("X"), [0xFFFE, 0xFFFF]);
    }

    #[test]
    fn distinct_mnemonics_on_one_word_collide() {
        let registry = PatternRegistry::new();
        let mut templates = TemplateTable::new();
        templates
            .define("FIRST", symbols![0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 0, 0])
            .expect("fixture template");
        templates
            .define("SECOND", symbols![0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 0, 0])
            .expect("fixture template");

        let errors = build(&registry, &templates).expect_err("collides");
        assert_eq!(
            errors.into_single(),
            Some(GrammarError::SlotCollision {
                first: "FIRST".into(),
                second: "SECOND".into(),
                slot: 0x003C,
                bit_string: "0000000000111100".into(),
            })
        );
    }

    #[test]
    fn short_template_is_malformed() {
        let (registry, _) = size_grammar();
        let mut templates = TemplateTable::new();
        templates
            .define("SHORT", symbols![0, 0, "Size", 1])
            .expect("fixture template");

        let errors = build(&registry, &templates).expect_err("5 bits");
        let Some(GrammarError::MalformedEncoding { mnemonic, vector }) = errors.into_single() else {
            panic!("expected a single malformed encoding");
        };
        assert_eq!(mnemonic, "SHORT");
        assert_eq!(vector.to_string(), "00001");
    }

    #[test]
    fn wide_template_fails_without_enumerating_its_words() {
        let mut registry = PatternRegistry::new();
        registry
            .define("b", vec![symbols![0], symbols![1]])
            .expect("fixture pattern");
        let mut templates = TemplateTable::new();
        templates
            .define("WIDE", vec![Symbol::reference("b"); 64])
            .expect("fixture template");

        let errors = build(&registry, &templates).expect_err("64 bits");
        let Some(GrammarError::MalformedEncoding { mnemonic, vector }) = errors.into_single() else {
            panic!("expected a single malformed encoding");
        };
        assert_eq!(mnemonic, "WIDE");
        assert_eq!(vector.to_string(), "0".repeat(64));
    }

    #[test]
    fn one_wide_branch_rejects_the_template_and_claims_nothing() {
        let mut registry = PatternRegistry::new();
        registry
            .define("ea", vec![symbols![0, 0], symbols![1, 1, 1]])
            .expect("fixture pattern");
        let mut templates = TemplateTable::new();
        templates
            .define("MIXED", symbols![0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, "ea"])
            .expect("fixture template");
        templates
            .define("OTHER", symbols![0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0])
            .expect("fixture template");

        let config = BuildConfig {
            collect_all_errors: true,
            ..BuildConfig::default()
        };
        let errors = build_with_config(&registry, &templates, &config).expect_err("17 bits");

        // MIXED's 16-bit branch is 0x0000, same as OTHER, but is never claimed.
        let Some(GrammarError::MalformedEncoding { mnemonic, vector }) = errors.into_single() else {
            panic!("expected only the malformed encoding");
        };
        assert_eq!(mnemonic, "MIXED");
        assert_eq!(vector.to_string(), "00000000000000111");
    }

    #[test]
    fn unresolved_pattern_in_unused_pattern_still_fails() {
        let (mut registry, templates) = size_grammar();
        registry
            .define("orphan", vec![symbols!["missing"]])
            .expect("fixture pattern");

        let errors = build(&registry, &templates).expect_err("missing reference");
        assert_eq!(
            errors.into_single(),
            Some(GrammarError::UnknownPattern {
                referenced_by: "orphan".into(),
                name: "missing".into(),
            })
        );
    }

    #[test]
    fn collect_all_reports_every_defect_once() {
        let mut registry = PatternRegistry::new();
        registry
            .define("loop", vec![symbols!["loop"]])
            .expect("fixture pattern");
        let mut templates = TemplateTable::new();
        templates
            .define("A", symbols!["nowhere"])
            .expect("fixture template");
        templates
            .define("B", symbols!["loop"])
            .expect("fixture template");

        let config = BuildConfig {
            collect_all_errors: true,
            ..BuildConfig::default()
        };
        let errors = build_with_config(&registry, &templates, &config).expect_err("two defects");
        let errors: Vec<_> = errors.into_iter().collect();

        assert_eq!(
            errors,
            [
                GrammarError::CyclicPattern {
                    path: vec!["loop".into(), "loop".into()],
                },
                GrammarError::UnknownPattern {
                    referenced_by: "A".into(),
                    name: "nowhere".into(),
                },
            ]
        );
    }

    #[test]
    fn collect_all_reports_each_colliding_pair_once() {
        let mut registry = PatternRegistry::new();
        registry
            .define("b", vec![symbols![0], symbols![1]])
            .expect("fixture pattern");
        let mut templates = TemplateTable::new();
        templates
            .define("P", symbols![1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, "b", "b"])
            .expect("fixture template");
        templates
            .define("Q", symbols![1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, "b"])
            .expect("fixture template");
        templates
            .define("R", symbols![0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0])
            .expect("fixture template");

        let config = BuildConfig {
            collect_all_errors: true,
            ..BuildConfig::default()
        };
        let errors = build_with_config(&registry, &templates, &config).expect_err("defects");

        assert_eq!(errors.len(), 2);
        assert!(matches!(
            errors.first(),
            Some(GrammarError::SlotCollision { first, second, slot: 0xFFFE, .. })
                if first == "P" && second == "Q"
        ));
        assert!(errors
            .iter()
            .any(|e| matches!(e, GrammarError::MalformedEncoding { mnemonic, .. } if mnemonic == "R")));
    }

    #[test]
    fn sharded_build_matches_inline_build() {
        let mut registry = PatternRegistry::new();
        registry
            .define("n", vec![symbols![0, 0], symbols![0, 1], symbols![1, 0], symbols![1, 1]])
            .expect("fixture pattern");
        let mut templates = TemplateTable::new();
        for (i, prefix) in ["00", "01", "10", "11"].iter().enumerate() {
            let mut symbols = symbols!["n", "n", "n", "n", "n", "n", "n"];
            symbols.splice(
                0..0,
                prefix.chars().map(|c| {
                    if c == '1' {
                        crate::Symbol::ONE
                    } else {
                        crate::Symbol::ZERO
                    }
                }),
            );
            templates
                .define(format!("T{i}"), symbols)
                .expect("fixture template");
        }

        let inline = build(&registry, &templates).expect("builds");
        let sharded = build_with_config(
            &registry,
            &templates,
            &BuildConfig {
                workers: 3,
                ..BuildConfig::default()
            },
        )
        .expect("builds");

        assert_eq!(inline, sharded);
        assert_eq!(inline.occupied_count(), 4 * 4_usize.pow(7));
    }
}
