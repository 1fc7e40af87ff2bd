//! The 65536-slot decode table produced by the builder.

/// Number of slots: one per 16-bit instruction word.
pub const SLOT_COUNT: usize = 1 << 16;

/// Index of a mnemonic inside the one [`DecodeTable`] that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct MnemonicId(usize);

/// Outcome of claiming a slot for a mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Claim {
    /// The slot was empty and now belongs to the mnemonic.
    Claimed,
    /// The slot already belonged to the same mnemonic.
    AlreadyOwned,
    /// The slot belongs to a different mnemonic and was left untouched.
    Collision { owner: MnemonicId },
}

/// Mapping from every 16-bit word to the mnemonic it decodes as, if any.
///
/// Slots are indexed by the word's unsigned value. The table has no link
/// back to the grammar it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeTable {
    mnemonics: Vec<String>,
    slots: Vec<Option<MnemonicId>>,
}

impl Default for DecodeTable {
    fn default() -> Self {
        Self {
            mnemonics: Vec::new(),
            slots: vec![None; SLOT_COUNT],
        }
    }
}

impl DecodeTable {
    /// Adds a mnemonic that slots may be claimed for.
    pub(crate) fn add_mnemonic(&mut self, mnemonic: &str) -> MnemonicId {
        let id = MnemonicId(self.mnemonics.len());
        self.mnemonics.push(mnemonic.to_string());
        id
    }

    /// Claims `word` for `id` unless a different mnemonic already owns it.
    pub(crate) fn claim(&mut self, word: u16, id: MnemonicId) -> Claim {
        let slot = &mut self.slots[usize::from(word)];
        match *slot {
            None => {
                *slot = Some(id);
                Claim::Claimed
            }
            Some(owner) if owner == id => Claim::AlreadyOwned,
            Some(owner) => Claim::Collision { owner },
        }
    }

    /// Returns the mnemonic `word` decodes as.
    #[must_use]
    pub fn get(&self, word: u16) -> Option<&str> {
        self.owner(word).map(|id| self.mnemonic(id))
    }

    /// Returns the owner of `word`.
    pub(crate) fn owner(&self, word: u16) -> Option<MnemonicId> {
        self.slots[usize::from(word)]
    }

    /// Name of a mnemonic issued by this table.
    pub(crate) fn mnemonic(&self, id: MnemonicId) -> &str {
        &self.mnemonics[id.0]
    }

    /// All mnemonics in build order, including those owning no slot.
    pub fn mnemonics(&self) -> impl Iterator<Item = &str> {
        self.mnemonics.iter().map(String::as_str)
    }

    /// Total number of slots, always [`SLOT_COUNT`].
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Occupied slots as `(word, mnemonic)` in ascending word order.
    pub fn occupied(&self) -> impl Iterator<Item = (u16, &str)> {
        (0..=u16::MAX)
            .zip(self.slots.iter())
            .filter_map(|(word, slot)| slot.map(|id| (word, self.mnemonic(id))))
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Words that decode as `mnemonic`, ascending.
    #[must_use]
    pub fn words_for(&self, mnemonic: &str) -> Vec<u16> {
        self.occupied()
            .filter_map(|(word, owner)| (owner == mnemonic).then_some(word))
            .collect()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for DecodeTable {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(
            self.slots
                .iter()
                .map(|slot| slot.map(|id| self.mnemonic(id))),
        )
    }
}
