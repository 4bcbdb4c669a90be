//! Fixed-capacity arrays of ciphertexts, the input of batched operators.
//!
//! A [`CiphertextArray`] is allocated with a fixed number of empty slots,
//! each written exactly once. Sealing it with [`CiphertextArray::seal`] checks
//! that every slot is filled and yields a [`FilledCiphertextArray`], the only
//! form [`xor`](crate::operations::xor) accepts.
//!
//! The array owns the ciphertexts written into it: freeing the array
//! (dropping it, or calling `free`) also releases them.
//! Use [`FilledCiphertextArray::into_vec`] to take them back instead.

use std::ops::Deref;

use crate::error::{Result, SheError};
use crate::Ciphertext;

#[derive(Clone, Debug, Default)]
pub struct CiphertextArray {
    slots: Vec<Option<Ciphertext>>,
}

impl CiphertextArray {
    #[must_use]
    /// Reserves `count` empty slots.
    pub fn allocate(count: usize) -> Self {
        Self {
            slots: vec![None; count],
        }
    }

    /// Stores `ciphertext` at `index`.
    ///
    /// ## Errors
    ///
    /// Returns [`SheError::SlotOutOfRange`] if `index` is beyond the capacity,
    /// and [`SheError::SlotOccupied`] if the slot has already been written.
    pub fn write(&mut self, index: usize, ciphertext: Ciphertext) -> Result<()> {
        let capacity = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(SheError::SlotOutOfRange { index, capacity })?;
        if slot.is_some() {
            return Err(SheError::SlotOccupied(index));
        }
        *slot = Some(ciphertext);
        Ok(())
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Ciphertext> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Checks that every slot has been written.
    ///
    /// ## Errors
    ///
    /// Returns [`SheError::UnfilledSlot`] with the first empty slot otherwise.
    pub fn seal(self) -> Result<FilledCiphertextArray> {
        let ciphertexts = self
            .slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| slot.ok_or(SheError::UnfilledSlot(i)))
            .collect::<Result<Vec<_>>>()?;
        Ok(FilledCiphertextArray { ciphertexts })
    }

    /// Releases the array together with the ciphertexts it holds.
    pub fn free(self) {}
}

/// A ciphertext array whose slots are all written.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilledCiphertextArray {
    ciphertexts: Vec<Ciphertext>,
}

impl FilledCiphertextArray {
    #[must_use]
    pub fn into_vec(self) -> Vec<Ciphertext> {
        self.ciphertexts
    }

    /// Releases the array together with the ciphertexts it holds.
    pub fn free(self) {}
}

impl From<Vec<Ciphertext>> for FilledCiphertextArray {
    fn from(ciphertexts: Vec<Ciphertext>) -> Self {
        Self { ciphertexts }
    }
}

impl FromIterator<Ciphertext> for FilledCiphertextArray {
    fn from_iter<I: IntoIterator<Item = Ciphertext>>(iter: I) -> Self {
        Self {
            ciphertexts: iter.into_iter().collect(),
        }
    }
}

impl Deref for FilledCiphertextArray {
    type Target = [Ciphertext];

    fn deref(&self) -> &Self::Target {
        &self.ciphertexts
    }
}
