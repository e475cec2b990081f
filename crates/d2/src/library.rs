//! Polygon library: an arena of base polygons with running transforms.

use polynest_core::geometry::{IntPoint, Ngon, Ngons};
use polynest_core::{Affine2, Error, Handle, Result};
use std::collections::HashSet;

/// One library entry. The base polygon set never changes after creation;
/// only the transform accumulates.
#[derive(Debug, Clone)]
pub struct PolyEntry {
    base: Ngons,
    transform: Affine2,
}

impl PolyEntry {
    /// Creates an entry with an identity transform.
    pub fn new(base: Ngons) -> Self {
        Self {
            base,
            transform: Affine2::identity(),
        }
    }

    pub fn base(&self) -> &Ngons {
        &self.base
    }

    pub fn transform(&self) -> &Affine2 {
        &self.transform
    }

    /// Applies `delta` after the current transform.
    pub fn compose(&mut self, delta: &Affine2) {
        self.transform = self.transform.then(delta);
    }

    pub fn reset(&mut self) {
        self.transform = Affine2::identity();
    }

    /// Every base polygon under the current transform.
    pub fn transformed(&self) -> Ngons {
        self.transform.apply_ngons(&self.base)
    }

    /// The first base polygon under the current transform, empty if none.
    pub fn transformed_outer(&self) -> Ngon {
        self.base
            .first()
            .map(|p| self.transform.apply_ngon(p))
            .unwrap_or_default()
    }

    /// The first base vertex under the current transform.
    pub fn origin(&self) -> Option<IntPoint> {
        self.base
            .first()
            .and_then(|p| p.first())
            .map(|v| self.transform.apply_int(*v))
    }
}

/// Growable arena of polygon entries addressed by [`Handle`].
#[derive(Debug, Clone, Default)]
pub struct PolyLibrary {
    entries: Vec<PolyEntry>,
}

impl PolyLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends a polygon set and returns its handle.
    pub fn push(&mut self, base: Ngons) -> Handle {
        self.entries.push(PolyEntry::new(base));
        self.entries.len() - 1
    }

    pub fn get(&self, handle: Handle) -> Result<&PolyEntry> {
        let len = self.entries.len();
        self.entries
            .get(handle)
            .ok_or(Error::InvalidHandle { handle, len })
    }

    pub fn get_mut(&mut self, handle: Handle) -> Result<&mut PolyEntry> {
        let len = self.entries.len();
        self.entries
            .get_mut(handle)
            .ok_or(Error::InvalidHandle { handle, len })
    }

    /// Composes `delta` onto the transform of `handle`.
    pub fn compose(&mut self, handle: Handle, delta: &Affine2) -> Result<()> {
        self.get_mut(handle)?.compose(delta);
        Ok(())
    }

    pub fn transformed(&self, handle: Handle) -> Result<Ngons> {
        Ok(self.get(handle)?.transformed())
    }

    pub fn transformed_outer(&self, handle: Handle) -> Result<Ngon> {
        Ok(self.get(handle)?.transformed_outer())
    }

    /// Transformed first vertex of `handle`.
    pub fn origin(&self, handle: Handle) -> Result<IntPoint> {
        self.get(handle)?.origin().ok_or_else(|| {
            Error::InvalidGeometry(format!("entry {} has no vertices", handle))
        })
    }

    /// Resets every transform to identity.
    pub fn reset_transforms(&mut self) {
        self.entries.iter_mut().for_each(PolyEntry::reset);
    }

    /// Drops entries added after the library held `len` entries.
    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Resolves a handle selection: `None` means every entry. Duplicates are
    /// dropped keeping first occurrence, and every handle is checked.
    pub fn resolve(&self, handles: Option<&[Handle]>) -> Result<Vec<Handle>> {
        let Some(handles) = handles else {
            return Ok((0..self.len()).collect());
        };
        let mut seen = HashSet::with_capacity(handles.len());
        let mut unique = Vec::with_capacity(handles.len());
        for &h in handles {
            self.get(h)?;
            if seen.insert(h) {
                unique.push(h);
            }
        }
        Ok(unique)
    }
}
