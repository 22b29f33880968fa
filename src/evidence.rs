use crate::types::PhotoRef;
use log::debug;

/// Extra photos the user attaches to an incident, in the order they were taken.
/// Duplicates are allowed and there is no limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvidenceCollector {
    photos: Vec<PhotoRef>,
}

impl EvidenceCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, photo: PhotoRef) {
        debug!("Adding evidence photo {}", photo);
        self.photos.push(photo);
    }

    /// Removes the photo at `index`. Out-of-range indexes are ignored.
    pub fn remove(&mut self, index: usize) -> Option<PhotoRef> {
        if index < self.photos.len() {
            Some(self.photos.remove(index))
        } else {
            debug!("Ignoring removal of missing evidence index {}", index);
            None
        }
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PhotoRef> {
        self.photos.iter()
    }

    pub fn as_slice(&self) -> &[PhotoRef] {
        &self.photos
    }
}

impl<'a> IntoIterator for &'a EvidenceCollector {
    type Item = &'a PhotoRef;
    type IntoIter = std::slice::Iter<'a, PhotoRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.photos.iter()
    }
}
