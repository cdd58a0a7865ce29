//! Integer label to display name mapping.

use std::borrow::Cow;
use std::collections::BTreeMap;

/// Class names keyed by label. Unknown labels render as `CLASS_<id>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassRegistry {
    names: BTreeMap<usize, String>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: usize, name: impl Into<String>) {
        self.names.insert(id, name.into());
    }

    /// Display name for a label.
    pub fn name(&self, id: usize) -> Cow<'_, str> {
        match self.names.get(&id) {
            Some(name) => Cow::Borrowed(name.as_str()),
            None => Cow::Owned(format!("CLASS_{id}")),
        }
    }

    /// Registered `(id, name)` pairs in label order.
    pub fn entries(&self) -> impl Iterator<Item = (usize, &str)> {
        self.names.iter().map(|(&id, name)| (id, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Size of the label space covering every registered id.
    pub fn label_space(&self) -> usize {
        self.names.keys().next_back().map(|&id| id + 1).unwrap_or(0)
    }

    /// Names for `0..n`, filling gaps with the default name.
    pub fn dense_names(&self, n: usize) -> Vec<String> {
        (0..n).map(|id| self.name(id).into_owned()).collect()
    }
}

impl<S: Into<String>> FromIterator<(usize, S)> for ClassRegistry {
    fn from_iter<I: IntoIterator<Item = (usize, S)>>(iter: I) -> Self {
        Self {
            names: iter
                .into_iter()
                .map(|(id, name)| (id, name.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_ids_get_placeholder_names() {
        let registry: ClassRegistry = [(0, "PLANTA"), (2, "DOENTE")].into_iter().collect();
        assert_eq!(registry.name(0), "PLANTA");
        assert_eq!(registry.name(1), "CLASS_1");
        assert_eq!(registry.label_space(), 3);
        assert_eq!(
            registry.dense_names(3),
            vec!["PLANTA", "CLASS_1", "DOENTE"]
        );
        assert_eq!(ClassRegistry::new().label_space(), 0);
    }
}
