use std::{collections::BTreeMap, fmt};

pub type Map = BTreeMap<String, String>;

/// An equality-based label selector, as carried by a `Service`.
///
/// An empty selector matches every pod in a namespace.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector(Map);

// === impl Selector ===

impl Selector {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns true if every key in the selector is present in `labels` with
    /// an equal value.
    pub fn matches(&self, labels: &Map) -> bool {
        self.0.iter().all(|(k, v)| labels.get(k) == Some(v))
    }

    /// Renders the selector in the form accepted by a list's `labelSelector`
    /// parameter, or `None` when no filter should be applied.
    pub fn to_query(&self) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }
        Some(self.to_string())
    }
}

impl From<Map> for Selector {
    #[inline]
    fn from(map: Map) -> Self {
        Self(map)
    }
}

impl From<Option<Map>> for Selector {
    #[inline]
    fn from(map: Option<Map>) -> Self {
        Self(map.unwrap_or_default())
    }
}

impl std::iter::FromIterator<(String, String)> for Selector {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl std::iter::FromIterator<(&'static str, &'static str)> for Selector {
    fn from_iter<T: IntoIterator<Item = (&'static str, &'static str)>>(iter: T) -> Self {
        iter.into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{k}={v}")?;
        }
        Ok(())
    }
}
