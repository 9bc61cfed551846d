//! Series and block label sets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Label holding the metric name of a series.
pub const METRIC_NAME: &str = "__name__";

/// A single `name=value` pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub value: String,
}

impl Label {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An ordered set of labels, sorted by name with unique names.
///
/// When built from pairs with repeated names the last value wins.
/// Serialized as a plain list of labels; lists read back in any order are normalised the same
/// way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Label>", into = "Vec<Label>")]
pub struct Labels(Vec<Label>);

impl Labels {
    pub fn new<I, N, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let map: BTreeMap<String, String> = pairs
            .into_iter()
            .map(|(n, v)| (n.into(), v.into()))
            .collect();
        Self(map.into_iter().map(|(name, value)| Label { name, value }).collect())
    }

    /// Labels of a series named `metric_name` with no other labels.
    pub fn metric(metric_name: impl Into<String>) -> Self {
        Self(vec![Label::new(METRIC_NAME, metric_name)])
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .binary_search_by(|l| l.name.as_str().cmp(name))
            .ok()
            .map(|i| self.0[i].value.as_str())
    }

    /// The value of the `__name__` label, if set.
    pub fn metric_name(&self) -> Option<&str> {
        self.get(METRIC_NAME)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Projects the label set into a map, as stored in block metadata.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.0
            .iter()
            .map(|l| (l.name.clone(), l.value.clone()))
            .collect()
    }
}

impl From<Vec<Label>> for Labels {
    fn from(labels: Vec<Label>) -> Self {
        Self::new(labels.into_iter().map(|l| (l.name, l.value)))
    }
}

impl From<Labels> for Vec<Label> {
    fn from(labels: Labels) -> Self {
        labels.0
    }
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, l) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}=\"{}\"", l.name, l.value)?;
        }
        write!(f, "}}")
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseLabelsError {
    #[error("label '{0}' is not of the form name=value")]
    MissingSeparator(String),

    #[error("label name must not be empty in '{0}'")]
    EmptyName(String),
}

/// Parses `name=value[,name=value...]`. An empty string is the empty label set.
impl FromStr for Labels {
    type Err = ParseLabelsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pairs = s
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|pair| {
                let (name, value) = pair
                    .split_once('=')
                    .ok_or_else(|| ParseLabelsError::MissingSeparator(pair.to_string()))?;
                let name = name.trim();
                if name.is_empty() {
                    return Err(ParseLabelsError::EmptyName(pair.to_string()));
                }
                Ok((name.to_string(), value.trim().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(pairs))
    }
}
