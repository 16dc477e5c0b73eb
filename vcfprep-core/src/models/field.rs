use std::fmt::{self, Display};

use fxhash::FxHashMap;

///
/// The `Number=` declaration of an INFO or FORMAT field.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone, Copy)]
pub enum NumberKind {
    /// A fixed count, `Number=0` for flags.
    Fixed(usize),
    /// `Number=A`: one value per ALT allele.
    PerAlt,
    /// `Number=R`: one value per allele, REF included.
    PerAlleleInclRef,
    /// `Number=G`: one value per possible genotype.
    PerGenotype,
    /// `Number=.`
    Variable,
    Unknown,
}

impl From<&str> for NumberKind {
    fn from(value: &str) -> Self {
        match value.trim() {
            "A" => NumberKind::PerAlt,
            "R" => NumberKind::PerAlleleInclRef,
            "G" => NumberKind::PerGenotype,
            "." => NumberKind::Variable,
            other => other
                .parse::<usize>()
                .map(NumberKind::Fixed)
                .unwrap_or(NumberKind::Unknown),
        }
    }
}

impl Display for NumberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberKind::Fixed(k) => write!(f, "{}", k),
            NumberKind::PerAlt => write!(f, "A"),
            NumberKind::PerAlleleInclRef => write!(f, "R"),
            NumberKind::PerGenotype => write!(f, "G"),
            NumberKind::Variable => write!(f, "."),
            NumberKind::Unknown => write!(f, "?"),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub number: NumberKind,
}

impl FieldSpec {
    pub fn new<S: Into<String>>(name: S, number: NumberKind) -> Self {
        FieldSpec {
            name: name.into(),
            number,
        }
    }
}

///
/// Field declarations of one input file, keyed by field name.
///
/// INFO and FORMAT live in separate namespaces because VCF allows the same ID in both.
/// The table is built once from the header and only read afterwards.
///
#[derive(Debug, Clone, Default)]
pub struct FieldSpecTable {
    info: FxHashMap<String, FieldSpec>,
    format: FxHashMap<String, FieldSpec>,
}

impl FieldSpecTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_info(&mut self, spec: FieldSpec) {
        self.info.insert(spec.name.clone(), spec);
    }

    pub fn insert_format(&mut self, spec: FieldSpec) {
        self.format.insert(spec.name.clone(), spec);
    }

    /// Builder-style variant of [`FieldSpecTable::insert_info`].
    pub fn with_info<S: Into<String>>(mut self, name: S, number: &str) -> Self {
        self.insert_info(FieldSpec::new(name, NumberKind::from(number)));
        self
    }

    /// Builder-style variant of [`FieldSpecTable::insert_format`].
    pub fn with_format<S: Into<String>>(mut self, name: S, number: &str) -> Self {
        self.insert_format(FieldSpec::new(name, NumberKind::from(number)));
        self
    }

    /// Declared `Number` of an INFO field, [`NumberKind::Unknown`] if undeclared.
    pub fn info_number(&self, name: &str) -> NumberKind {
        self.info
            .get(name)
            .map(|spec| spec.number)
            .unwrap_or(NumberKind::Unknown)
    }

    /// Declared `Number` of a FORMAT field, [`NumberKind::Unknown`] if undeclared.
    ///
    /// `GT` is always a single value regardless of what the header says.
    pub fn format_number(&self, name: &str) -> NumberKind {
        if name == "GT" {
            return NumberKind::Fixed(1);
        }
        self.format
            .get(name)
            .map(|spec| spec.number)
            .unwrap_or(NumberKind::Unknown)
    }

    pub fn len(&self) -> usize {
        self.info.len() + self.format.len()
    }

    pub fn is_empty(&self) -> bool {
        self.info.is_empty() && self.format.is_empty()
    }
}

///
/// Value of one INFO key or one FORMAT key of a sample, kept as VCF text.
///
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum FieldValue {
    /// INFO flag, present without a value.
    Flag,
    Scalar(String),
    Array(Vec<String>),
}

impl FieldValue {
    ///
    /// Parse a raw VCF value; comma-separated values become an array.
    ///
    pub fn parse(raw: &str) -> Self {
        if raw.contains(',') {
            FieldValue::Array(raw.split(',').map(str::to_string).collect())
        } else {
            FieldValue::Scalar(raw.to_string())
        }
    }

    /// The whole value is the VCF missing marker `.`.
    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Scalar(s) if s == ".")
    }

    /// Values as a slice; a scalar is a one-element slice and a flag is empty.
    pub fn as_slice(&self) -> &[String] {
        match self {
            FieldValue::Flag => &[],
            FieldValue::Scalar(s) => std::slice::from_ref(s),
            FieldValue::Array(values) => values,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Flag => Ok(()),
            FieldValue::Scalar(s) => write!(f, "{}", s),
            FieldValue::Array(values) => write!(f, "{}", values.join(",")),
        }
    }
}

///
/// Insertion-ordered field name -> value mapping (INFO column or one sample's FORMAT data).
///
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct FieldMap {
    entries: Vec<(String, FieldValue)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        FieldMap {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Insert a value, replacing (in place) any previous value for the same name.
    pub fn insert<S: Into<String>>(&mut self, name: S, value: FieldValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, FieldValue)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (S, FieldValue)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}

#[cfg(feature = "serde")]
mod serde_impls {
    use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

    use super::{FieldMap, FieldValue};

    // flags serialize as `true`, arrays as JSON arrays of the raw strings
    impl Serialize for FieldValue {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                FieldValue::Flag => serializer.serialize_bool(true),
                FieldValue::Scalar(s) => serializer.serialize_str(s),
                FieldValue::Array(values) => {
                    let mut seq = serializer.serialize_seq(Some(values.len()))?;
                    for value in values {
                        seq.serialize_element(value)?;
                    }
                    seq.end()
                }
            }
        }
    }

    impl Serialize for FieldMap {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(self.len()))?;
            for (key, value) in self.iter() {
                map.serialize_entry(key, value)?;
            }
            map.end()
        }
    }
}
