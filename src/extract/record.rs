//! Record type: an ordered field-name to value mapping for one listing

/// Field that names the listing; always the first field of a record
pub const IDENTIFIER_FIELD: &str = "identifier";

/// Field holding the listing title, pinned after the identifier in the schema
pub const TITLE_FIELD: &str = "title";

/// The fields describing one listing, in insertion order
///
/// Names are unique. Re-inserting a name keeps its position and replaces the
/// value. The identifier field cannot be overwritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// Creates a record holding only the identifier
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            fields: vec![(IDENTIFIER_FIELD.to_string(), identifier.into())],
        }
    }

    /// Returns the listing identifier
    pub fn identifier(&self) -> &str {
        &self.fields[0].1
    }

    /// Inserts a field, replacing the value of an existing one
    ///
    /// Returns false if the name is the reserved identifier field.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if name == IDENTIFIER_FIELD {
            return false;
        }

        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
        true
    }

    /// Returns the value of a field
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over field names in order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Number of fields, including the identifier
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if the record carries nothing beyond its identifier
    pub fn is_bare(&self) -> bool {
        self.fields.len() == 1
    }

    /// Rebuilds the record so its fields follow `schema` exactly
    ///
    /// Fields missing from the record get an empty value; fields not in the
    /// schema are dropped.
    pub(crate) fn conform(self, schema: &[String]) -> Self {
        let mut source = self.fields;
        let fields = schema
            .iter()
            .map(|name| {
                let value = source
                    .iter_mut()
                    .find(|(n, _)| n == name)
                    .map(|(_, v)| std::mem::take(v))
                    .unwrap_or_default();
                (name.clone(), value)
            })
            .collect();
        Self { fields }
    }
}
