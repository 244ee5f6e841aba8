/// An ordered collection of command-line options, each a key with an optional
/// value. Setting an existing key overwrites its value in place, so the argument
/// order a caller established is preserved.
///
/// # Example
/// ```rust
/// use alnbench_predict::OptionSet;
///
/// let mut options = OptionSet::new();
/// options.set("-num_iterations", 3);
/// options.set("-db", "uniref50");
/// options.set_flag("-lcase_masking");
/// options.set("-num_iterations", 5);
///
/// assert_eq!(options.value("-num_iterations"), Some("5"));
/// assert_eq!(
///     options.to_args(),
///     vec!["-num_iterations", "5", "-db", "uniref50", "-lcase_masking"]
/// );
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OptionSet {
    options: Vec<(String, Option<String>)>,
}

impl OptionSet {
    pub fn new() -> OptionSet {
        OptionSet::default()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.options.iter().any(|(k, _)| k == key)
    }

    /// The value stored for `key`, if any; flags report `None` just like absent
    /// keys (use [`contains()`](OptionSet::contains) to tell them apart).
    pub fn value(&self, key: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Sets `key` to the display form of `value`, overwriting in place.
    pub fn set(&mut self, key: &str, value: impl ToString) {
        let value = Some(value.to_string());
        match self.options.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.options.push((key.to_string(), value)),
        }
    }

    /// Sets `key` as a bare flag without a value.
    pub fn set_flag(&mut self, key: &str) {
        match self.options.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = None,
            None => self.options.push((key.to_string(), None)),
        }
    }

    /// Removes `key`; returns whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.options.len();
        self.options.retain(|(k, _)| k != key);
        before != self.options.len()
    }

    /// Flattens the options into an argument vector.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.options.len() * 2);
        for (key, value) in &self.options {
            args.push(key.clone());
            if let Some(value) = value {
                args.push(value.clone());
            }
        }
        args
    }
}
