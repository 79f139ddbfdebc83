//! Per-unit compilation context
//!
//! Float and string literals cannot be encoded as instruction immediates, so
//! the lexer interns each one into a pool here and the code generator
//! refers to them by label. One context exists per compilation unit. It is
//! filled while scanning and only read once code generation starts.

use log::trace;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct CompilationContext {
    floats: Vec<(f64, String)>,
    float_index: HashMap<u64, usize>,
    strings: Vec<(String, String)>,
    string_index: HashMap<String, usize>,
}

impl CompilationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pool a float constant, returning its label. Identical bit patterns share a label.
    pub fn intern_float(&mut self, value: f64) -> String {
        if let Some(&i) = self.float_index.get(&value.to_bits()) {
            return self.floats[i].1.clone();
        }
        let label = format!(".LF{}", self.floats.len());
        trace!("pooling float {value:?} as {label}");
        self.float_index.insert(value.to_bits(), self.floats.len());
        self.floats.push((value, label.clone()));
        label
    }

    /// Pool a string constant, returning its label.
    pub fn intern_string(&mut self, value: &str) -> String {
        if let Some(&i) = self.string_index.get(value) {
            return self.strings[i].1.clone();
        }
        let label = format!(".LS{}", self.strings.len());
        trace!("pooling string {value:?} as {label}");
        self.string_index.insert(value.to_string(), self.strings.len());
        self.strings.push((value.to_string(), label.clone()));
        label
    }

    pub fn float_label(&self, value: f64) -> Option<&str> {
        self.float_index
            .get(&value.to_bits())
            .map(|&i| self.floats[i].1.as_str())
    }

    pub fn string_label(&self, value: &str) -> Option<&str> {
        self.string_index
            .get(value)
            .map(|&i| self.strings[i].1.as_str())
    }

    /// Pooled floats in first-seen order
    pub fn floats(&self) -> impl Iterator<Item = (f64, &str)> {
        self.floats.iter().map(|(v, l)| (*v, l.as_str()))
    }

    /// Pooled strings in first-seen order
    pub fn strings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.strings.iter().map(|(v, l)| (v.as_str(), l.as_str()))
    }
}
