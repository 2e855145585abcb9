//! Attribute validators run during config validation

use crate::types::{AttributePath, Diagnostic, Dynamic};

pub trait Validator: Send + Sync {
    /// Human-readable description, used in documentation and errors
    fn description(&self) -> String;

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>);
}

/// Accepts only one of a fixed set of strings
pub struct OneOf {
    pub allowed: &'static [&'static str],
}

impl OneOf {
    pub fn new(allowed: &'static [&'static str]) -> Self {
        Self { allowed }
    }
}

impl Validator for OneOf {
    fn description(&self) -> String {
        format!("value must be one of: {}", self.allowed.join(", "))
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(s) = value.as_string() {
            if !self.allowed.contains(&s) {
                diagnostics.push(
                    Diagnostic::error(
                        format!("Invalid value for {}", path),
                        format!("Got '{}', {}", s, self.description()),
                    )
                    .with_attribute(path.clone()),
                );
            }
        }
    }
}

pub struct NumberRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumberRange {
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }
}

impl Validator for NumberRange {
    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("value must be between {} and {}", min, max),
            (Some(min), None) => format!("value must be at least {}", min),
            (None, Some(max)) => format!("value must be at most {}", max),
            (None, None) => "any number".to_string(),
        }
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        let Some(n) = value.as_number() else {
            return;
        };
        let too_small = self.min.is_some_and(|min| n < min);
        let too_large = self.max.is_some_and(|max| n > max);
        if too_small || too_large {
            diagnostics.push(
                Diagnostic::error(
                    format!("{} is out of range", path),
                    format!("Got {}, {}", n, self.description()),
                )
                .with_attribute(path.clone()),
            );
        }
    }
}

pub struct ListLength {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl ListLength {
    pub fn at_least(min: usize) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }
}

impl Validator for ListLength {
    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("must have between {} and {} items", min, max),
            (Some(min), None) => format!("must have at least {} items", min),
            (None, Some(max)) => format!("must have at most {} items", max),
            (None, None) => "any length".to_string(),
        }
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        let Some(items) = value.as_list() else {
            return;
        };
        let too_short = self.min.is_some_and(|min| items.len() < min);
        let too_long = self.max.is_some_and(|max| items.len() > max);
        if too_short || too_long {
            diagnostics.push(
                Diagnostic::error(
                    format!("{} {}", path, self.description()),
                    format!("Got {} items", items.len()),
                )
                .with_attribute(path.clone()),
            );
        }
    }
}
