use crate::types::{AttributePath, Diagnostics, Dynamic};

/// Diagnostic summary for values the attribute's validators reject
pub const INVALID_VALUE_SUMMARY: &str = "Invalid attribute value";

/// Validates a configured value; only called for values that are set
pub trait Validator: Send + Sync {
    fn description(&self) -> String;
    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics);
}

pub struct StringLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Validator for StringLengthValidator {
    fn description(&self) -> String {
        format!("string length between {:?} and {:?}", self.min, self.max)
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        if let Some(s) = value.as_string() {
            if let Some(min) = self.min {
                if s.len() < min {
                    diagnostics.add_attribute_error(
                        path.clone(),
                        INVALID_VALUE_SUMMARY,
                        format!("{} must have minimum length of {}, got {}", path, min, s.len()),
                    );
                }
            }
            if let Some(max) = self.max {
                if s.len() > max {
                    diagnostics.add_attribute_error(
                        path.clone(),
                        INVALID_VALUE_SUMMARY,
                        format!("{} must have maximum length of {}, got {}", path, max, s.len()),
                    );
                }
            }
        }
    }
}

/// Value must be one of a fixed set of strings (API enums)
pub struct OneOfValidator {
    pub values: Vec<String>,
}

impl OneOfValidator {
    pub fn create(values: &[&str]) -> Box<dyn Validator> {
        Box::new(Self {
            values: values.iter().map(|v| v.to_string()).collect(),
        })
    }
}

impl Validator for OneOfValidator {
    fn description(&self) -> String {
        format!("one of {}", self.values.join(", "))
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        if let Some(s) = value.as_string() {
            if !self.values.iter().any(|v| v == s) {
                diagnostics.add_attribute_error(
                    path.clone(),
                    INVALID_VALUE_SUMMARY,
                    format!(
                        "{} must be one of [{}], got \"{}\"",
                        path,
                        self.values.join(", "),
                        s
                    ),
                );
            }
        }
    }
}

pub struct NumberRangeValidator {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Validator for NumberRangeValidator {
    fn description(&self) -> String {
        format!("number between {:?} and {:?}", self.min, self.max)
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        if let Some(n) = value.as_number() {
            if let Some(min) = self.min {
                if n < min {
                    diagnostics.add_attribute_error(
                        path.clone(),
                        INVALID_VALUE_SUMMARY,
                        format!("{} must be at least {}, got {}", path, min, n),
                    );
                }
            }
            if let Some(max) = self.max {
                if n > max {
                    diagnostics.add_attribute_error(
                        path.clone(),
                        INVALID_VALUE_SUMMARY,
                        format!("{} must be at most {}, got {}", path, max, n),
                    );
                }
            }
        }
    }
}

pub struct ListLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Validator for ListLengthValidator {
    fn description(&self) -> String {
        format!("list length between {:?} and {:?}", self.min, self.max)
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Diagnostics) {
        if let Dynamic::List(items) = value {
            if let Some(min) = self.min {
                if items.len() < min {
                    diagnostics.add_attribute_error(
                        path.clone(),
                        INVALID_VALUE_SUMMARY,
                        format!("{} must have at least {} items, got {}", path, min, items.len()),
                    );
                }
            }
            if let Some(max) = self.max {
                if items.len() > max {
                    diagnostics.add_attribute_error(
                        path.clone(),
                        INVALID_VALUE_SUMMARY,
                        format!("{} must have at most {} items, got {}", path, max, items.len()),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> AttributePath {
        AttributePath::new("attr")
    }

    #[test]
    fn string_length_validator_accepts_valid_length() {
        let validator = StringLengthValidator {
            min: Some(3),
            max: Some(10),
        };
        let mut diags = Diagnostics::new();
        validator.validate(&Dynamic::string("hello"), &path(), &mut diags);
        assert!(!diags.has_errors());
    }

    #[test]
    fn string_length_validator_rejects_short_and_long() {
        let validator = StringLengthValidator {
            min: Some(3),
            max: Some(5),
        };
        let mut diags = Diagnostics::new();
        validator.validate(&Dynamic::string("hi"), &path(), &mut diags);
        validator.validate(&Dynamic::string("too long"), &path(), &mut diags);
        assert_eq!(diags.errors.len(), 2);
        assert_eq!(diags.errors[0].attribute, Some(path()));
    }

    #[test]
    fn one_of_validator() {
        let validator = OneOfValidator::create(&["HOURS", "MINUTES"]);
        let mut diags = Diagnostics::new();
        validator.validate(&Dynamic::string("HOURS"), &path(), &mut diags);
        assert!(!diags.has_errors());

        validator.validate(&Dynamic::string("DAYS"), &path(), &mut diags);
        assert_eq!(diags.errors.len(), 1);
        assert!(diags.errors[0].detail.contains("DAYS"));
    }

    #[test]
    fn number_range_validator() {
        let validator = NumberRangeValidator {
            min: Some(-1.0),
            max: Some(100.0),
        };
        let mut diags = Diagnostics::new();
        validator.validate(&Dynamic::Number(-1.0), &path(), &mut diags);
        assert!(!diags.has_errors());
        validator.validate(&Dynamic::Number(101.0), &path(), &mut diags);
        assert!(diags.has_errors());
    }

    #[test]
    fn list_length_validator() {
        let validator = ListLengthValidator {
            min: Some(1),
            max: None,
        };
        let mut diags = Diagnostics::new();
        validator.validate(&Dynamic::List(vec![]), &path(), &mut diags);
        assert!(diags.has_errors());
    }

    #[test]
    fn validators_ignore_other_types() {
        let validator = StringLengthValidator {
            min: Some(3),
            max: None,
        };
        let mut diags = Diagnostics::new();
        validator.validate(&Dynamic::Number(1.0), &path(), &mut diags);
        assert!(diags.is_empty());
    }
}
