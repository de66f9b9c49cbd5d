//! Validation of backend configuration tables.
//!
//! Each store backend is configured by a free-form TOML table. Backends
//! describe the fields they accept with a [`Schema`] and validate their table
//! before they are built.

use thiserror::Error;

/// Errors that can occur while validating a configuration table.
#[derive(Debug, Error)]
pub enum ValidationError {
	#[error("Missing required field: {0}")]
	MissingField(String),
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
	#[error("Unknown field: {0}")]
	UnknownField(String),
}

/// Expected type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	String,
	/// An integer with optional inclusive bounds.
	Integer {
		min: Option<i64>,
		max: Option<i64>,
	},
	Boolean,
	/// An array whose elements all have the inner type.
	Array(Box<FieldType>),
}

impl FieldType {
	fn name(&self) -> &'static str {
		match self {
			FieldType::String => "string",
			FieldType::Integer { .. } => "integer",
			FieldType::Boolean => "boolean",
			FieldType::Array(_) => "array",
		}
	}

	fn check(&self, field: &str, value: &toml::Value) -> Result<(), ValidationError> {
		let mismatch = || ValidationError::TypeMismatch {
			field: field.to_string(),
			expected: self.name().to_string(),
			actual: value.type_str().to_string(),
		};

		match self {
			FieldType::String => value.as_str().map(|_| ()).ok_or_else(mismatch),
			FieldType::Boolean => value.as_bool().map(|_| ()).ok_or_else(mismatch),
			FieldType::Integer { min, max } => {
				let int = value.as_integer().ok_or_else(mismatch)?;
				if min.is_some_and(|min| int < min) || max.is_some_and(|max| int > max) {
					return Err(ValidationError::InvalidValue {
						field: field.to_string(),
						message: format!("{} is outside [{:?}, {:?}]", int, min, max),
					});
				}
				Ok(())
			},
			FieldType::Array(inner) => {
				let items = value.as_array().ok_or_else(mismatch)?;
				for (i, item) in items.iter().enumerate() {
					inner.check(&format!("{}[{}]", field, i), item)?;
				}
				Ok(())
			},
		}
	}
}

/// Custom check run after a field's type has been validated.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A named field in a [`Schema`].
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Attaches a custom check, run only when the field is present and well-typed.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn validate(&self, value: &toml::Value) -> Result<(), ValidationError> {
		self.field_type.check(&self.name, value)?;
		if let Some(validator) = &self.validator {
			validator(value).map_err(|message| ValidationError::InvalidValue {
				field: self.name.clone(),
				message,
			})?;
		}
		Ok(())
	}
}

/// The set of fields a configuration table may contain.
///
/// Fields not listed as required or optional are rejected, so typos in a
/// backend section surface at startup instead of being silently ignored.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table".to_string(),
				actual: config.type_str().to_string(),
			})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			field.validate(value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				field.validate(value)?;
			}
		}

		for key in table.keys() {
			let known = self
				.required
				.iter()
				.chain(&self.optional)
				.any(|field| &field.name == key);
			if !known {
				return Err(ValidationError::UnknownField(key.clone()));
			}
		}

		Ok(())
	}
}

/// A schema a backend uses to validate its own configuration table.
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}
