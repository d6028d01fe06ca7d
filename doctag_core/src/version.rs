use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::DoctagError;

/// Tag keys whose values are compared as versions under the `ifLower`
/// overwrite policy.
pub const VERSION_TAGS: &[&str] = &["version", "since"];

pub fn is_version_tag(key: &str) -> bool {
	VERSION_TAGS.contains(&key)
}

/// A dotted version identifier such as `1.2.0`, `v2` or `3.1-SNAPSHOT`.
///
/// Trailing zero components are insignificant (`1.0` equals `1.0.0`). A
/// version with a qualifier sorts before the same version without one, and
/// qualifiers compare lexically.
#[derive(Debug, Clone)]
pub struct Version {
	components: Vec<u64>,
	qualifier: Option<String>,
}

impl Version {
	pub fn components(&self) -> &[u64] {
		&self.components
	}

	pub fn qualifier(&self) -> Option<&str> {
		self.qualifier.as_deref()
	}
}

impl FromStr for Version {
	type Err = DoctagError;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		let error = |reason: &str| {
			DoctagError::VersionParse {
				value: value.to_string(),
				reason: reason.to_string(),
			}
		};

		let trimmed = value.trim();
		let trimmed = trimmed
			.strip_prefix('v')
			.or_else(|| trimmed.strip_prefix('V'))
			.unwrap_or(trimmed);

		if trimmed.is_empty() {
			return Err(error("empty version"));
		}

		let (numbers, qualifier) = match trimmed.split_once('-') {
			Some((numbers, qualifier)) => {
				if qualifier.is_empty() {
					return Err(error("empty qualifier after `-`"));
				}
				(numbers, Some(qualifier.to_string()))
			}
			None => (trimmed, None),
		};

		let mut components = Vec::new();
		for part in numbers.split('.') {
			if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
				return Err(error("components must be non-empty numbers separated by `.`"));
			}
			let number = part
				.parse::<u64>()
				.map_err(|_| error("component is too large"))?;
			components.push(number);
		}

		Ok(Self {
			components,
			qualifier,
		})
	}
}

impl Ord for Version {
	fn cmp(&self, other: &Self) -> Ordering {
		let len = self.components.len().max(other.components.len());
		for index in 0..len {
			let left = self.components.get(index).copied().unwrap_or(0);
			let right = other.components.get(index).copied().unwrap_or(0);
			match left.cmp(&right) {
				Ordering::Equal => {}
				ordering => return ordering,
			}
		}

		match (&self.qualifier, &other.qualifier) {
			(None, None) => Ordering::Equal,
			(None, Some(_)) => Ordering::Greater,
			(Some(_), None) => Ordering::Less,
			(Some(left), Some(right)) => left.cmp(right),
		}
	}
}

impl PartialOrd for Version {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl PartialEq for Version {
	fn eq(&self, other: &Self) -> bool {
		self.cmp(other) == Ordering::Equal
	}
}

impl Eq for Version {}

impl fmt::Display for Version {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let numbers: Vec<String> = self.components.iter().map(ToString::to_string).collect();
		f.write_str(&numbers.join("."))?;
		if let Some(qualifier) = &self.qualifier {
			write!(f, "-{qualifier}")?;
		}
		Ok(())
	}
}
