//! Assembly of a configuration split across files.
//!
//! The entry file may list sibling files under `include`. Included files hold sections
//! only and cannot include further files. Each of `[safe]`, `[account]` and `[signers]`
//! comes from exactly one file.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const SECTIONS: [&str; 3] = ["safe", "account", "signers"];

/// Loads `path` and everything it includes into one validated `Config`.
pub(crate) async fn load(path: &Path) -> Result<Config, ConfigError> {
	let mut entry = read_table(path).await?;
	let includes = take_includes(&mut entry)?;

	let mut merged = toml::Table::new();
	let mut sources = HashMap::new();
	merge(&mut merged, &mut sources, entry, path)?;

	if !includes.is_empty() {
		let entry_path = path.canonicalize()?;
		let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

		for include in includes {
			let include_path = base_dir.join(include);
			if include_path.canonicalize()? == entry_path {
				return Err(ConfigError::Validation(format!(
					"{} includes itself",
					path.display()
				)));
			}

			let table = read_table(&include_path).await?;
			if table.contains_key("include") {
				return Err(ConfigError::Validation(format!(
					"{} is included and cannot include other files",
					include_path.display()
				)));
			}
			merge(&mut merged, &mut sources, table, &include_path)?;
		}
	}

	let config: Config = toml::Value::Table(merged).try_into()?;
	config.validate()?;
	Ok(config)
}

async fn read_table(path: &Path) -> Result<toml::Table, ConfigError> {
	let content = tokio::fs::read_to_string(path).await.map_err(|e| {
		ConfigError::Io(std::io::Error::new(
			e.kind(),
			format!("Cannot read {}: {}", path.display(), e),
		))
	})?;
	Ok(toml::from_str(&resolve_env_vars(&content)?)?)
}

/// Removes `include` from `table`, accepting a single path or a list of paths.
fn take_includes(table: &mut toml::Table) -> Result<Vec<PathBuf>, ConfigError> {
	let Some(include) = table.remove("include") else {
		return Ok(Vec::new());
	};

	let paths = match include {
		toml::Value::String(path) => vec![path],
		toml::Value::Array(items) => items
			.into_iter()
			.map(|item| match item {
				toml::Value::String(path) => Ok(path),
				_ => Err(ConfigError::Validation(
					"include must list file paths as strings".into(),
				)),
			})
			.collect::<Result<_, _>>()?,
		_ => {
			return Err(ConfigError::Validation(
				"include must be a path or a list of paths".into(),
			))
		},
	};
	Ok(paths.into_iter().map(PathBuf::from).collect())
}

fn merge(
	merged: &mut toml::Table,
	sources: &mut HashMap<String, PathBuf>,
	table: toml::Table,
	path: &Path,
) -> Result<(), ConfigError> {
	for (section, value) in table {
		if !SECTIONS.contains(&section.as_str()) {
			return Err(ConfigError::Validation(format!(
				"Unknown section '{}' in {}",
				section,
				path.display()
			)));
		}
		if let Some(first) = sources.insert(section.clone(), path.to_path_buf()) {
			return Err(ConfigError::Validation(format!(
				"Duplicate section '{}' found in {} and {}",
				section,
				first.display(),
				path.display()
			)));
		}
		merged.insert(section, value);
	}
	Ok(())
}
