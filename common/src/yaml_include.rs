use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use yaml_rust2::{Yaml, YamlLoader};

const INCLUDE_DIRECTIVE: &str = "!include";

/// Loads a YAML file, resolving `!include <relative path>` lines.
///
/// Included documents are merged first, in order; keys of the including file
/// override them. Nested hashes are merged key by key, everything else is replaced.
pub fn load_yaml_with_includes(path: &Path) -> Result<Yaml, Box<dyn Error>> {
    let merged = process_includes_recursive(&path.to_path_buf())?;
    tracing::debug!(path = %path.display(), "Processed config includes");
    Ok(merged)
}

fn process_includes_recursive(path: &PathBuf) -> Result<Yaml, Box<dyn Error>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;
    let base_path = path.parent().unwrap_or(Path::new(""));

    let (includes, rest): (Vec<&str>, Vec<&str>) = contents
        .lines()
        .partition(|&line| line.trim().starts_with(INCLUDE_DIRECTIVE));

    let mut processed_includes = Vec::with_capacity(includes.len());
    for line in &includes {
        let include_path = line
            .trim()
            .strip_prefix(INCLUDE_DIRECTIVE)
            .unwrap_or_default()
            .trim();
        let full_path = base_path.join(include_path);
        let included = process_includes_recursive(&full_path)
            .map_err(|e| format!("Failed to process include {}: {}", include_path, e))?;
        processed_includes.push(included);
    }

    let rest_yamls = YamlLoader::load_from_str(&rest.join("\n"))?;

    let merged_rest = rest_yamls
        .into_iter()
        .reduce(|acc: Yaml, include: Yaml| merge_yaml(&include, &acc))
        .unwrap_or(Yaml::Hash(Default::default()));

    match processed_includes
        .into_iter()
        .reduce(|acc: Yaml, include: Yaml| merge_yaml(&acc, &include))
    {
        Some(merged_includes) => Ok(merge_yaml(&merged_includes, &merged_rest)),
        None => Ok(merged_rest),
    }
}

fn merge_yaml(base: &Yaml, override_yaml: &Yaml) -> Yaml {
    match (base, override_yaml) {
        (Yaml::Hash(base_hash), Yaml::Hash(override_hash)) => {
            let mut result = base_hash.clone();
            for (key, value) in override_hash {
                match base_hash.get(key) {
                    Some(base_value) => {
                        result.insert(key.clone(), merge_yaml(base_value, value));
                    }
                    None => {
                        result.insert(key.clone(), value.clone());
                    }
                }
            }
            Yaml::Hash(result)
        }
        (_, override_value) => override_value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "fraud_check_yaml_include_{}_{}",
            name,
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn included_values_are_overridden_by_including_file() {
        let dir = scratch_dir("override");
        fs::write(
            dir.join("base.yaml"),
            "analyzer:\n  server_address: \"0.0.0.0:8090\"\n  log_level: info\n",
        )
        .unwrap();
        fs::write(
            dir.join("dev.yaml"),
            "!include base.yaml\nanalyzer:\n  log_level: debug\n",
        )
        .unwrap();

        let merged = load_yaml_with_includes(&dir.join("dev.yaml")).unwrap();
        assert_eq!(merged["analyzer"]["log_level"].as_str(), Some("debug"));
        assert_eq!(
            merged["analyzer"]["server_address"].as_str(),
            Some("0.0.0.0:8090")
        );
    }

    #[test]
    fn missing_include_is_an_error() {
        let dir = scratch_dir("missing");
        fs::write(dir.join("dev.yaml"), "!include nowhere.yaml\n").unwrap();

        let err = load_yaml_with_includes(&dir.join("dev.yaml")).unwrap_err();
        assert!(err.to_string().contains("nowhere.yaml"));
    }
}
