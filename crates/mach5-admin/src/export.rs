//! `export-components`: dump frame system components for the web app.

use std::fs;
use std::path::{Path, PathBuf};

use futures_util::TryStreamExt;
use miette::Result;
use mongodb::Database;
use mongodb::bson::{Bson, Document, doc};

const COMPONENT_COLLECTION: &str = "frame_system_component";

/// `~/Documents/Five/mach5-web/components/ComponentMenu/frame_system_components.json`
pub fn default_output_path() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| miette::miette!("could not determine home directory"))?;
    Ok(home
        .join("Documents")
        .join("Five")
        .join("mach5-web")
        .join("components")
        .join("ComponentMenu")
        .join("frame_system_components.json"))
}

/// Export every component to `output`; returns how many were written.
pub async fn run(db: &Database, output: &Path) -> Result<usize> {
    let components: Vec<Document> = db
        .collection::<Document>(COMPONENT_COLLECTION)
        .find(doc! {})
        .await
        .map_err(|e| miette::miette!("{}", e))?
        .try_collect()
        .await
        .map_err(|e| miette::miette!("{}", e))?;

    let count = components.len();
    write_components(output, components)?;

    println!(
        "Successfully exported {} frame system components to {}",
        count,
        output.display()
    );
    Ok(count)
}

/// Documents as relaxed extended JSON, so ObjectIds and dates survive.
fn components_to_json(components: Vec<Document>) -> serde_json::Value {
    serde_json::Value::Array(
        components
            .into_iter()
            .map(|d| Bson::Document(d).into_relaxed_extjson())
            .collect(),
    )
}

fn write_components(output: &Path, components: Vec<Document>) -> Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| miette::miette!("failed to create {}: {}", parent.display(), e))?;
    }

    let json = serde_json::to_string_pretty(&components_to_json(components))
        .map_err(|e| miette::miette!("{}", e))?;
    fs::write(output, json)
        .map_err(|e| miette::miette!("failed to write {}: {}", output.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_object_ids_become_extended_json() {
        let id = ObjectId::parse_str("65a1f0c2e4b0a1b2c3d4e5f6").unwrap();
        let value = components_to_json(vec![doc! { "_id": id, "name": "rail", "depth": 12 }]);

        assert_eq!(
            value,
            json!([{ "_id": { "$oid": "65a1f0c2e4b0a1b2c3d4e5f6" }, "name": "rail", "depth": 12 }])
        );
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("components").join("ComponentMenu").join("out.json");

        write_components(&output, vec![doc! { "name": "post" }]).unwrap();

        let text = fs::read_to_string(&output).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, json!([{ "name": "post" }]));
    }

    #[test]
    fn test_default_output_path_shape() {
        if let Ok(path) = default_output_path() {
            assert!(
                path.ends_with("mach5-web/components/ComponentMenu/frame_system_components.json")
            );
        }
    }
}
