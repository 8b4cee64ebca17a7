//! `docuchunk collections ...` commands.

use anyhow::{bail, Result};
use docuchunk_core::store::VectorStore;

pub async fn list(store: &dyn VectorStore, json: bool) -> Result<()> {
    let names = store.list_collections().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&names)?);
        return Ok(());
    }
    if names.is_empty() {
        println!("No collections.");
    }
    for name in names {
        println!("{}", name);
    }
    Ok(())
}

pub async fn info(store: &dyn VectorStore, name: &str, json: bool) -> Result<()> {
    let Some(info) = store.get_collection_info(name).await? else {
        bail!("Collection not found: {}", name);
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }
    println!("collection {}", info.name);
    println!("  status: {}", info.status);
    println!("  points: {}", info.points_count);
    println!("  vectors: {}", info.vectors_count);
    println!("  indexed vectors: {}", info.indexed_vectors_count);
    Ok(())
}

/// Delete a collection. Missing collections are reported, not treated as success.
pub async fn delete(store: &dyn VectorStore, name: &str) -> Result<()> {
    if store.get_collection_info(name).await?.is_none() {
        bail!("Collection not found: {}", name);
    }
    store.delete_collection(name).await?;
    tracing::info!(collection = name, "collection deleted");
    println!("deleted {}", name);
    Ok(())
}
