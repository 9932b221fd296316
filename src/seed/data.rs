use crate::store::memory::{MeasureDefinitionSeed, MemoryModel, MemoryModelServer, MemoryTable};
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;

/// Helper to build a measure seed
fn measure(name: &str, expression: &str) -> MeasureDefinitionSeed {
    MeasureDefinitionSeed {
        name: name.to_string(),
        expression: expression.to_string(),
    }
}

/// Sample sales model served when LOAD_SEED_DATA=true
pub fn sample_models() -> Vec<MemoryModel> {
    vec![MemoryModel {
        name: "Contoso".to_string(),
        version: 1,
        last_update: Utc::now(),
        tables: vec![
            MemoryTable {
                name: "Sales".to_string(),
                measures: vec![
                    measure("Sales Amount", "SUMX(Sales, Sales[Quantity] * Sales[Net Price])"),
                    measure("Total Cost", "SUMX(Sales, Sales[Quantity] * Sales[Unit Cost])"),
                    measure("Margin", "[Sales Amount] - [Total Cost]"),
                    measure("Margin %", "DIVIDE([Margin], [Sales Amount])"),
                ],
            },
            MemoryTable {
                name: "Customer".to_string(),
                measures: vec![measure("Customers", "DISTINCTCOUNT(Sales[CustomerKey])")],
            },
        ],
    }]
}

/// Read a JSON array of models
pub fn load_models_from_file(path: impl AsRef<Path>) -> Result<Vec<MemoryModel>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read model file {}", path.display()))?;
    let models: Vec<MemoryModel> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse model file {}", path.display()))?;
    Ok(models)
}

pub fn load_seed_data(server: &MemoryModelServer) {
    for model in sample_models() {
        log::info!("Seeding model '{}'", model.name);
        server.add_model(model);
    }
}
