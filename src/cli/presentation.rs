//! CLI presentation: turn resolver output into text or JSON.

use crate::dispatch::{DispatchTable, FieldResponse};
use crate::error::ApiError;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;

pub fn format_response(response: &FieldResponse) -> Result<String, ApiError> {
    serde_json::to_string_pretty(response)
        .map_err(|e| ApiError::InvalidInput(format!("Failed to render response: {}", e)))
}

fn step_chain(pipeline: &crate::pipeline::Pipeline) -> String {
    pipeline
        .steps()
        .iter()
        .map(|step| format!("{} ({})", step.id, step.data_source))
        .collect::<Vec<_>>()
        .join(" → ")
}

pub fn format_fields_text(table: &DispatchTable) -> String {
    let mut out = Table::new();
    out.load_preset(UTF8_FULL);
    out.set_header(vec!["Type", "Field", "Steps", "Chain"]);
    for (field, pipeline) in table.fields() {
        out.add_row(vec![
            field.type_name.clone(),
            field.field_name.clone(),
            pipeline.steps().len().to_string(),
            step_chain(pipeline),
        ]);
    }
    out.to_string()
}

pub fn format_fields_json(table: &DispatchTable) -> Result<String, ApiError> {
    let rows: Vec<serde_json::Value> = table
        .fields()
        .map(|(field, pipeline)| {
            serde_json::json!({
                "typeName": field.type_name,
                "fieldName": field.field_name,
                "steps": pipeline
                    .steps()
                    .iter()
                    .map(|s| serde_json::json!({"id": s.id, "dataSource": s.data_source}))
                    .collect::<Vec<_>>(),
            })
        })
        .collect();
    serde_json::to_string_pretty(&rows)
        .map_err(|e| ApiError::InvalidInput(format!("Failed to render fields: {}", e)))
}
