use shared_types::*;
use std::fs;
use std::path::Path;
use ts_rs::TS;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate TypeScript definitions for API types
    let mut types = Vec::new();

    // Contact types
    types.push(clean_type(Contact::export_to_string()?));
    types.push(clean_type(ContactStatus::export_to_string()?));
    types.push(clean_type(UpdateContactRequest::export_to_string()?));
    types.push(clean_type(BulkUpdateContactsRequest::export_to_string()?));
    types.push(clean_type(BulkUpdateContactsResponse::export_to_string()?));
    types.push(clean_type(ContactsResponse::export_to_string()?));

    // Agent types
    types.push(clean_type(Agent::export_to_string()?));
    types.push(clean_type(AgentStatus::export_to_string()?));
    types.push(clean_type(CreateAgentRequest::export_to_string()?));
    types.push(clean_type(UpdateAgentRequest::export_to_string()?));
    types.push(clean_type(AgentsResponse::export_to_string()?));
    types.push(clean_type(AgentDistribution::export_to_string()?));
    types.push(clean_type(DistributionResponse::export_to_string()?));

    // Upload and distribution types
    types.push(clean_type(UploadAttempt::export_to_string()?));
    types.push(clean_type(UploadStatus::export_to_string()?));
    types.push(clean_type(RowRejection::export_to_string()?));
    types.push(clean_type(AgentShare::export_to_string()?));
    types.push(clean_type(DistributionSummary::export_to_string()?));
    types.push(clean_type(UploadResponse::export_to_string()?));
    types.push(clean_type(RedistributeResponse::export_to_string()?));
    types.push(clean_type(UploadHistoryResponse::export_to_string()?));

    // Dashboard types
    types.push(clean_type(AgentTotals::export_to_string()?));
    types.push(clean_type(ContactTotals::export_to_string()?));
    types.push(clean_type(DashboardStats::export_to_string()?));

    let output_dir = Path::new("../web/src/api-types");
    fs::create_dir_all(output_dir)?;

    let output_path = output_dir.join("types.ts");
    let output = types.join("\n\n");

    fs::write(&output_path, output)?;
    println!("Generated TypeScript types in {}", output_path.display());

    Ok(())
}

fn clean_type(mut type_def: String) -> String {
    type_def.retain(|c| c != '\r');

    // Every type lands in one file, so cross-type imports (Contact importing
    // ContactStatus) would point at modules that are never written.
    let filtered: Vec<&str> = type_def
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("import type")
                && !trimmed.starts_with("// This file was generated")
                && !trimmed.starts_with("/* This file was generated")
        })
        .collect();

    let result = filtered.join("\n").trim().to_string();
    if result.is_empty() {
        result
    } else {
        format!("{}\n", result)
    }
}
