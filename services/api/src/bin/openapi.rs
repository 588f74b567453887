//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI document of the medication tracker API to disk, so the
//! UI can generate its client without a running server.
//!
//! Usage: `openapi [OUTPUT]` (defaults to `openapi.json`).

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "openapi.json".to_string());

    let spec_json = ApiDoc::openapi().to_pretty_json()?;
    std::fs::write(&path, spec_json)?;
    println!("OpenAPI document for the medication tracker written to {}", path);
    Ok(())
}
