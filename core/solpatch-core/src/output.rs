//! Streaming report output

use std::io::Write;

use anyhow::Result;

use crate::patch::FilePatch;

/// Write patch reports as a prettified JSON array.
pub fn write_json_pretty(patches: &[FilePatch], mut w: impl Write) -> Result<()> {
    let json = serde_json::to_string_pretty(patches)?;
    w.write_all(json.as_bytes())?;
    w.write_all(b"\n")?;
    Ok(())
}

/// Write patch reports as newline-delimited JSON (NDJSON).
pub fn write_ndjson(patches: &[FilePatch], mut w: impl Write) -> Result<()> {
    for item in patches {
        let line = serde_json::to_string(item)?;
        w.write_all(line.as_bytes())?;
        w.write_all(b"\n")?;
    }
    Ok(())
}
