// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Emission summaries: generated-output dump and address-map rendering.

use std::io::Write;

/// Format an address at the narrowest conventional width.
pub fn format_addr(addr: u64) -> String {
    if addr <= 0xFFFF {
        format!("{addr:04X}")
    } else if addr <= 0xFF_FFFF {
        format!("{addr:06X}")
    } else {
        format!("{addr:08X}")
    }
}

/// Format bytes as a spaced hex string.
pub fn format_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Dump the binary channel as address-prefixed hex rows, 16 bytes per row.
pub fn write_generated_output(
    out: &mut dyn Write,
    base: u64,
    binary: &[u8],
) -> std::io::Result<()> {
    writeln!(out, "\nGENERATED OUTPUT\n")?;
    if binary.is_empty() {
        writeln!(out, "(none)")?;
        return Ok(());
    }
    writeln!(out, "ADDR    BYTES")?;
    writeln!(out, "------  -----------------------")?;
    for (row, chunk) in binary.chunks(16).enumerate() {
        writeln!(
            out,
            "{}    {}",
            format_addr(base + row as u64 * 16),
            format_bytes(chunk)
        )?;
    }
    Ok(())
}

/// Serialize the element address map as JSON for downstream symbol/debug
/// resolution.
pub fn write_address_map_json(
    out: &mut dyn Write,
    map: &[(usize, u64)],
) -> std::io::Result<()> {
    let entries: Vec<serde_json::Value> = map
        .iter()
        .map(|(index, addr)| {
            serde_json::json!({
                "element": index,
                "address": addr,
            })
        })
        .collect();
    writeln!(out, "{}", serde_json::Value::Array(entries))
}
