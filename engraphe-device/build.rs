//! Build script for engraphe-device
//!
//! Validates device.toml at compile time so an image cannot be built
//! from a structurally broken manifest. Placeholder (`***`) credentials
//! pass these checks; run-time validation rejects them until filled in.

use std::fs;
use std::path::Path;

fn main() {
    validate_manifest();
}

/// Validate device.toml at compile time
fn validate_manifest() {
    // Re-run if device.toml changes
    println!("cargo:rerun-if-changed=device.toml");
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_path = Path::new("device.toml");

    // Check if the manifest exists
    if !manifest_path.exists() {
        panic!(
            "\n\
            ╔════════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: device.toml not found!                                     ║\n\
            ║                                                                    ║\n\
            ║  The image requires a device.toml enrollment manifest.             ║\n\
            ║  Please create one in the engraphe-device directory.               ║\n\
            ║  Start from the placeholder manifest in the repository.            ║\n\
            ╚════════════════════════════════════════════════════════════════════╝\n"
        );
    }

    // Read the manifest
    let manifest_content = match fs::read_to_string(manifest_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔════════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read device.toml                                 ║\n\
                ║                                                                    ║\n\
                ║  Error: {:<58} ║\n\
                ╚════════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    // Parse and validate TOML syntax
    let manifest: toml::Value = match toml::from_str(&manifest_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔════════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in device.toml                         ║\n\
                ╠════════════════════════════════════════════════════════════════════╣\n\
                ║                                                                    ║\n\
                {}\n\
                ║                                                                    ║\n\
                ╚════════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    // Validate required sections exist
    validate_required_sections(&manifest);

    // Validate section contents
    validate_wifi(&manifest);
    validate_provisioning(&manifest);
    validate_devices(&manifest);

    println!("cargo:warning=device.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 65 {
                format!("{}...", &line[..62])
            } else {
                line.to_string()
            };
            format!("║  {:<65} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Panic with a box-drawing error report
fn fail(title: &str, errors: &[String]) -> ! {
    panic!(
        "\n\
        ╔════════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<58} ║\n\
        ╠════════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚════════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<63} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Validate that required sections exist
fn validate_required_sections(manifest: &toml::Value) {
    let mut errors = Vec::new();

    if manifest.get("wifi").is_none() {
        errors.push("Missing [wifi] section".to_string());
    }
    if manifest.get("provisioning").is_none() {
        errors.push("Missing [provisioning] section".to_string());
    }
    if manifest.get("device").is_none() {
        errors.push("Missing [device] or [device.<id>] section".to_string());
    }

    if !errors.is_empty() {
        fail("Missing required sections in device.toml", &errors);
    }
}

/// Validate the [wifi] section
fn validate_wifi(manifest: &toml::Value) {
    let wifi = match manifest.get("wifi") {
        Some(toml::Value::Table(t)) => t,
        _ => return,
    };

    let mut errors = Vec::new();

    for key in ["ssid", "password"] {
        match wifi.get(key) {
            Some(toml::Value::String(s)) if !s.is_empty() => {}
            Some(toml::Value::String(_)) => errors.push(format!("[wifi] '{}' is empty", key)),
            Some(_) => errors.push(format!("[wifi] '{}' must be a string", key)),
            None => errors.push(format!("[wifi] missing '{}'", key)),
        }
    }

    if !errors.is_empty() {
        fail("Invalid wifi configuration", &errors);
    }
}

/// Validate the [provisioning] section
fn validate_provisioning(manifest: &toml::Value) {
    let provisioning = match manifest.get("provisioning") {
        Some(toml::Value::Table(t)) => t,
        _ => return,
    };

    let mut errors = Vec::new();

    match provisioning.get("id_scope") {
        Some(toml::Value::String(s)) if !s.is_empty() => {}
        Some(toml::Value::String(_)) => {
            errors.push("[provisioning] 'id_scope' is empty".to_string())
        }
        Some(_) => errors.push("[provisioning] 'id_scope' must be a string".to_string()),
        None => errors.push("[provisioning] missing 'id_scope'".to_string()),
    }

    // The endpoint is optional and defaults to the public service
    match provisioning.get("endpoint") {
        None | Some(toml::Value::String(_)) => {}
        Some(_) => errors.push("[provisioning] 'endpoint' must be a string".to_string()),
    }
    if let Some(toml::Value::String(s)) = provisioning.get("endpoint") {
        if s.is_empty() {
            errors.push("[provisioning] 'endpoint' is empty".to_string());
        }
    }

    if !errors.is_empty() {
        fail("Invalid provisioning configuration", &errors);
    }
}

/// Validate the [device] section or the [device.<id>] sections
fn validate_devices(manifest: &toml::Value) {
    let device = match manifest.get("device") {
        Some(toml::Value::Table(t)) => t,
        _ => return,
    };

    let mut errors = Vec::new();

    // [device.<id>] subtables make a fleet manifest; plain keys make a
    // single-device image
    let fleet = device.values().any(|value| value.as_table().is_some());

    if !fleet {
        match device.get("registration_id") {
            Some(toml::Value::String(id)) => check_registration_id(id, "[device]", &mut errors),
            Some(_) => errors.push("[device] 'registration_id' must be a string".to_string()),
            None => errors.push("[device] missing 'registration_id'".to_string()),
        }
        check_token_entry(device, "[device]", &mut errors);
    } else {
        let mut seen_ids: Vec<String> = Vec::new();
        let mut seen_tokens: Vec<&str> = Vec::new();

        for (name, value) in device {
            let table = match value {
                toml::Value::Table(t) => t,
                _ => {
                    errors.push(format!(
                        "[device] cannot mix '{}' with [device.<id>] sections",
                        name
                    ));
                    continue;
                }
            };

            let context = format!("[device.{}]", name);
            check_registration_id(name, &context, &mut errors);

            // Registration IDs collide case-insensitively
            let lowered = name.to_ascii_lowercase();
            if seen_ids.contains(&lowered) {
                errors.push(format!("{} duplicate registration ID", context));
            }
            seen_ids.push(lowered);

            check_token_entry(table, &context, &mut errors);

            // Each device carries its own token; placeholders are exempt
            // so a fresh fleet manifest still builds
            if let Some(toml::Value::String(token)) = table.get("sas_token") {
                if !token.contains("***") {
                    if seen_tokens.contains(&token.as_str()) {
                        errors.push(format!("{} duplicate SAS token", context));
                    }
                    seen_tokens.push(token.as_str());
                }
            }
        }
    }

    if !errors.is_empty() {
        fail("Invalid device configuration", &errors);
    }
}

/// Registration ID rules: lowercase alphanumerics plus `- . _ :` with
/// an alphanumeric or `-` last character
fn check_registration_id(id: &str, context: &str, errors: &mut Vec<String>) {
    if id.is_empty() {
        errors.push(format!("{} registration ID is empty", context));
        return;
    }
    if id.len() > 128 {
        errors.push(format!("{} registration ID exceeds 128 characters", context));
    }
    let charset_ok = id.bytes().all(|b| {
        b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'-' | b'.' | b'_' | b':')
    });
    if !charset_ok {
        errors.push(format!(
            "{} registration ID allows lowercase letters, digits and - . _ :",
            context
        ));
    }
    match id.as_bytes().last() {
        Some(&last) if last.is_ascii_lowercase() || last.is_ascii_digit() || last == b'-' => {}
        _ => errors.push(format!(
            "{} registration ID must end with a letter, digit or -",
            context
        )),
    }
}

/// Check a sas_token entry for the expected grammar shape
fn check_token_entry(table: &toml::Table, context: &str, errors: &mut Vec<String>) {
    let token = match table.get("sas_token") {
        Some(toml::Value::String(s)) => s,
        Some(_) => {
            errors.push(format!("{} 'sas_token' must be a string", context));
            return;
        }
        None => {
            errors.push(format!("{} missing 'sas_token'", context));
            return;
        }
    };

    if !token.starts_with("SharedAccessSignature ") {
        errors.push(format!(
            "{} sas_token must start with 'SharedAccessSignature '",
            context
        ));
    }
    for param in ["sr=", "sig=", "se="] {
        if !token.contains(param) {
            errors.push(format!(
                "{} sas_token missing '{}' parameter",
                context, param
            ));
        }
    }
}
