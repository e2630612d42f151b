//! Build script for divert-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates machine.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use divert_core::config::schema::{self, KeySpec};

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate machine.toml configuration at compile time
fn validate_config() {
    // Re-run if machine.toml changes
    println!("cargo:rerun-if-changed=machine.toml");

    let config_path = Path::new("machine.toml");

    // Check if config file exists
    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: machine.toml not found!                                  ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds machine.toml from the divert-firmware       ║\n\
            ║  directory. Restore it or create one with the sorter sections.  ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    // Read the config file
    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read machine.toml                              ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    // Parse and validate TOML syntax
    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in machine.toml                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_sections(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid machine.toml configuration                       ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=machine.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Every top-level entry must be a known section holding known keys in range
///
/// Keys and ranges come from the same table the runtime parser uses.
fn validate_sections(config: &toml::Value, errors: &mut Vec<String>) {
    let root = match config.as_table() {
        Some(t) => t,
        None => return,
    };

    for (name, section) in root {
        let Some(spec) = schema::section(name) else {
            errors.push(format!("unknown section [{}]", name));
            continue;
        };
        let Some(table) = section.as_table() else {
            errors.push(format!("[{}] must be a table", name));
            continue;
        };

        for (key, value) in table {
            let Some(key_spec) = spec.key(key) else {
                errors.push(format!("[{}] unknown key '{}'", name, key));
                continue;
            };
            if key_spec.is_array() {
                validate_array(name, key_spec, value, errors);
            } else {
                validate_scalar(name, key_spec, value, errors);
            }
        }
    }
}

fn in_range(spec: &KeySpec, value: &toml::Value) -> bool {
    value
        .as_integer()
        .and_then(|v| u64::try_from(v).ok())
        .is_some_and(|v| spec.accepts(v))
}

fn validate_scalar(section: &str, spec: &KeySpec, value: &toml::Value, errors: &mut Vec<String>) {
    if value.as_integer().is_none() {
        errors.push(format!("[{}] {} must be an integer", section, spec.name));
    } else if !in_range(spec, value) {
        errors.push(format!(
            "[{}] {} must be {}-{}",
            section, spec.name, spec.min, spec.max
        ));
    }
}

/// Arrays need exactly `spec.count` integers, each in range
fn validate_array(section: &str, spec: &KeySpec, value: &toml::Value, errors: &mut Vec<String>) {
    let Some(items) = value.as_array() else {
        errors.push(format!("[{}] {} must be an array", section, spec.name));
        return;
    };
    if items.len() != spec.count {
        errors.push(format!(
            "[{}] {} needs exactly {} values",
            section, spec.name, spec.count
        ));
        return;
    }
    if !items.iter().all(|item| in_range(spec, item)) {
        errors.push(format!(
            "[{}] {} entries must be {}-{}",
            section, spec.name, spec.min, spec.max
        ));
    }
}
