//! Kinds command implementation.

use edgesync_core::{EventQueue, Stores};
use edgesync_engine::TranslatorRegistry;
use serde::Serialize;
use std::sync::Arc;

/// One registered kind.
#[derive(Debug, Serialize)]
pub struct KindInfo {
    /// Wire tag.
    pub kind: String,
    /// Whether entities of this kind can be assigned to a customer.
    pub ownable: bool,
    /// Wire action codes the translator handles.
    pub msg_types: Vec<u8>,
}

/// Runs the kinds command.
pub fn run(format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let stores = Stores::in_memory(Arc::new(EventQueue::new()));
    let registry = TranslatorRegistry::standard(&stores);
    registry.ensure_complete()?;

    let mut kinds = Vec::with_capacity(registry.len());
    for kind in registry.kinds() {
        let translator = registry.resolve(kind)?;
        kinds.push(KindInfo {
            kind: kind.as_str().to_string(),
            ownable: kind.is_ownable(),
            msg_types: translator
                .handled_msg_types()
                .iter()
                .map(|msg_type| msg_type.to_code())
                .collect(),
        });
    }

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&kinds)?);
        }
        _ => {
            println!("{:<14} {:<8} ACTIONS", "KIND", "OWNABLE");
            for info in &kinds {
                let codes: Vec<String> = info.msg_types.iter().map(u8::to_string).collect();
                println!(
                    "{:<14} {:<8} {}",
                    info.kind,
                    if info.ownable { "yes" } else { "no" },
                    codes.join(",")
                );
            }
        }
    }

    Ok(())
}
