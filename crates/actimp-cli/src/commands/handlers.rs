//! Handlers command - list the registered document handlers.

use console::style;

use actimp_core::Registry;

use super::load_config;

pub fn run(config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let registry = Registry::from_config(&config);

    println!("{}", style("Registered handlers:").bold());
    for handler in registry.handlers() {
        let mode = if handler.parsing_is_text_based() {
            "text"
        } else {
            "positional"
        };
        println!("  {:<16} {}", handler.name(), style(mode).dim());
    }

    println!();
    println!(
        "Accepted extensions: {}",
        registry.document_config().accepted_extensions.join(", ")
    );

    Ok(())
}
