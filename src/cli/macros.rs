use crate::cli::CliContext;
use crate::macros::{step, MacroSet};
use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Table};

pub fn run(ctx: &CliContext) -> Result<()> {
    let set = MacroSet::load(&ctx.paths.macros_toml)?;
    if set.is_empty() {
        println!("No macros defined in {}", ctx.paths.macros_toml.display());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Name").add_attribute(Attribute::Bold),
        Cell::new("Steps").add_attribute(Attribute::Bold),
        Cell::new("Malformed").add_attribute(Attribute::Bold),
    ]);
    for m in set.iter() {
        let malformed = m
            .steps
            .iter()
            .filter(|s| matches!(s, step::Step::Malformed(_)))
            .count();
        table.add_row(vec![
            m.name.clone(),
            step::count(&m.steps).to_string(),
            if malformed == 0 {
                "-".to_string()
            } else {
                malformed.to_string()
            },
        ]);
    }
    println!("{}", table);
    Ok(())
}
