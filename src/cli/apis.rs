use crate::cli::CliContext;
use crate::core::capabilities::ApiSet;
use crate::core::config_file;
use anyhow::Result;
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, Table};

#[derive(Args, Debug)]
pub struct ApisArgs {
    /// Comma separated list of APIs to enable (replaces the current set)
    #[arg(long, value_name = "CSV")]
    pub set: Option<String>,
}

pub fn run(ctx: &CliContext, args: ApisArgs) -> Result<()> {
    let mut config = ctx.config.clone();
    let mut active = ApiSet::parse(&config.apis.enabled);

    if let Some(csv) = args.set {
        active = ApiSet::parse(&csv);
        config.apis.enabled = active.to_text();
        config_file::save(&ctx.paths.config_toml, &config)?;
        println!("saved to {}", ctx.paths.config_toml.display());
        println!("send SIGHUP to a running server to apply");
    }

    println!("{}", table(active));
    Ok(())
}

fn table(active: ApiSet) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("API").add_attribute(Attribute::Bold),
        Cell::new("Enabled").add_attribute(Attribute::Bold),
    ]);
    for (flag, name) in ApiSet::known() {
        let state = if active.active(flag) {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("no").fg(Color::DarkGrey)
        };
        table.add_row(vec![Cell::new(name), state]);
    }
    table
}
