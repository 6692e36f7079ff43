use std::collections::HashMap;

use action_flow::VariableResolver;
use anyhow::Result;
use clap::Args;

#[derive(Args, Clone, Debug)]
pub struct VarsArgs {
    /// Text containing `{{name}}` placeholders
    pub template: String,

    /// Variable binding as name=value (repeatable)
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,
}

/// Parse a `name=value` binding; the value may itself contain `=`.
pub fn parse_var(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {:?}", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("variable name missing in {:?}", raw));
    }
    Ok((name.to_string(), value.to_string()))
}

pub fn collect_vars(pairs: Vec<(String, String)>) -> HashMap<String, String> {
    pairs.into_iter().collect()
}

pub fn cmd_vars(args: VarsArgs) -> Result<()> {
    let resolution = VariableResolver::new().resolve(&args.template, &collect_vars(args.vars));
    println!("{}", resolution.value);
    if !resolution.dummies.is_empty() {
        println!("Dummy values used for: {}", resolution.dummies.join(", "));
    }
    Ok(())
}
