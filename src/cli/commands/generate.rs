//! `credvault generate`: print a random password.

use crate::cli::GeneratorArgs;
use crate::errors::Result;
use crate::generator;

/// Execute the `generate` command.
pub fn execute(args: &GeneratorArgs) -> Result<()> {
    let password = generator::generate(&args.options())?;
    println!("{}", password.as_str());
    Ok(())
}
