//! List command implementation.

use nicwatch_core::capture::list_interfaces;

use crate::error::CliError;
use crate::output::get_formatter;

/// Run the list command
pub fn run_list(json: bool) -> Result<(), CliError> {
    let formatter = get_formatter(json);
    let interfaces = list_interfaces();

    println!("{}", formatter.format_interfaces(&interfaces));

    Ok(())
}
