//! CLI domain: parse, route, output and presentation only.
//! Resolution itself lives in the library; the route table just wires it up.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, TemplateKindArg};
pub use presentation::{format_fields_json, format_fields_text, format_response};
pub use route::RunContext;
