mod demos;

use clap::{arg, command, Arg};
use hdlelem::{ElabError, TreeElaborator};
use hirn::codegen::{Codegen, CodegenError, TreeCodegen};
use hirn::design::{Fragment, ModuleHandle};
use log::info;
use miette::Diagnostic;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum CliError {
	#[error(transparent)]
	#[diagnostic(code(hdlelab::io_error))]
	IoError(#[from] io::Error),

	#[error(transparent)]
	#[diagnostic(code(hdlelab::codegen_error))]
	CodegenError(#[from] CodegenError),

	#[error(transparent)]
	#[diagnostic(code(hdlelab::json_error))]
	JsonError(#[from] serde_json::Error),

	#[error("Unknown design '{0}'")]
	#[diagnostic(code(hdlelab::unknown_design), help("Available designs are 'ila' and 'domains'."))]
	UnknownDesign(String),
}

/// JSON document written with `--format json`
#[derive(Serialize)]
struct JsonOutput<'a> {
	name: &'a str,
	module: &'a Fragment,
}

fn emit_tree(module: &ModuleHandle, output: &mut dyn Write) -> miette::Result<()> {
	let design = module.design();
	let mut text = String::new();
	TreeCodegen::new(&design)
		.emit_module(&mut text, module.id())
		.map_err(CliError::from)?;
	output.write_all(text.as_bytes()).map_err(CliError::from)?;
	Ok(())
}

fn emit_json(module: &ModuleHandle, output: &mut dyn Write) -> miette::Result<()> {
	let fragment = module.to_fragment().map_err(ElabError::from)?;
	let name = module.name();
	let doc = JsonOutput {
		name: &name,
		module: &fragment,
	};
	serde_json::to_writer_pretty(&mut *output, &doc).map_err(CliError::from)?;
	writeln!(output).map_err(CliError::from)?;
	Ok(())
}

fn main() -> miette::Result<()> {
	env_logger::init();

	let matches = command!()
		.arg(
			arg!(--design <DESIGN>)
				.help("Demonstration design to elaborate")
				.value_parser(["ila", "domains"])
				.default_value("ila")
				.required(false),
		)
		.arg(
			Arg::new("top-name")
				.long("top-name")
				.value_name("NAME")
				.help("Name given to the top element")
				.default_value("top"),
		)
		.arg(
			arg!(--format <FORMAT>)
				.help("Output format")
				.value_parser(["tree", "json"])
				.default_value("tree")
				.required(false),
		)
		.arg(Arg::new("output").short('o').long("output").help("Output file, stdout if omitted"))
		.get_matches();

	let design = matches.get_one::<String>("design").map(String::as_str).unwrap_or("ila");
	let top_name = matches.get_one::<String>("top-name").map(String::as_str).unwrap_or("top");
	let format = matches.get_one::<String>("format").map(String::as_str).unwrap_or("tree");

	let mut output: Box<dyn Write> = match matches.get_one::<String>("output") {
		None => Box::new(io::stdout()),
		Some(path) => Box::new(fs::File::create(path).map_err(CliError::from)?),
	};

	let root = demos::build(design).ok_or_else(|| CliError::UnknownDesign(design.into()))?;
	info!("Elaborating design '{}'", design);
	let module = TreeElaborator::new().top_name(top_name).elaborate(&root)?;

	match format {
		"json" => emit_json(&module, &mut *output)?,
		_ => emit_tree(&module, &mut *output)?,
	}

	Ok(())
}
